//! The built-in es5 rules, each one subscribed to the events it inspects

mod arrow_function;
mod async_function;
mod declaration_kind;

pub use arrow_function::ArrowFunctionRule;
pub use async_function::AsyncFunctionRule;
pub use declaration_kind::DeclarationKindRule;
