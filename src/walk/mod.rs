//! Event driven AST traversal.
//!
//! [`visit_node`] walks a tree depth first. For every node it fires the
//! `Before` event of the node's kind, visits the children in grammar order,
//! then fires the `After` event. Listeners subscribe to those events through the
//! [`ListenerRegistry`] held by the [`WalkCtx`]; the walker itself knows nothing
//! about what they check.

pub mod context;
pub mod event;
pub mod listener;

use std::fmt;

use log::{debug, trace};
use thiserror::Error;

use crate::parser::ast::{Node, NodeKind, Program};

pub use context::{VisitorCtx, WalkCtx};
pub use event::{Event, Phase};
pub use listener::{Handler, Listener, ListenerRegistry};

/// The role a node plays in its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitKey {
    /// the node the walk started from
    Root,
    /// a single-valued slot such as `init` or `body`
    Field(&'static str),
    /// an element of a list slot such as `body[2]`
    Index(&'static str, usize),
}

impl fmt::Display for VisitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitKey::Root => Ok(()),
            VisitKey::Field(name) => f.write_str(name),
            VisitKey::Index(name, i) => write!(f, "{}[{}]", name, i),
        }
    }
}

/// A listener failure, it stops the whole walk
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalkError {
    #[error("listener `{listener}` expected a {expected} node but was given a {found}")]
    UnexpectedNode {
        listener: String,
        expected: NodeKind,
        found: NodeKind,
    },
    #[error("listener `{listener}` failed: {message}")]
    Listener { listener: String, message: String },
}

/// Walks a whole program
pub fn walk(program: &Program, ctx: &mut WalkCtx<'_>) -> Result<(), WalkError> {
    debug!(
        "walking {} with {} listener(s)",
        ctx.visitor_ctx().source().path(),
        ctx.listeners.len()
    );
    let result = visit_node(Node::Program(program), VisitKey::Root, ctx);
    debug!(
        "walk finished with {} diagnostic(s)",
        ctx.diagnostics().len()
    );
    result
}

/// Visits `node` and its whole subtree. An absent node is a no-op, which lets
/// optional slots be passed straight through.
///
/// A listener error aborts the walk and is returned as is. The ancestor path is
/// unwound on the way out and anything listeners already reported stays in
/// `ctx`.
pub fn visit_node<'n>(
    node: impl Into<Option<Node<'n>>>,
    key: VisitKey,
    ctx: &mut WalkCtx<'_>,
) -> Result<(), WalkError> {
    let Some(node) = node.into() else {
        return Ok(());
    };
    let kind = node.kind();

    fire(Event::before(kind), node, &key, ctx)?;

    ctx.visitor_ctx_mut().push(kind);
    let result = visit_children(node, ctx);
    ctx.visitor_ctx_mut().pop();
    result?;

    fire(Event::after(kind), node, &key, ctx)
}

fn fire(event: Event, node: Node<'_>, key: &VisitKey, ctx: &mut WalkCtx<'_>) -> Result<(), WalkError> {
    for listener in ctx.listeners.listeners_for(event) {
        trace!("{} -> {} ({})", event, listener.id, key);
        (listener.handle)(node, key, ctx.visitor_ctx_mut())?;
    }
    Ok(())
}

fn visit_list<'n, T>(
    items: &'n [T],
    field: &'static str,
    to_node: fn(&'n T) -> Node<'n>,
    ctx: &mut WalkCtx<'_>,
) -> Result<(), WalkError> {
    for (i, item) in items.iter().enumerate() {
        visit_node(to_node(item), VisitKey::Index(field, i), ctx)?;
    }
    Ok(())
}

fn visit_children(node: Node<'_>, ctx: &mut WalkCtx<'_>) -> Result<(), WalkError> {
    use VisitKey::Field;

    match node {
        Node::Program(program) => visit_list(&program.body, "body", Node::from, ctx),
        Node::VarDecStatement(dec) => {
            visit_list(&dec.declarations, "declarations", Node::VarDeclarator, ctx)
        }
        Node::VarDeclarator(declarator) => {
            visit_node(Node::Identifier(&declarator.id), Field("id"), ctx)?;
            visit_node(declarator.init.as_ref().map(Node::from), Field("init"), ctx)
        }
        Node::Function(function) => {
            visit_node(function.id.as_ref().map(Node::Identifier), Field("id"), ctx)?;
            visit_list(&function.params, "params", Node::Identifier, ctx)?;
            visit_node(Node::BlockStatement(&function.body), Field("body"), ctx)
        }
        Node::ArrowFunction(arrow) => {
            visit_list(&arrow.params, "params", Node::Identifier, ctx)?;
            visit_node(Node::from(&arrow.body), Field("body"), ctx)
        }
        Node::BlockStatement(block) => visit_list(&block.body, "body", Node::from, ctx),
        Node::ExpressionStatement(stmt) => {
            visit_node(Node::from(&stmt.expression), Field("expression"), ctx)
        }
        Node::ReturnStatement(stmt) => {
            visit_node(stmt.argument.as_ref().map(Node::from), Field("argument"), ctx)
        }
        Node::IfStatement(stmt) => {
            visit_node(Node::from(&stmt.test), Field("test"), ctx)?;
            visit_node(Node::from(stmt.consequent.as_ref()), Field("consequent"), ctx)?;
            visit_node(stmt.alternate.as_deref().map(Node::from), Field("alternate"), ctx)
        }
        Node::WhileStatement(stmt) => {
            visit_node(Node::from(&stmt.test), Field("test"), ctx)?;
            visit_node(Node::from(stmt.body.as_ref()), Field("body"), ctx)
        }
        Node::ForStatement(stmt) => {
            visit_node(stmt.init.as_ref().map(Node::from), Field("init"), ctx)?;
            visit_node(stmt.test.as_ref().map(Node::from), Field("test"), ctx)?;
            visit_node(stmt.update.as_ref().map(Node::from), Field("update"), ctx)?;
            visit_node(Node::from(stmt.body.as_ref()), Field("body"), ctx)
        }
        Node::ArrayLiteral(array) => visit_list(&array.elements, "elements", Node::from, ctx),
        Node::ObjectLiteral(object) => {
            visit_list(&object.properties, "properties", Node::Property, ctx)
        }
        Node::Property(property) => {
            visit_node(Node::from(&property.key), Field("key"), ctx)?;
            visit_node(Node::from(&property.value), Field("value"), ctx)
        }
        Node::UnaryExpression(expr) => {
            visit_node(Node::from(expr.argument.as_ref()), Field("argument"), ctx)
        }
        Node::UpdateExpression(expr) => {
            visit_node(Node::from(expr.argument.as_ref()), Field("argument"), ctx)
        }
        Node::AwaitExpression(expr) => {
            visit_node(Node::from(expr.argument.as_ref()), Field("argument"), ctx)
        }
        Node::YieldExpression(expr) => {
            visit_node(expr.argument.as_deref().map(Node::from), Field("argument"), ctx)
        }
        Node::BinaryExpression(expr) => {
            visit_node(Node::from(expr.left.as_ref()), Field("left"), ctx)?;
            visit_node(Node::from(expr.right.as_ref()), Field("right"), ctx)
        }
        Node::AssignmentExpression(expr) => {
            visit_node(Node::from(expr.left.as_ref()), Field("left"), ctx)?;
            visit_node(Node::from(expr.right.as_ref()), Field("right"), ctx)
        }
        Node::ConditionalExpression(expr) => {
            visit_node(Node::from(expr.test.as_ref()), Field("test"), ctx)?;
            visit_node(Node::from(expr.consequent.as_ref()), Field("consequent"), ctx)?;
            visit_node(Node::from(expr.alternate.as_ref()), Field("alternate"), ctx)
        }
        Node::CallExpression(expr) => {
            visit_node(Node::from(expr.callee.as_ref()), Field("callee"), ctx)?;
            visit_list(&expr.arguments, "arguments", Node::from, ctx)
        }
        Node::NewExpression(expr) => {
            visit_node(Node::from(expr.callee.as_ref()), Field("callee"), ctx)?;
            visit_list(&expr.arguments, "arguments", Node::from, ctx)
        }
        Node::MemberExpression(expr) => {
            visit_node(Node::from(expr.object.as_ref()), Field("object"), ctx)?;
            visit_node(Node::from(expr.property.as_ref()), Field("property"), ctx)
        }
        Node::EmptyStatement(_)
        | Node::Identifier(_)
        | Node::Literal(_)
        | Node::ThisExpression(_) => Ok(()),
    }
}
