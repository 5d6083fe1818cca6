use crate::analysis::rule::{SyntaxRule, unexpected_node};
use crate::parser::ast::{Node, NodeKind};
use crate::walk::{Event, VisitKey, VisitorCtx, WalkError};

// Async functions and async generators, in both declaration and expression form
pub struct AsyncFunctionRule;

impl SyntaxRule for AsyncFunctionRule {
    fn id(&self) -> &'static str {
        "async-function"
    }

    fn description(&self) -> &'static str {
        "Disallows async functions and async generators"
    }

    fn events(&self) -> &'static [Event] {
        const EVENTS: &[Event] = &[Event::before(NodeKind::Function)];
        EVENTS
    }

    fn check(
        &self,
        node: Node<'_>,
        _key: &VisitKey,
        ctx: &mut VisitorCtx<'_>,
    ) -> Result<(), WalkError> {
        let Node::Function(function) = node else {
            return Err(unexpected_node(self, NodeKind::Function, node));
        };

        let message = match (function.is_async(), function.is_generator()) {
            (true, true) => "async generator is not permitted in es5",
            (true, false) => "async function is not permitted in es5",
            (false, _) => return Ok(()),
        };
        ctx.report(self.id(), self.severity(), message, node);
        Ok(())
    }
}
