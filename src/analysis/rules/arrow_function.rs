use crate::analysis::rule::{SyntaxRule, unexpected_node};
use crate::parser::ast::{Node, NodeKind};
use crate::walk::{Event, VisitKey, VisitorCtx, WalkError};

pub struct ArrowFunctionRule;

impl SyntaxRule for ArrowFunctionRule {
    fn id(&self) -> &'static str {
        "arrow-function"
    }

    fn description(&self) -> &'static str {
        "Disallows arrow functions"
    }

    fn events(&self) -> &'static [Event] {
        const EVENTS: &[Event] = &[Event::before(NodeKind::ArrowFunction)];
        EVENTS
    }

    fn check(
        &self,
        node: Node<'_>,
        _key: &VisitKey,
        ctx: &mut VisitorCtx<'_>,
    ) -> Result<(), WalkError> {
        if !matches!(node, Node::ArrowFunction(_)) {
            return Err(unexpected_node(self, NodeKind::ArrowFunction, node));
        }
        ctx.report(
            self.id(),
            self.severity(),
            "arrow function is not permitted in es5",
            node,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rules::test_util::run_rule;

    #[test]
    fn test_arrows() {
        let code = "var f = x => x\nvar g = async (a, b) => { return () => a }";
        assert_eq!(
            run_rule(ArrowFunctionRule, code),
            vec![
                "arrow function is not permitted in es5 at test.js#1:9",
                "arrow function is not permitted in es5 at test.js#2:9",
                "arrow function is not permitted in es5 at test.js#2:34",
            ]
        );
    }

    #[test]
    fn test_function_expression_is_not_an_arrow() {
        assert!(run_rule(ArrowFunctionRule, "var f = function (x) { return x }").is_empty());
    }
}
