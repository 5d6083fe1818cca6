use crate::analysis::rule::{SyntaxRule, unexpected_node};
use crate::parser::ast::{DeclarationKind, Node, NodeKind};
use crate::walk::{Event, VisitKey, VisitorCtx, WalkError};

// `let` and `const` are es2015 additions, only `var` is allowed
pub struct DeclarationKindRule;

impl SyntaxRule for DeclarationKindRule {
    fn id(&self) -> &'static str {
        "declaration-kind"
    }

    fn description(&self) -> &'static str {
        "Only `var` declarations are allowed"
    }

    fn events(&self) -> &'static [Event] {
        const EVENTS: &[Event] = &[Event::before(NodeKind::VarDecStatement)];
        EVENTS
    }

    fn check(
        &self,
        node: Node<'_>,
        _key: &VisitKey,
        ctx: &mut VisitorCtx<'_>,
    ) -> Result<(), WalkError> {
        let Node::VarDecStatement(dec) = node else {
            return Err(unexpected_node(self, NodeKind::VarDecStatement, node));
        };

        if dec.kind() != DeclarationKind::Var {
            ctx.report(
                self.id(),
                self.severity(),
                format!("{} is not permitted in es5", dec.kind()),
                node,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rules::test_util::run_rule;
    use crate::parser::ast::SymbolTable;
    use crate::parser::ast::Program;
    use crate::source::Source;
    use std::sync::Arc;

    #[test]
    fn test_var_is_allowed() {
        assert!(run_rule(DeclarationKindRule, "var a = 1").is_empty());
    }

    #[test]
    fn test_let() {
        let diagnostics = run_rule(DeclarationKindRule, "let a = 1");
        assert_eq!(diagnostics, vec!["let is not permitted in es5 at test.js#1:1"]);
    }

    #[test]
    fn test_const() {
        let diagnostics = run_rule(DeclarationKindRule, "const a = 1");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("const"));
    }

    #[test]
    fn test_nested_declarations() {
        let code = "var a\nfunction f() {\n  let b\n  for (const c = 1; c;) { var d }\n}";
        assert_eq!(
            run_rule(DeclarationKindRule, code),
            vec![
                "let is not permitted in es5 at test.js#3:3",
                "const is not permitted in es5 at test.js#4:8",
            ]
        );
    }

    #[test]
    fn test_wrong_node_is_an_error() {
        let table = SymbolTable::new();
        let mut ctx = VisitorCtx::new(&table, Arc::new(Source::new("a.js", "")));
        let program = Program {
            body: Vec::new(),
            span: Default::default(),
        };

        let err = DeclarationKindRule
            .check(Node::Program(&program), &VisitKey::Root, &mut ctx)
            .unwrap_err();
        assert_eq!(
            err,
            WalkError::UnexpectedNode {
                listener: "declaration-kind".to_string(),
                expected: NodeKind::VarDecStatement,
                found: NodeKind::Program,
            }
        );
        assert!(ctx.diagnostics.is_empty());
    }
}
