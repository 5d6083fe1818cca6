use crate::analysis::diagnostic::DiagnosticSeverity;
use crate::parser::ast::{Node, NodeKind};
use crate::walk::{Event, VisitKey, VisitorCtx, WalkError};

pub trait SyntaxRule {
    // Unique identifier, also used as the listener id
    fn id(&self) -> &'static str;

    // Short description of what this rule checks
    fn description(&self) -> &'static str;

    // Severity of the diagnostics it reports
    fn severity(&self) -> DiagnosticSeverity {
        DiagnosticSeverity::Error
    }

    // The events the rule is subscribed to
    fn events(&self) -> &'static [Event];

    // Runs when one of `events` fires. A node of a kind the rule did not
    // subscribe to is an `UnexpectedNode` error, not a silent pass.
    fn check(&self, node: Node<'_>, key: &VisitKey, ctx: &mut VisitorCtx<'_>)
    -> Result<(), WalkError>;

    fn enabled_by_default(&self) -> bool {
        true
    }
}

/// The error a rule returns when handed a node it never subscribed to
pub fn unexpected_node(rule: &dyn SyntaxRule, expected: NodeKind, node: Node<'_>) -> WalkError {
    WalkError::UnexpectedNode {
        listener: rule.id().to_string(),
        expected,
        found: node.kind(),
    }
}
