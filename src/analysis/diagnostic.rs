use std::fmt;
use std::sync::Arc;

use crate::parser::ast::{Node, NodeKind, SourceSpan};
use crate::source::{LineCol, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticSeverity {
    #[default]
    Error,
    Warning,
}

impl DiagnosticSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One rule violation. It keeps the source it was found in so it can be
/// rendered on its own later.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub source: Arc<Source>,
    pub message: String,
    pub node: NodeKind,
    pub span: SourceSpan,
    pub severity: DiagnosticSeverity,
    pub rule_id: String,
}

impl Diagnostic {
    pub fn new(
        source: Arc<Source>,
        rule_id: &str,
        message: impl Into<String>,
        node: Node<'_>,
    ) -> Self {
        Self {
            source,
            message: message.into(),
            node: node.kind(),
            span: node.span(),
            severity: DiagnosticSeverity::Error,
            rule_id: rule_id.to_string(),
        }
    }

    pub fn with_severity(mut self, severity: DiagnosticSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Where the offending node starts
    pub fn line_col(&self) -> LineCol {
        self.source.offset_to_line_col(self.span.start)
    }

    /// `<message> at <path>#<line>:<col>`
    pub fn render(&self) -> String {
        let loc = self.line_col();
        format!(
            "{} at {}#{}:{}",
            self.message,
            self.source.path(),
            loc.line,
            loc.col
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Accumulates diagnostics in the order they were reported
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn report_error(
        &mut self,
        source: Arc<Source>,
        rule_id: &str,
        message: impl Into<String>,
        node: Node<'_>,
    ) {
        self.add(Diagnostic::new(source, rule_id, message, node));
    }

    pub fn report_warning(
        &mut self,
        source: Arc<Source>,
        rule_id: &str,
        message: impl Into<String>,
        node: Node<'_>,
    ) {
        self.add(
            Diagnostic::new(source, rule_id, message, node)
                .with_severity(DiagnosticSeverity::Warning),
        );
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_render() {
        let source = Arc::new(Source::new("example.js", "async function* f() {\n\tlet a = 1\n}"));
        let (program, _) = parse(&source).unwrap();

        let crate::parser::ast::Statement::Function(function) = &program.body[0] else {
            panic!("expected a function");
        };
        let crate::parser::ast::Statement::VarDec(dec) = &function.body.body[0] else {
            panic!("expected a declaration");
        };

        let outer = Diagnostic::new(Arc::clone(&source), "r", "outer", Node::Function(function));
        let inner = Diagnostic::new(Arc::clone(&source), "r", "inner", Node::VarDecStatement(dec));
        assert_eq!(outer.render(), "outer at example.js#1:1");
        assert_eq!(inner.render(), "inner at example.js#2:2");
        assert_eq!(inner.to_string(), inner.render());
        assert_eq!(inner.node, NodeKind::VarDecStatement);
        assert_eq!(inner.severity, DiagnosticSeverity::Error);
    }

    #[test]
    fn test_collector() {
        let source = Arc::new(Source::new("a.js", "var a"));
        let (program, _) = parse(&source).unwrap();
        let node = Node::Program(&program);

        let mut collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
        collector.report_warning(Arc::clone(&source), "w", "first", node);
        collector.report_error(Arc::clone(&source), "e", "second", node);
        assert_eq!(collector.len(), 2);
        assert_eq!(collector.diagnostics()[1].message, "second");

        let messages: Vec<_> = collector
            .into_vec()
            .into_iter()
            .map(|d| (d.rule_id, d.message, d.severity))
            .collect();
        assert_eq!(
            messages,
            vec![
                ("w".to_string(), "first".to_string(), DiagnosticSeverity::Warning),
                ("e".to_string(), "second".to_string(), DiagnosticSeverity::Error),
            ]
        );
    }
}
