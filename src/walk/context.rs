use std::sync::Arc;

use crate::analysis::diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticSeverity};
use crate::parser::ast::{Node, NodeKind, SymbolTable};
use crate::source::Source;
use crate::walk::listener::ListenerRegistry;

/// What a listener can see and touch while the walk is running
#[derive(Debug)]
pub struct VisitorCtx<'a> {
    symbol_table: &'a SymbolTable,
    source: Arc<Source>,
    path: Vec<NodeKind>,
    pub diagnostics: DiagnosticCollector,
}

impl<'a> VisitorCtx<'a> {
    pub fn new(symbol_table: &'a SymbolTable, source: Arc<Source>) -> Self {
        Self {
            symbol_table,
            source,
            path: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    pub fn symbol_table(&self) -> &'a SymbolTable {
        self.symbol_table
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }

    /// Kinds of the ancestors of the node being visited, outermost first
    pub fn path(&self) -> &[NodeKind] {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeKind> {
        self.path.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub(crate) fn push(&mut self, kind: NodeKind) {
        self.path.push(kind);
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }

    /// Records a diagnostic against `node`
    pub fn report(
        &mut self,
        rule_id: &str,
        severity: DiagnosticSeverity,
        message: impl Into<String>,
        node: Node<'_>,
    ) {
        let source = Arc::clone(&self.source);
        match severity {
            DiagnosticSeverity::Error => {
                self.diagnostics.report_error(source, rule_id, message, node)
            }
            DiagnosticSeverity::Warning => {
                self.diagnostics.report_warning(source, rule_id, message, node)
            }
        }
    }
}

/// Per-traversal state: the subscriptions plus the visitor context.
///
/// Build one per walk and drop it (or take its diagnostics) afterwards.
#[derive(Debug)]
pub struct WalkCtx<'a> {
    pub listeners: ListenerRegistry<'a>,
    visitor: VisitorCtx<'a>,
}

impl<'a> WalkCtx<'a> {
    pub fn new(symbol_table: &'a SymbolTable, source: Arc<Source>) -> Self {
        Self {
            listeners: ListenerRegistry::new(),
            visitor: VisitorCtx::new(symbol_table, source),
        }
    }

    pub fn visitor_ctx(&self) -> &VisitorCtx<'a> {
        &self.visitor
    }

    pub(crate) fn visitor_ctx_mut(&mut self) -> &mut VisitorCtx<'a> {
        &mut self.visitor
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.visitor.diagnostics.diagnostics()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.visitor.diagnostics.into_vec()
    }
}
