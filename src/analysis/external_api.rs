use std::sync::Arc;

use log::warn;

use crate::EsCheckError;
use crate::analysis::diagnostic::{Diagnostic, DiagnosticSeverity};
use crate::analysis::{CheckAborted, SyntaxChecker, parse_source};
use crate::parser::ast::{Program, SymbolTable};
use crate::source::Source;

/// Per-run adjustments of the rule set
#[derive(Debug, Clone, Default)]
pub struct CheckerConfig {
    /// rules that are not subscribed at all
    pub disabled_rules: Vec<String>,
    /// rules whose diagnostics are reported as warnings
    pub warning_rules: Vec<String>,
    pub max_diagnostics: Option<usize>,
}

impl SyntaxChecker {
    pub fn check_with_config(
        &self,
        program: &Program,
        symbol_table: &SymbolTable,
        source: Arc<Source>,
        config: &CheckerConfig,
    ) -> Result<Vec<Diagnostic>, CheckAborted> {
        for rule_id in config.disabled_rules.iter().chain(&config.warning_rules) {
            if self.rule_registry.get_rule(rule_id).is_none() {
                warn!("unknown rule `{}` in configuration", rule_id);
            }
        }

        let mut diagnostics = self.run(program, symbol_table, source, |rule| {
            rule.enabled_by_default() && !config.disabled_rules.iter().any(|id| id == rule.id())
        })?;

        for diag in &mut diagnostics {
            if config.warning_rules.contains(&diag.rule_id) {
                diag.severity = DiagnosticSeverity::Warning;
            }
        }

        if let Some(limit) = config.max_diagnostics {
            if diagnostics.len() > limit {
                warn!(
                    "{} diagnostics reported, keeping the first {}",
                    diagnostics.len(),
                    limit
                );
                diagnostics.truncate(limit);
            }
        }

        Ok(diagnostics)
    }

    pub fn check_source_with_config(
        &self,
        source: Source,
        config: &CheckerConfig,
    ) -> Result<Vec<Diagnostic>, EsCheckError> {
        let (program, symbol_table) = parse_source(&source)?;
        Ok(self.check_with_config(&program, &symbol_table, Arc::new(source), config)?)
    }

    // Method to get all available rules
    pub fn list_rules(&self) -> Vec<(&'static str, &'static str, DiagnosticSeverity)> {
        self.rule_registry
            .get_all_rules()
            .iter()
            .map(|rule| (rule.id(), rule.description(), rule.severity()))
            .collect()
    }
}
