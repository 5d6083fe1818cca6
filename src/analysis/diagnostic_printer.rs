use crate::analysis::diagnostic::{Diagnostic, DiagnosticSeverity};

const RED: &str = "\x1b[1;31m";
const YELLOW: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

/// Renders diagnostics one per line
pub struct DiagnosticPrinter {
    pub use_colors: bool,
}

impl DiagnosticPrinter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn sprint_errors(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|diag| self.sprint_one(diag))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_errors(&self, diagnostics: &[Diagnostic]) {
        if !diagnostics.is_empty() {
            println!("{}", self.sprint_errors(diagnostics))
        }
    }

    fn sprint_one(&self, diag: &Diagnostic) -> String {
        if !self.use_colors {
            return diag.render();
        }
        let color = match diag.severity {
            DiagnosticSeverity::Error => RED,
            DiagnosticSeverity::Warning => YELLOW,
        };
        format!("{}{}{}: {}", color, diag.severity, RESET, diag.render())
    }
}
