//! Syntax-version checking on top of the walker.
//!
//! A [`SyntaxChecker`] owns a set of [`SyntaxRule`]s. For every check it builds
//! a fresh [`WalkCtx`], subscribes the enabled rules as listeners, walks the
//! program and hands back the diagnostics the rules reported.

pub mod diagnostic;
pub mod diagnostic_printer;
pub mod external_api;
pub mod rule;
pub mod rule_registry;
pub mod rules;

use std::sync::Arc;

use thiserror::Error;

use crate::EsCheckError;
use crate::analysis::diagnostic::Diagnostic;
use crate::analysis::rule::SyntaxRule;
use crate::analysis::rule_registry::RuleRegistry;
use crate::analysis::rules::{ArrowFunctionRule, AsyncFunctionRule, DeclarationKindRule};
use crate::parser::ast::{Program, SymbolTable};
use crate::parser::parse;
use crate::source::Source;
use crate::walk::{WalkCtx, WalkError, walk};

/// A walk that a rule aborted. Whatever was reported before the failure is
/// kept in `diagnostics`.
#[derive(Debug, Error)]
#[error("check aborted: {error}")]
pub struct CheckAborted {
    #[source]
    pub error: WalkError,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct SyntaxChecker {
    rule_registry: RuleRegistry,
}

impl Default for SyntaxChecker {
    fn default() -> Self {
        Self::es5()
    }
}

impl SyntaxChecker {
    /// A checker without any rule
    pub fn new() -> Self {
        Self {
            rule_registry: RuleRegistry::new(),
        }
    }

    /// A checker with the built-in es5 rules
    pub fn es5() -> Self {
        let mut checker = Self::new();
        checker.register(DeclarationKindRule);
        checker.register(AsyncFunctionRule);
        checker.register(ArrowFunctionRule);
        checker
    }

    pub fn register<R: SyntaxRule + 'static>(&mut self, rule: R) {
        self.rule_registry.register(rule);
    }

    pub fn check(
        &self,
        program: &Program,
        symbol_table: &SymbolTable,
        source: Arc<Source>,
    ) -> Result<Vec<Diagnostic>, CheckAborted> {
        self.run(program, symbol_table, source, |rule| rule.enabled_by_default())
    }

    /// Parses `source` and checks it
    pub fn check_source(&self, source: Source) -> Result<Vec<Diagnostic>, EsCheckError> {
        let (program, symbol_table) = parse_source(&source)?;
        Ok(self.check(&program, &symbol_table, Arc::new(source))?)
    }

    fn run(
        &self,
        program: &Program,
        symbol_table: &SymbolTable,
        source: Arc<Source>,
        is_enabled: impl Fn(&dyn SyntaxRule) -> bool,
    ) -> Result<Vec<Diagnostic>, CheckAborted> {
        let mut ctx = WalkCtx::new(symbol_table, source);
        self.rule_registry.subscribe(&mut ctx.listeners, is_enabled);

        match walk(program, &mut ctx) {
            Ok(()) => Ok(ctx.into_diagnostics()),
            Err(error) => Err(CheckAborted {
                error,
                diagnostics: ctx.into_diagnostics(),
            }),
        }
    }
}

pub(crate) fn parse_source(source: &Source) -> Result<(Program, SymbolTable), EsCheckError> {
    parse(source).map_err(|err| EsCheckError::Parse {
        rendered: err.render(source),
        source: err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diagnostic::DiagnosticSeverity;
    use crate::parser::ast::{Node, NodeKind};
    use crate::walk::{Event, VisitKey, VisitorCtx};

    const SAMPLE: &str = "async function* f() {\n\tlet a = 1\n}";

    const TEST_PROGRAM: &str = r#"
// every rule fires somewhere in here
var total = 0;
let count = 3
const step = function (x) { return x + 1 }

async function load(url) {
    var response = await fetch(url)
    return response.body
}

function* ids() {
    var i = 0
    while (true) { yield i; i += 1 }
}

var double = (n) => n * 2;
for (var k = 0; k < count; k += 1) {
    if (k % 2 === 0) total = double(k); else total -= step(k)
}
"#;

    fn rendered(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics.iter().map(Diagnostic::render).collect()
    }

    #[test]
    fn test_sample() {
        let diagnostics = SyntaxChecker::es5()
            .check_source(Source::new("example.js", SAMPLE))
            .unwrap();
        assert_eq!(
            rendered(&diagnostics),
            vec![
                "async generator is not permitted in es5 at example.js#1:1",
                "let is not permitted in es5 at example.js#2:2",
            ]
        );
    }

    #[test]
    fn test_program() {
        let diagnostics = SyntaxChecker::es5()
            .check_source(Source::new("app.js", TEST_PROGRAM))
            .unwrap();
        assert_eq!(
            rendered(&diagnostics),
            vec![
                "let is not permitted in es5 at app.js#4:1",
                "const is not permitted in es5 at app.js#5:1",
                "async function is not permitted in es5 at app.js#7:1",
                "arrow function is not permitted in es5 at app.js#17:14",
            ]
        );
        assert!(diagnostics.iter().all(|d| d.severity == DiagnosticSeverity::Error));
    }

    #[test]
    fn test_es5_source_is_clean() {
        let code = "var a = 1, b = [a, 2];\nfunction f(x) { return typeof x === 'number' ? x : null }\nf(a);";
        let diagnostics = SyntaxChecker::es5()
            .check_source(Source::new("clean.js", code))
            .unwrap();
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let checker = SyntaxChecker::es5();
        let first = checker.check_source(Source::new("app.js", TEST_PROGRAM)).unwrap();
        let second = checker.check_source(Source::new("app.js", TEST_PROGRAM)).unwrap();
        assert_eq!(rendered(&first), rendered(&second));
    }

    #[test]
    fn test_parse_error() {
        let err = SyntaxChecker::es5()
            .check_source(Source::new("bad.js", "let a = 1\nlet a = 2"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Identifier 'a' has already been declared at bad.js#2:5"
        );
    }

    #[test]
    fn test_deep_input() {
        let results = std::thread::Builder::new()
            .stack_size(32 << 20)
            .spawn(|| {
                let arrays = |depth: usize| {
                    format!("let a = {}1{}", "[".repeat(depth), "]".repeat(depth))
                };
                let chain = format!("var s = {}", vec!["'x'"; 1_500].join(" + "));
                [arrays(200), chain, arrays(10_000)]
                    .into_iter()
                    .map(|code| {
                        SyntaxChecker::es5()
                            .check_source(Source::new("deep.js", code))
                            .map(|diagnostics| diagnostics.len())
                            .map_err(|err| err.to_string())
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(results[0], Ok(1));
        assert_eq!(results[1], Ok(0));
        let err = results[2].as_ref().unwrap_err();
        assert!(err.starts_with("Maximum nesting depth exceeded at deep.js#1:"));
    }

    struct NoIdentifiers;

    impl SyntaxRule for NoIdentifiers {
        fn id(&self) -> &'static str {
            "no-identifiers"
        }

        fn description(&self) -> &'static str {
            "Fails on the first identifier"
        }

        fn events(&self) -> &'static [Event] {
            const EVENTS: &[Event] = &[Event::before(NodeKind::Identifier)];
            EVENTS
        }

        fn check(
            &self,
            node: Node<'_>,
            _key: &VisitKey,
            _ctx: &mut VisitorCtx<'_>,
        ) -> Result<(), WalkError> {
            Err(WalkError::Listener {
                listener: self.id().to_string(),
                message: format!("found {}", node.kind()),
            })
        }
    }

    #[test]
    fn test_aborted_check_keeps_diagnostics() {
        let mut checker = SyntaxChecker::es5();
        checker.register(NoIdentifiers);

        let err = checker
            .check_source(Source::new("a.js", "let a = 1"))
            .unwrap_err();
        let EsCheckError::Walk(aborted) = err else {
            panic!("expected an aborted walk, got {err:?}");
        };
        assert_eq!(
            aborted.error,
            WalkError::Listener {
                listener: "no-identifiers".to_string(),
                message: "found Identifier".to_string(),
            }
        );
        assert_eq!(
            rendered(&aborted.diagnostics),
            vec!["let is not permitted in es5 at a.js#1:1"]
        );
    }

    #[test]
    fn test_empty_checker() {
        let diagnostics = SyntaxChecker::new()
            .check_source(Source::new("example.js", SAMPLE))
            .unwrap();
        assert!(diagnostics.is_empty());
    }
}
