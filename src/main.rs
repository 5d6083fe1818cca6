use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use es_check::{
    CheckerConfig, Diagnostic, DiagnosticPrinter, DiagnosticSeverity, EsCheckError, Source,
    SyntaxChecker,
};
use log::{error, info};
use tracing_subscriber::filter::LevelFilter;

const SAMPLE_PATH: &str = "example.js";
const SAMPLE_CODE: &str = "async function* f() {\n\tlet a = 1\n}";

/// Reports syntax that is not valid es5
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files to check, a built-in sample is checked when none are given
    files: Vec<PathBuf>,

    /// Do not run the given rule
    #[arg(long, value_name = "RULE")]
    disable: Vec<String>,

    /// Report the given rule as a warning instead of an error
    #[arg(long, value_name = "RULE")]
    warn: Vec<String>,

    /// Keep at most this many diagnostics per file
    #[arg(long, value_name = "N")]
    max_diagnostics: Option<usize>,

    /// Print the available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// How a single file went, ordered by exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Outcome {
    Clean = 0,
    Violations = 1,
    Failed = 2,
}

impl Outcome {
    /// Warnings alone leave a file clean
    fn of(diagnostics: &[Diagnostic]) -> Self {
        if diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
        {
            Outcome::Violations
        } else {
            Outcome::Clean
        }
    }

    /// The worst outcome over all files, `Clean` when there are none
    fn worst(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        outcomes.into_iter().max().unwrap_or(Outcome::Clean)
    }

    fn exit_code(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let checker = SyntaxChecker::es5();

    if args.list_rules {
        for (id, description, severity) in checker.list_rules() {
            println!("{id:<20} {severity:<8} {description}");
        }
        return ExitCode::SUCCESS;
    }

    let config = CheckerConfig {
        disabled_rules: args.disable,
        warning_rules: args.warn,
        max_diagnostics: args.max_diagnostics,
    };
    let printer = DiagnosticPrinter::new(std::io::stdout().is_terminal());

    let outcome = if args.files.is_empty() {
        info!("no files given, checking the built-in sample");
        check(&checker, &config, &printer, Source::new(SAMPLE_PATH, SAMPLE_CODE))
    } else {
        Outcome::worst(args.files.iter().map(|path| match read_source(path) {
            Ok(source) => check(&checker, &config, &printer, source),
            Err(err) => {
                error!("{err}");
                Outcome::Failed
            }
        }))
    };

    outcome.exit_code()
}

fn read_source(path: &Path) -> Result<Source, EsCheckError> {
    let display = path.display().to_string();
    let code = fs::read_to_string(path).map_err(|source| EsCheckError::Io {
        path: display.clone(),
        source,
    })?;
    Ok(Source::new(display, code))
}

fn check(
    checker: &SyntaxChecker,
    config: &CheckerConfig,
    printer: &DiagnosticPrinter,
    source: Source,
) -> Outcome {
    match checker.check_source_with_config(source, config) {
        Ok(diagnostics) => {
            printer.print_errors(&diagnostics);
            Outcome::of(&diagnostics)
        }
        Err(EsCheckError::Walk(aborted)) => {
            printer.print_errors(&aborted.diagnostics);
            error!("{aborted}");
            Outcome::Failed
        }
        Err(err) => {
            error!("{err}");
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "let a = 1\nvar b = () => a";

    fn outcome(config: &CheckerConfig, code: &str) -> Outcome {
        let printer = DiagnosticPrinter::new(false);
        check(&SyntaxChecker::es5(), config, &printer, Source::new("a.js", code))
    }

    #[test]
    fn test_outcome_of_a_file() {
        let config = CheckerConfig::default();
        assert_eq!(outcome(&config, "var a = 1"), Outcome::Clean);
        assert_eq!(outcome(&config, CODE), Outcome::Violations);
        assert_eq!(outcome(&config, "var = 1"), Outcome::Failed);

        let warnings_only = CheckerConfig {
            warning_rules: vec!["declaration-kind".to_string(), "arrow-function".to_string()],
            ..CheckerConfig::default()
        };
        assert_eq!(outcome(&warnings_only, CODE), Outcome::Clean);

        let one_warning = CheckerConfig {
            warning_rules: vec!["arrow-function".to_string()],
            ..CheckerConfig::default()
        };
        assert_eq!(outcome(&one_warning, CODE), Outcome::Violations);
    }

    #[test]
    fn test_worst_outcome_wins() {
        use Outcome::*;

        assert_eq!(Outcome::worst(Vec::<Outcome>::new()), Clean);
        assert_eq!(Outcome::worst([Clean, Clean]), Clean);
        assert_eq!(Outcome::worst([Clean, Violations, Clean]), Violations);
        assert_eq!(Outcome::worst([Violations, Failed, Clean]), Failed);
        assert_eq!(Outcome::worst([Failed, Violations]), Failed);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Clean.exit_code(), ExitCode::SUCCESS);
        assert_eq!(Outcome::Violations.exit_code(), ExitCode::from(1));
        assert_eq!(Outcome::Failed.exit_code(), ExitCode::from(2));
    }

    #[test]
    fn test_unreadable_file() {
        let err = read_source(Path::new("does/not/exist.js")).unwrap_err();
        assert!(matches!(err, EsCheckError::Io { .. }));
    }
}
