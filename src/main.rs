//! Binary entry point for the docscan CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Analyze one or more files (one JSON document per file)
//! docscan src/config.py src/models.py
//!
//! # A class body cut out of a larger file, starting at line 41
//! docscan --line-offset 40 body.py
//!
//! # Single-line JSON, custom documentation marker
//! docscan --compact --marker '#!' module.py
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use docscan::output::{emit_response, AnalysisResponse, ErrorResponse};
use docscan::{Analyzer, AnalyzerOptions, DocscanError, OutputErrorCode};

// ============================================================================
// CLI Structure
// ============================================================================

/// Recover documentation comments, annotations and definition spans from
/// Python sources. All output is JSON.
#[derive(Parser, Debug)]
#[command(name = "docscan", version, about = "Analyze Python sources for documentation")]
struct Cli {
    /// Python source files to analyze.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Added to every definition line number.
    #[arg(long, default_value_t = 0)]
    line_offset: usize,

    /// Prefix that makes a comment a documentation comment.
    #[arg(long, default_value = "#:")]
    marker: String,

    /// Log level for tracing output (`RUST_LOG` takes precedence).
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Print each response on a single line.
    #[arg(long)]
    compact: bool,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response.
            let _ = emit_response(&response, &mut io::stdout(), cli.compact);
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: &Cli) -> Result<(), DocscanError> {
    if cli.marker.trim().is_empty() {
        return Err(DocscanError::InvalidArguments {
            message: "--marker must not be empty".to_string(),
        });
    }
    let options = AnalyzerOptions::new()
        .with_line_offset(cli.line_offset)
        .with_comment_marker(cli.marker.as_str());

    let mut stdout = io::stdout().lock();
    for path in &cli.files {
        let file_name = path.display().to_string();
        let source = std::fs::read_to_string(path)
            .map_err(|err| DocscanError::from_read_error(file_name.clone(), err))?;
        tracing::debug!(file = %file_name, bytes = source.len(), "analyzing");

        let analysis = Analyzer::new(&source).with_options(options.clone()).run();
        let response = AnalysisResponse::from_analysis(file_name, &analysis);
        emit_response(&response, &mut stdout, cli.compact)?;
    }
    stdout.flush()?;
    Ok(())
}
