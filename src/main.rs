// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Binary entry point for the pysplit CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Split every module of a tree into one module per class
//! pysplit refactor src/
//!
//! # Check that two trees hold the same code, ignoring formatting
//! pysplit compare before/ after/
//!
//! # Show the canonical module name for a class name
//! pysplit normalize HTTPServer XMLHttpRequest
//!
//! # Show what a file declares, by kind
//! pysplit index src/models.py
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use pysplit::cli::{run_compare, run_index, run_normalize, run_refactor};
use pysplit::config::CliOverrides;
use pysplit_core::error::{OutputErrorCode, SplitError};
use pysplit_core::output::{emit_response, ErrorResponse};
use pysplit_python::compare::Ordering;
use pysplit_python::ImportStyle;

// ============================================================================
// CLI Structure
// ============================================================================

/// Split Python modules into one module per class.
///
/// All output is JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "pysplit", version, about = "Split Python modules into one module per class")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output (`RUST_LOG` takes precedence).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
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

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Import style for synthesized imports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ImportStyleArg {
    /// `from foo import Foo`
    Absolute,
    /// `from .foo import Foo`
    Relative,
}

impl From<ImportStyleArg> for ImportStyle {
    fn from(style: ImportStyleArg) -> Self {
        match style {
            ImportStyleArg::Absolute => ImportStyle::Absolute,
            ImportStyleArg::Relative => ImportStyle::Relative,
        }
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Move each class into its own module and rewrite imports (applies changes).
    ///
    /// Settings are read from `[tool.pysplit]` in `pyproject.toml` next to the
    /// target; flags override them.
    Refactor {
        /// Directory tree or single module to refactor.
        path: PathBuf,
        /// How synthesized imports refer to sibling modules.
        #[arg(long, value_enum)]
        import_style: Option<ImportStyleArg>,
        /// Import helper functions and constants from the origin module instead
        /// of copying them next to the extracted class.
        #[arg(long)]
        no_copy_siblings: bool,
        /// Keep modules that end up with nothing but imports.
        #[arg(long)]
        keep_empty_modules: bool,
    },
    /// Compare two files or directory trees structurally.
    Compare {
        left: PathBuf,
        right: PathBuf,
        /// Statement order within each declaration kind must match too.
        #[arg(long)]
        strict: bool,
    },
    /// Print the canonical snake_case form of identifiers.
    Normalize {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print a file's declarations grouped by kind.
    Index {
        file: PathBuf,
    },
}

impl Command {
    fn overrides(
        import_style: Option<ImportStyleArg>,
        no_copy_siblings: bool,
        keep_empty_modules: bool,
    ) -> CliOverrides {
        CliOverrides {
            import_style: import_style.map(ImportStyle::from),
            copy_siblings: no_copy_siblings.then_some(false),
            delete_empty_modules: keep_empty_modules.then_some(false),
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.global.log_level, cli.global.log_format);

    // Execute command and handle errors
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print<T: Serialize>(response: &T) -> Result<(), SplitError> {
    emit_response(response, &mut io::stdout()).map_err(|e| SplitError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), SplitError> {
    match cli.command {
        Command::Refactor {
            path,
            import_style,
            no_copy_siblings,
            keep_empty_modules,
        } => {
            let overrides = Command::overrides(import_style, no_copy_siblings, keep_empty_modules);
            print(&run_refactor(&path, &overrides)?)
        }
        Command::Compare {
            left,
            right,
            strict,
        } => {
            let ordering = if strict {
                Ordering::Strict
            } else {
                Ordering::Unordered
            };
            print(&run_compare(&left, &right, ordering)?)
        }
        Command::Normalize { names } => print(&run_normalize(&names)),
        Command::Index { file } => print(&run_index(&file)?),
    }
}
