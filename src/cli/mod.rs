//! Command-line interface for cxx-xref.
//!
//! This module handles argument parsing and output payloads only.
//! NO analysis is performed here.

use crate::collect::CollectOptions;
use crate::ingest::{detect, AnalysisOptions, FileReport};
use crate::table::{SelfReferencePolicy, TableOptions};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

/// cxx-xref: declaration-to-reference symbol tables for C and C++.
#[derive(Parser, Debug)]
#[command(name = "cxx-xref")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available cxx-xref commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Print the symbol table of one file.
    Table {
        /// Path to the source file.
        #[arg(short, long)]
        file: std::path::PathBuf,

        /// Analysis flags.
        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Print the symbol tables of every C/C++ file matching a glob.
    Scan {
        /// Glob pattern for matching files (e.g., "src/**/*.cpp").
        #[arg(short, long)]
        glob: String,

        /// Analysis flags.
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Stop at the first file that fails instead of skipping it.
        #[arg(long)]
        fail_fast: bool,
    },
}

/// Flags shared by every analysis command.
#[derive(clap::Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Optional language (auto-detect from extension by default).
    #[arg(long, value_name = "LANG")]
    pub language: Option<Language>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Drop a declaration's own range from its reference set.
    #[arg(long)]
    pub exclude_self_references: bool,

    /// Ignore declarations in inactive preprocessor branches.
    #[arg(long)]
    pub skip_inactive: bool,

    /// Treat syntax errors as fatal.
    #[arg(long)]
    pub strict: bool,
}

impl AnalysisArgs {
    /// Map the flags onto pipeline options.
    pub fn to_options(&self, fail_fast: bool) -> AnalysisOptions {
        AnalysisOptions {
            language: self.language.map(Language::to_detect_language),
            error_recovery: !self.strict,
            fail_fast,
            declarations_as_references: false,
            table: TableOptions {
                collect: CollectOptions {
                    include_inactive: !self.skip_inactive,
                },
                self_references: if self.exclude_self_references {
                    SelfReferencePolicy::Exclude
                } else {
                    SelfReferencePolicy::Preserve
                },
            },
        }
    }
}

/// Programming language.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum Language {
    /// C (.c, .h)
    C,
    /// C++ (.cpp, .hpp, .cc, .cxx)
    Cpp,
}

impl Language {
    /// Convert to the detection module's Language.
    pub fn to_detect_language(self) -> detect::Language {
        match self {
            Language::C => detect::Language::C,
            Language::Cpp => detect::Language::Cpp,
        }
    }
}

/// Output format.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON success payload.
    Json,
    /// One line per declaration.
    Text,
}

/// Parse command-line arguments.
///
/// This function is the entry point for CLI argument parsing.
/// It returns the parsed Cli struct or exits on error.
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Render reports as plain text: a header per file, then
/// `declaration -> reference, ...` per line.
pub fn render_text(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(
            out,
            "{} [{}] sha256:{}",
            report.path.display(),
            report.language.as_str(),
            report.sha256
        );
        for (declaration, references) in &report.symbols {
            let refs: Vec<String> = references.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "  {} -> {}", declaration, refs.join(", "));
        }
    }
    out
}

/// JSON success payload for CLI responses.
#[derive(Serialize)]
pub struct CliSuccessPayload {
    /// Status indicator ("ok").
    pub status: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CliSuccessPayload {
    /// Construct a payload with structured data.
    pub fn with_data(message: String, data: Value) -> Self {
        Self {
            status: "ok",
            message,
            data: Some(data),
        }
    }
}

/// JSON error payload for CLI responses.
#[derive(Serialize)]
pub struct CliErrorPayload {
    /// Status indicator ("error").
    pub status: &'static str,
    /// Structured error details.
    pub error: ErrorDetails,
}

/// Details for a CLI error payload.
#[derive(Serialize)]
pub struct ErrorDetails {
    /// Error kind identifier (Parse, FileAccess, etc.).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional file context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Optional hint for remediation steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliErrorPayload {
    /// Build payload from an XrefError instance.
    pub fn from_error(error: &crate::XrefError) -> Self {
        let file = error
            .file_path()
            .map(|path| path.to_string_lossy().to_string());
        let hint = error.hint().map(|h| h.to_string());

        CliErrorPayload {
            status: "error",
            error: ErrorDetails {
                kind: error.kind(),
                message: error.to_string(),
                file,
                hint,
            },
        }
    }
}
