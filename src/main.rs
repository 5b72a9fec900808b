//! cxx-xref CLI binary
//!
//! This is the main entry point for the cxx-xref command-line interface.
//! The CLI is a thin adapter over existing APIs - NO logic is implemented here.

use cxx_xref::cli::{AnalysisArgs, CliErrorPayload, CliSuccessPayload, Commands, Format};
use cxx_xref::ingest::{FileReport, Ingestor};
use cxx_xref::XrefError;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = cxx_xref::cli::parse_args();

    // Initialize logger if verbose
    if cli.verbose {
        env_logger::init();
    }

    // Execute command
    let result = match cli.command {
        Commands::Table { file, analysis } => execute_table(&file, &analysis),
        Commands::Scan {
            glob,
            analysis,
            fail_fast,
        } => execute_scan(&glob, &analysis, fail_fast),
    };

    // Handle result
    match result {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            match serde_json::to_string_pretty(&CliErrorPayload::from_error(&e)) {
                Ok(payload) => eprintln!("{}", payload),
                Err(_) => eprintln!("Error: {}", e),
            }
            ExitCode::from(1)
        }
    }
}

/// Execute the table command: one file, one report.
fn execute_table(file: &Path, analysis: &AnalysisArgs) -> Result<String, XrefError> {
    let ingestor = Ingestor::new(analysis.to_options(false));
    let report = ingestor.ingest_file(file)?;

    let message = format!(
        "Indexed {}: {} declarations, {} references",
        file.display(),
        report.symbols.len(),
        report.symbols.reference_count()
    );
    render(analysis.format, message, vec![report])
}

/// Execute the scan command over every file matching the glob.
fn execute_scan(pattern: &str, analysis: &AnalysisArgs, fail_fast: bool) -> Result<String, XrefError> {
    let ingestor = Ingestor::new(analysis.to_options(fail_fast));
    let reports = ingestor.ingest_glob(pattern)?;

    let message = format!("Indexed {} files matching '{}'", reports.len(), pattern);
    render(analysis.format, message, reports)
}

fn render(format: Format, message: String, reports: Vec<FileReport>) -> Result<String, XrefError> {
    match format {
        Format::Text => Ok(cxx_xref::cli::render_text(&reports)),
        Format::Json => {
            let data = serde_json::to_value(&reports)?;
            let payload = CliSuccessPayload::with_data(message, data);
            Ok(format!("{}\n", serde_json::to_string_pretty(&payload)?))
        }
    }
}
