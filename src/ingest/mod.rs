//! Filesystem → text → AST → symbol table pipeline.
//!
//! Reads C/C++ source files, indexes their text, parses them with
//! tree-sitter and assembles one symbol table per file. Files are
//! independent: nothing is shared between two runs of the pipeline.

pub mod detect;

use crate::error::{Result, XrefError};
use crate::frontend::{CppOptions, CppUnit};
use crate::position::OffsetTranslator;
use crate::table::{assemble, SymbolTable, TableOptions};
use detect::{detect_language, Language};
use glob::glob;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Options for the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Grammar override. Detected from the extension when `None`.
    pub language: Option<Language>,

    /// Index files with syntax errors, and skip failing files in a glob
    /// run instead of aborting it.
    pub error_recovery: bool,

    /// Abort a glob run on the first failing file even with error recovery.
    pub fail_fast: bool,

    /// Report declaration names among their own references.
    pub declarations_as_references: bool,

    /// Table assembly options.
    pub table: TableOptions,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            language: None,
            error_recovery: true,
            fail_fast: false,
            declarations_as_references: false,
            table: TableOptions::default(),
        }
    }
}

/// Symbol table of one file, with what identifies the input.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Path of the analysed file.
    pub path: PathBuf,

    /// SHA-256 of the file bytes, lowercase hex.
    pub sha256: String,

    /// Grammar the file was parsed with.
    pub language: Language,

    /// Declarations and their references.
    pub symbols: SymbolTable,
}

/// Main ingest orchestrator.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    options: AnalysisOptions,
}

impl Ingestor {
    /// Create an ingestor with the given options.
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    /// The options this ingestor runs with.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Read and analyse a single file.
    pub fn ingest_file(&self, path: &Path) -> Result<FileReport> {
        let bytes = std::fs::read(path).map_err(|source| XrefError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        self.ingest_source(path, &bytes)
    }

    /// Analyse `bytes` as the contents of `path`.
    pub fn ingest_source(&self, path: &Path, bytes: &[u8]) -> Result<FileReport> {
        let language = self.language_for(path)?;
        let sha256 = compute_hash(bytes);
        let translator = OffsetTranslator::from_utf8(path, bytes)?;

        let cpp_options = CppOptions {
            language,
            error_recovery: self.options.error_recovery,
            declarations_as_references: self.options.declarations_as_references,
        };
        let unit = CppUnit::parse(path, translator.text(), &cpp_options)?;
        let symbols = assemble(&unit, &translator, &self.options.table);

        log::debug!(
            "Indexed {} ({}): {} declarations, {} references",
            path.display(),
            language.as_str(),
            symbols.len(),
            symbols.reference_count()
        );

        Ok(FileReport {
            path: path.to_path_buf(),
            sha256,
            language,
            symbols,
        })
    }

    /// Analyse every C/C++ file matching `pattern`.
    ///
    /// Without a language override, files with other extensions are
    /// ignored. A failing file is logged and skipped under error recovery;
    /// otherwise, or with `fail_fast`, it aborts the run.
    pub fn ingest_glob(&self, pattern: &str) -> Result<Vec<FileReport>> {
        let abort_on_failure = !self.options.error_recovery || self.options.fail_fast;
        let mut reports = Vec::new();

        for entry in glob(pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) if abort_on_failure => {
                    return Err(XrefError::FileAccess {
                        path: e.path().to_path_buf(),
                        source: e.into(),
                    })
                }
                Err(e) => {
                    log::warn!("Skipping unreadable glob entry: {}", e);
                    continue;
                }
            };

            if path.is_dir() {
                continue;
            }
            if self.options.language.is_none() && detect_language(&path).is_none() {
                log::debug!("Skipping {}: not a C/C++ file", path.display());
                continue;
            }

            match self.ingest_file(&path) {
                Ok(report) => reports.push(report),
                Err(error) if abort_on_failure => return Err(error),
                Err(error) => log::warn!("Skipping {}: {}", path.display(), error),
            }
        }

        log::debug!("Glob '{}' produced {} reports", pattern, reports.len());
        Ok(reports)
    }

    fn language_for(&self, path: &Path) -> Result<Language> {
        self.options
            .language
            .or_else(|| detect_language(path))
            .ok_or_else(|| XrefError::UnsupportedLanguage {
                file: path.to_path_buf(),
            })
    }
}

/// Compute SHA-256 hash of bytes.
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)
}
