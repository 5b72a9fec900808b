//! cxx-xref error types.
//!
//! Only failures that abort the analysis of a whole file are errors.
//! Unresolved bindings, missing locations and filtered declarations are
//! absorbed by the components that meet them.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for cxx-xref operations.
#[derive(Error, Debug)]
pub enum XrefError {
    /// The source file could not be read.
    #[error("Unable to read file {path}: {source}")]
    FileAccess {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The parser could not produce a usable tree for the file.
    #[error("Unable to parse file {file}: {message}")]
    Parse {
        /// The file that failed to parse.
        file: PathBuf,
        /// The parse error message.
        message: String,
    },

    /// The file is not valid UTF-8.
    #[error("Invalid UTF-8 in {file}: {source}")]
    Encoding {
        /// The file that failed to decode.
        file: PathBuf,
        /// The underlying decode error.
        #[source]
        source: std::str::Utf8Error,
    },

    /// No grammar is known for the file extension.
    #[error("Unsupported language for file {file}")]
    UnsupportedLanguage {
        /// The file whose language could not be detected.
        file: PathBuf,
    },

    /// Malformed glob pattern.
    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XrefError {
    /// Build a parse error for `file`.
    pub fn parse(file: &Path, message: impl Into<String>) -> Self {
        XrefError::Parse {
            file: file.to_path_buf(),
            message: message.into(),
        }
    }

    /// Stable identifier of the error variant, used in CLI payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            XrefError::FileAccess { .. } => "FileAccess",
            XrefError::Parse { .. } => "Parse",
            XrefError::Encoding { .. } => "Encoding",
            XrefError::UnsupportedLanguage { .. } => "UnsupportedLanguage",
            XrefError::InvalidPattern(_) => "InvalidPattern",
            XrefError::Json(_) => "Json",
        }
    }

    /// The file this error is about, if any.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            XrefError::FileAccess { path, .. } => Some(path),
            XrefError::Parse { file, .. }
            | XrefError::Encoding { file, .. }
            | XrefError::UnsupportedLanguage { file } => Some(file),
            _ => None,
        }
    }

    /// Remediation hint for the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            XrefError::Parse { .. } => {
                Some("Drop --strict to index files that contain syntax errors")
            }
            XrefError::Encoding { .. } => Some("Convert the file to UTF-8"),
            XrefError::UnsupportedLanguage { .. } => {
                Some("Pass --language c or --language cpp to force a grammar")
            }
            _ => None,
        }
    }
}

/// Result type alias for cxx-xref operations.
pub type Result<T> = std::result::Result<T, XrefError>;
