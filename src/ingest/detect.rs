//! Language detection from file extensions.
//!
//! Table-driven language detection. No heuristics, no guessing.
//! Unknown extensions return None, never infer from content.

use serde::Serialize;
use std::path::Path;

/// Languages the frontend has a grammar for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C (.c, .h)
    C,
    /// C++ (.cpp, .hpp, .cc, .cxx, .hh, .hxx)
    Cpp,
}

impl Language {
    /// Convert language to string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

/// Detect programming language from file path.
///
/// Uses table-driven extension mapping. Returns None for unknown extensions.
/// Headers ending in `.h` are parsed as C; pass an explicit language for
/// C++ headers with that extension.
///
/// # Examples
///
/// ```
/// # use cxx_xref::ingest::detect::{detect_language, Language};
/// # use std::path::Path;
/// assert_eq!(detect_language(Path::new("main.c")), Some(Language::C));
/// assert_eq!(detect_language(Path::new("widget.cpp")), Some(Language::Cpp));
/// assert_eq!(detect_language(Path::new("notes.txt")), None);
/// ```
pub fn detect_language(path: &Path) -> Option<Language> {
    let extension = path.extension()?.to_str()?;

    // case-sensitive
    let language = match extension {
        "c" | "h" => Language::C,
        "cpp" | "hpp" | "cc" | "cxx" | "hh" | "hxx" => Language::Cpp,
        _ => return None,
    };

    Some(language)
}
