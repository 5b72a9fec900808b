//! Concrete translation units.
//!
//! The tree-sitter C/C++ frontend parses one file without expanding
//! includes and resolves names with its own scope model.

pub mod cpp;
mod preproc;
mod scope;

pub use cpp::{CppBinding, CppDecl, CppName, CppOptions, CppSymbolKind, CppUnit};
