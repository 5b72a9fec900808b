//! cxx-xref: declaration-to-reference symbol tables for C and C++.
//!
//! For every declaration in a translation unit, the table lists the text
//! ranges of all names that refer to the same symbol. The core
//! ([`collect`], [`resolve`], [`table`]) works on any [`ast::TranslationUnit`];
//! [`frontend`] provides one over tree-sitter parse trees and [`ingest`]
//! drives it from files.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod ast;
pub mod cli;
pub mod collect;
pub mod error;
pub mod frontend;
pub mod ingest;
pub mod position;
pub mod resolve;
pub mod table;

/// Re-export common error types for convenience.
pub use error::{Result, XrefError};

/// Re-export the core types for convenience.
pub use position::{OffsetTranslator, TextPointer, TextRange};
pub use table::{assemble, SymbolTable};

/// cxx-xref version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
