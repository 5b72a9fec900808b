//! Abstract view of a parsed translation unit.
//!
//! The symbol table core never touches a concrete parser. Anything that can
//! enumerate declarations, classify name nodes and resolve bindings can be
//! indexed: the tree-sitter frontend in [`crate::frontend`] and the
//! in-memory [`memory::MemoryUnit`] both implement [`TranslationUnit`].

pub mod memory;

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Location of a node in the file, as a flat character offset and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    /// Character offset of the first character of the node.
    pub offset: usize,

    /// Length of the node in characters.
    pub length: usize,
}

impl FileLocation {
    /// Create a location.
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }
}

/// A translation unit whose names can be resolved to bindings.
///
/// Handles are opaque and compared by identity: two names with the same
/// spelling are different handles, and a binding handle is shared by every
/// name that denotes the same symbol.
pub trait TranslationUnit {
    /// Handle of a declaration node.
    type Declaration: Copy + Eq + Hash + Debug;

    /// Handle of a name (identifier occurrence) node.
    type Name: Copy + Eq + Hash + Debug;

    /// Canonical identity of a symbol.
    type Binding: Copy + Eq + Hash + Debug;

    /// Top-level declarations, including those in inactive branches.
    fn declarations(&self) -> &[Self::Declaration];

    /// Declarations nested directly inside `decl` (members, locals,
    /// parameters, declarations in inactive branches).
    fn nested_declarations(&self, decl: Self::Declaration) -> &[Self::Declaration];

    /// Names owned by `decl` itself, excluding those of nested declarations.
    fn names(&self, decl: Self::Declaration) -> &[Self::Name];

    /// Whether `decl` is compiled in (not inside an inactive branch).
    fn is_active(&self, decl: Self::Declaration) -> bool;

    /// Whether `decl` originates from this unit's own file rather than from
    /// included content.
    fn is_declaration_in_file(&self, decl: Self::Declaration) -> bool;

    /// Whether `name` introduces a symbol rather than using one.
    fn is_declaration(&self, name: Self::Name) -> bool;

    /// Whether `name` originates from this unit's own file.
    fn is_name_in_file(&self, name: Self::Name) -> bool;

    /// Location of `name` in the file. `None` for synthetic names.
    fn file_location(&self, name: Self::Name) -> Option<FileLocation>;

    /// The symbol `name` denotes, if it can be resolved.
    fn resolve_binding(&self, name: Self::Name) -> Option<Self::Binding>;

    /// Every name in the unit resolving to `binding`.
    fn references(&self, binding: Self::Binding) -> &[Self::Name];
}
