//! In-memory translation unit.
//!
//! A hand-built arena implementing [`TranslationUnit`]. Frontends that do not
//! own a tree can lower into it, and tests use it to describe exact AST
//! shapes (overlapping traversal paths, synthetic names, included content)
//! that a real parser only produces in corner cases.

use super::{FileLocation, TranslationUnit};

/// Declaration handle of a [`MemoryUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(usize);

/// Name handle of a [`MemoryUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameId(usize);

/// Binding handle of a [`MemoryUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(usize);

/// Description of a name node to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSpec {
    /// Declaration-use (`true`) or reference-use (`false`).
    pub declaration: bool,
    /// Part of the unit's own file.
    pub in_file: bool,
    /// Location, `None` for synthetic names.
    pub location: Option<FileLocation>,
    /// Resolved binding.
    pub binding: Option<BindingId>,
}

impl NameSpec {
    /// A declaration-use name at `offset`.
    pub fn declaration(offset: usize, length: usize) -> Self {
        Self {
            declaration: true,
            in_file: true,
            location: Some(FileLocation::new(offset, length)),
            binding: None,
        }
    }

    /// A reference-use name at `offset`.
    pub fn reference(offset: usize, length: usize) -> Self {
        Self {
            declaration: false,
            ..Self::declaration(offset, length)
        }
    }

    /// Resolve the name to `binding`.
    pub fn bound(mut self, binding: BindingId) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Drop the location, as for compiler-generated names.
    pub fn synthetic(mut self) -> Self {
        self.location = None;
        self
    }

    /// Mark the name as coming from included content.
    pub fn external(mut self) -> Self {
        self.in_file = false;
        self
    }
}

#[derive(Debug, Clone)]
struct DeclData {
    nested: Vec<DeclId>,
    names: Vec<NameId>,
    active: bool,
    in_file: bool,
}

/// Arena-backed [`TranslationUnit`].
#[derive(Debug, Clone, Default)]
pub struct MemoryUnit {
    top_level: Vec<DeclId>,
    decls: Vec<DeclData>,
    names: Vec<NameSpec>,
    references: Vec<Vec<NameId>>,
}

impl MemoryUnit {
    /// Create an empty unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new symbol identity.
    pub fn add_binding(&mut self) -> BindingId {
        self.references.push(Vec::new());
        BindingId(self.references.len() - 1)
    }

    /// Add an active, in-file declaration under `parent` (top level if `None`).
    pub fn add_declaration(&mut self, parent: Option<DeclId>) -> DeclId {
        let id = DeclId(self.decls.len());
        self.decls.push(DeclData {
            nested: Vec::new(),
            names: Vec::new(),
            active: true,
            in_file: true,
        });
        self.link_declaration(parent, id);
        id
    }

    /// Make `decl` reachable from `parent` as well.
    ///
    /// A declaration linked twice is reached by two traversal paths.
    pub fn link_declaration(&mut self, parent: Option<DeclId>, decl: DeclId) {
        match parent {
            Some(parent) => self.decls[parent.0].nested.push(decl),
            None => self.top_level.push(decl),
        }
    }

    /// Mark `decl` as belonging to an inactive branch.
    pub fn set_active(&mut self, decl: DeclId, active: bool) {
        self.decls[decl.0].active = active;
    }

    /// Mark `decl` as coming from included content.
    pub fn set_in_file(&mut self, decl: DeclId, in_file: bool) {
        self.decls[decl.0].in_file = in_file;
    }

    /// Add a name owned by `decl`.
    ///
    /// Bound reference-use names are registered in the binding's reference
    /// list; declaration-use names are not (see [`Self::report_reference`]).
    pub fn add_name(&mut self, decl: DeclId, spec: NameSpec) -> NameId {
        let id = self.add_detached_name(spec);
        self.decls[decl.0].names.push(id);
        id
    }

    /// Add a name that belongs to no declaration (e.g. a macro test in a
    /// preprocessor condition).
    pub fn add_detached_name(&mut self, spec: NameSpec) -> NameId {
        let id = NameId(self.names.len());
        self.names.push(spec);
        if let (false, Some(binding)) = (spec.declaration, spec.binding) {
            self.references[binding.0].push(id);
        }
        id
    }

    /// Report `name` as a reference of `binding`, in addition to whatever
    /// [`Self::add_name`] registered. Duplicates are kept.
    pub fn report_reference(&mut self, binding: BindingId, name: NameId) {
        self.references[binding.0].push(name);
    }
}

impl TranslationUnit for MemoryUnit {
    type Declaration = DeclId;
    type Name = NameId;
    type Binding = BindingId;

    fn declarations(&self) -> &[DeclId] {
        &self.top_level
    }

    fn nested_declarations(&self, decl: DeclId) -> &[DeclId] {
        &self.decls[decl.0].nested
    }

    fn names(&self, decl: DeclId) -> &[NameId] {
        &self.decls[decl.0].names
    }

    fn is_active(&self, decl: DeclId) -> bool {
        self.decls[decl.0].active
    }

    fn is_declaration_in_file(&self, decl: DeclId) -> bool {
        self.decls[decl.0].in_file
    }

    fn is_declaration(&self, name: NameId) -> bool {
        self.names[name.0].declaration
    }

    fn is_name_in_file(&self, name: NameId) -> bool {
        self.names[name.0].in_file
    }

    fn file_location(&self, name: NameId) -> Option<FileLocation> {
        self.names[name.0].location
    }

    fn resolve_binding(&self, name: NameId) -> Option<BindingId> {
        self.names[name.0].binding
    }

    fn references(&self, binding: BindingId) -> &[NameId] {
        &self.references[binding.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_names_are_indexed() {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        let decl = unit.add_declaration(None);
        let def = unit.add_name(decl, NameSpec::declaration(4, 1).bound(x));
        let use_ = unit.add_name(decl, NameSpec::reference(7, 1).bound(x));

        assert_eq!(unit.references(x), &[use_]);
        assert_eq!(unit.names(decl), &[def, use_]);
        assert!(unit.is_declaration(def));
        assert!(!unit.is_declaration(use_));
    }

    #[test]
    fn test_linked_declaration_has_two_parents() {
        let mut unit = MemoryUnit::new();
        let outer = unit.add_declaration(None);
        let inner = unit.add_declaration(Some(outer));
        unit.link_declaration(None, inner);

        assert_eq!(unit.declarations(), &[outer, inner]);
        assert_eq!(unit.nested_declarations(outer), &[inner]);
    }

    #[test]
    fn test_name_spec_modifiers() {
        let spec = NameSpec::reference(0, 3).synthetic().external();
        assert!(spec.location.is_none());
        assert!(!spec.in_file);
        assert!(!spec.declaration);
    }
}
