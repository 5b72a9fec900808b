//! Lexical scopes of a C/C++ translation unit.
//!
//! Each scope maps spellings to bindings in two name spaces: ordinary names
//! (variables, functions, typedefs, namespaces) and tags (`struct`, `union`,
//! `class` and `enum` names), so `struct stat` and `stat()` stay distinct.
//! Function and block scopes are ordered: a local only becomes visible at
//! its declaration point, so a use before it resolves to an outer symbol.
//! Namespace, class and file scopes see every member regardless of position.

use super::cpp::CppBinding;
use std::collections::HashMap;

/// Bounds base-class and using-directive chains, which may be cyclic in
/// broken code.
const MAX_MEMBER_DEPTH: usize = 16;

/// Handle of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ScopeId(usize);

/// Which names a declaration or lookup deals with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameSpace {
    /// Variables, functions, typedefs, enumerators, namespaces. In C++ a
    /// lookup falls back to a tag of the same scope when no ordinary name
    /// matches.
    Ordinary,
    /// Elaborated `struct X`, `union X`, `enum X`.
    Tag,
    /// A name before `::` or in a base clause: tags first, then ordinary
    /// names. Only used for lookups.
    Qualifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    File,
    Namespace,
    Class,
    Template,
    Function,
    Block,
}

impl ScopeKind {
    fn is_ordered(self) -> bool {
        matches!(self, ScopeKind::Function | ScopeKind::Block)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    binding: CppBinding,
    declared_at: usize,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    symbols: HashMap<String, Entry>,
    tags: HashMap<String, Entry>,
    /// Base classes, searched after the scope's own members.
    bases: Vec<ScopeId>,
    /// Namespaces made visible by `using namespace`.
    usings: Vec<ScopeId>,
}

#[derive(Debug)]
pub(crate) struct Scopes {
    scopes: Vec<Scope>,
    /// C++: a class or enum name is also usable as a plain type name.
    tags_are_types: bool,
}

impl Scopes {
    pub(crate) const FILE: ScopeId = ScopeId(0);

    pub(crate) fn new(tags_are_types: bool) -> Self {
        let mut scopes = Self {
            scopes: Vec::new(),
            tags_are_types,
        };
        scopes.push(ScopeKind::File, None);
        scopes
    }

    pub(crate) fn push(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            kind,
            parent,
            symbols: HashMap::new(),
            tags: HashMap::new(),
            bases: Vec::new(),
            usings: Vec::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// The binding `name` has in `scope` itself, ignoring position.
    pub(crate) fn local(&self, scope: ScopeId, space: NameSpace, name: &str) -> Option<CppBinding> {
        self.entry(scope, space, name).map(|entry| entry.binding)
    }

    /// Bind `name` in `scope` from `position` on. The first declaration of
    /// a name wins; redeclarations share its binding.
    pub(crate) fn declare(
        &mut self,
        scope: ScopeId,
        space: NameSpace,
        name: &str,
        binding: CppBinding,
        position: usize,
    ) {
        let data = &mut self.scopes[scope.0];
        let table = match space {
            NameSpace::Tag => &mut data.tags,
            NameSpace::Ordinary | NameSpace::Qualifier => &mut data.symbols,
        };
        table
            .entry(name.to_string())
            .or_insert(Entry {
                binding,
                declared_at: position,
            });
    }

    pub(crate) fn add_base(&mut self, scope: ScopeId, base: ScopeId) {
        if scope != base && !self.scopes[scope.0].bases.contains(&base) {
            self.scopes[scope.0].bases.push(base);
        }
    }

    pub(crate) fn add_using(&mut self, scope: ScopeId, used: ScopeId) {
        if scope != used && !self.scopes[scope.0].usings.contains(&used) {
            self.scopes[scope.0].usings.push(used);
        }
    }

    /// The entry `name` has in `scope` itself for `space`.
    fn entry(&self, scope: ScopeId, space: NameSpace, name: &str) -> Option<&Entry> {
        let data = &self.scopes[scope.0];
        match space {
            NameSpace::Tag => data.tags.get(name),
            NameSpace::Ordinary if self.tags_are_types => {
                data.symbols.get(name).or_else(|| data.tags.get(name))
            }
            NameSpace::Ordinary => data.symbols.get(name),
            NameSpace::Qualifier => data.tags.get(name).or_else(|| data.symbols.get(name)),
        }
    }

    /// Unqualified lookup of `name` used at `position`, walking outwards.
    pub(crate) fn lookup(
        &self,
        scope: ScopeId,
        space: NameSpace,
        name: &str,
        position: usize,
    ) -> Option<CppBinding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = &self.scopes[id.0];
            if let Some(entry) = self.entry(id, space, name) {
                if !data.kind.is_ordered() || entry.declared_at <= position {
                    return Some(entry.binding);
                }
            }
            let inherited = data
                .bases
                .iter()
                .chain(&data.usings)
                .find_map(|&other| self.member_at(other, space, name, 1));
            if inherited.is_some() {
                return inherited;
            }
            current = data.parent;
        }
        None
    }

    /// Qualified lookup of `name` inside `scope` (`scope::name`).
    pub(crate) fn lookup_member(&self, scope: ScopeId, space: NameSpace, name: &str) -> Option<CppBinding> {
        self.member_at(scope, space, name, 0)
    }

    fn member_at(&self, scope: ScopeId, space: NameSpace, name: &str, depth: usize) -> Option<CppBinding> {
        if depth > MAX_MEMBER_DEPTH {
            return None;
        }
        if let Some(entry) = self.entry(scope, space, name) {
            return Some(entry.binding);
        }
        let data = &self.scopes[scope.0];
        data.bases
            .iter()
            .chain(&data.usings)
            .find_map(|&other| self.member_at(other, space, name, depth + 1))
    }

    /// The class whose members `this` refers to inside `scope`.
    pub(crate) fn enclosing_class(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id.0].kind == ScopeKind::Class {
                return Some(id);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(n: usize) -> CppBinding {
        CppBinding::from_index(n)
    }

    #[test]
    fn test_block_scope_is_ordered() {
        let mut scopes = Scopes::new(true);
        scopes.declare(Scopes::FILE, NameSpace::Ordinary, "x", binding(0), 0);
        let block = scopes.push(ScopeKind::Block, Some(Scopes::FILE));
        scopes.declare(block, NameSpace::Ordinary, "x", binding(1), 50);

        assert_eq!(scopes.lookup(block, NameSpace::Ordinary, "x", 40), Some(binding(0)));
        assert_eq!(scopes.lookup(block, NameSpace::Ordinary, "x", 60), Some(binding(1)));
    }

    #[test]
    fn test_class_scope_is_unordered() {
        let mut scopes = Scopes::new(true);
        let class = scopes.push(ScopeKind::Class, Some(Scopes::FILE));
        let method = scopes.push(ScopeKind::Function, Some(class));
        scopes.declare(class, NameSpace::Ordinary, "member", binding(0), 100);

        assert_eq!(scopes.lookup(method, NameSpace::Ordinary, "member", 10), Some(binding(0)));
        assert_eq!(scopes.enclosing_class(method), Some(class));
    }

    #[test]
    fn test_redeclaration_keeps_first_binding() {
        let mut scopes = Scopes::new(true);
        scopes.declare(Scopes::FILE, NameSpace::Ordinary, "f", binding(0), 0);
        scopes.declare(Scopes::FILE, NameSpace::Ordinary, "f", binding(1), 10);
        assert_eq!(scopes.local(Scopes::FILE, NameSpace::Ordinary, "f"), Some(binding(0)));
    }

    #[test]
    fn test_bases_and_usings_are_searched() {
        let mut scopes = Scopes::new(true);
        let base = scopes.push(ScopeKind::Class, Some(Scopes::FILE));
        let derived = scopes.push(ScopeKind::Class, Some(Scopes::FILE));
        let ns = scopes.push(ScopeKind::Namespace, Some(Scopes::FILE));
        scopes.declare(base, NameSpace::Ordinary, "inherited", binding(0), 0);
        scopes.declare(ns, NameSpace::Ordinary, "imported", binding(1), 0);
        scopes.add_base(derived, base);
        scopes.add_using(Scopes::FILE, ns);

        assert_eq!(scopes.lookup_member(derived, NameSpace::Ordinary, "inherited"), Some(binding(0)));
        assert_eq!(scopes.lookup(derived, NameSpace::Ordinary, "imported", 0), Some(binding(1)));
    }

    #[test]
    fn test_cyclic_bases_terminate() {
        let mut scopes = Scopes::new(true);
        let a = scopes.push(ScopeKind::Class, Some(Scopes::FILE));
        let b = scopes.push(ScopeKind::Class, Some(Scopes::FILE));
        scopes.add_base(a, b);
        scopes.add_base(b, a);

        assert_eq!(scopes.lookup_member(a, NameSpace::Ordinary, "missing"), None);
    }

    #[test]
    fn test_tags_and_ordinary_names_are_separate() {
        let mut c = Scopes::new(false);
        c.declare(Scopes::FILE, NameSpace::Tag, "stat", binding(0), 0);
        c.declare(Scopes::FILE, NameSpace::Ordinary, "stat", binding(1), 30);

        assert_eq!(c.local(Scopes::FILE, NameSpace::Tag, "stat"), Some(binding(0)));
        assert_eq!(c.local(Scopes::FILE, NameSpace::Ordinary, "stat"), Some(binding(1)));
        assert_eq!(c.lookup_member(Scopes::FILE, NameSpace::Qualifier, "stat"), Some(binding(0)));
    }

    #[test]
    fn test_tag_fallback_only_in_cpp() {
        for (tags_are_types, expected) in [(false, None), (true, Some(binding(0)))] {
            let mut scopes = Scopes::new(tags_are_types);
            scopes.declare(Scopes::FILE, NameSpace::Tag, "Point", binding(0), 0);
            let block = scopes.push(ScopeKind::Block, Some(Scopes::FILE));
            assert_eq!(scopes.lookup(block, NameSpace::Ordinary, "Point", 10), expected);
        }
    }

    #[test]
    fn test_inner_tag_hides_outer_ordinary_name_in_cpp() {
        let mut scopes = Scopes::new(true);
        scopes.declare(Scopes::FILE, NameSpace::Ordinary, "Node", binding(0), 0);
        let ns = scopes.push(ScopeKind::Namespace, Some(Scopes::FILE));
        scopes.declare(ns, NameSpace::Tag, "Node", binding(1), 10);

        assert_eq!(scopes.lookup(ns, NameSpace::Ordinary, "Node", 20), Some(binding(1)));
        assert_eq!(scopes.lookup(Scopes::FILE, NameSpace::Ordinary, "Node", 20), Some(binding(0)));
    }
}
