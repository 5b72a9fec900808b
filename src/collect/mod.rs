//! Declaration name collection.
//!
//! Walks every top-level declaration and everything nested in it, and
//! gathers the name nodes that introduce symbols. The walk uses an explicit
//! worklist so deeply nested namespaces or classes cannot exhaust the stack.

use crate::ast::TranslationUnit;
use std::collections::HashSet;

/// Traversal policy for [`collect_declaration_names`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Descend into declarations of inactive preprocessor branches.
    pub include_inactive: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            include_inactive: true,
        }
    }
}

/// Collect the declaration-use names of `unit`.
///
/// A top-level declaration that does not belong to the unit's own file is
/// skipped together with its subtree. A name is kept iff it is a
/// declaration-use, belongs to the file and has a location.
///
/// The result is a set in depth-first order: a declaration reached through
/// several paths contributes its names once.
pub fn collect_declaration_names<U>(unit: &U, options: &CollectOptions) -> Vec<U::Name>
where
    U: TranslationUnit + ?Sized,
{
    let mut seen_decls = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut collected = Vec::new();

    for &top in unit.declarations() {
        if !unit.is_declaration_in_file(top) {
            log::trace!("Skipping declaration {:?} from included content", top);
            continue;
        }

        let mut worklist = vec![top];
        while let Some(decl) = worklist.pop() {
            if !seen_decls.insert(decl) {
                continue;
            }
            if !options.include_inactive && !unit.is_active(decl) {
                continue;
            }

            for &name in unit.names(decl) {
                if is_declaration_name(unit, name) && seen_names.insert(name) {
                    collected.push(name);
                }
            }

            // reversed so the first nested declaration is visited first
            worklist.extend(unit.nested_declarations(decl).iter().rev().copied());
        }
    }

    log::debug!("Collected {} declaration names", collected.len());
    collected
}

fn is_declaration_name<U>(unit: &U, name: U::Name) -> bool
where
    U: TranslationUnit + ?Sized,
{
    unit.is_declaration(name) && unit.is_name_in_file(name) && unit.file_location(name).is_some()
}
