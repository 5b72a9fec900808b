//! Reference lookup by binding.
//!
//! Queries the unit's global binding index and keeps only occurrences that
//! can be shown to a user: in this file and with a location.

use crate::ast::TranslationUnit;

/// Find the names resolving to `binding` that belong to the unit's file
/// and carry a location.
///
/// The order is whatever the unit reports; consumers treat the result as a
/// set once converted to ranges.
pub fn find_references<U>(unit: &U, binding: U::Binding) -> Vec<U::Name>
where
    U: TranslationUnit + ?Sized,
{
    unit.references(binding)
        .iter()
        .copied()
        .filter(|&name| unit.is_name_in_file(name) && unit.file_location(name).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::memory::{MemoryUnit, NameSpec};

    #[test]
    fn test_only_located_in_file_references_survive() {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        let y = unit.add_binding();
        let decl = unit.add_declaration(None);
        let visible = unit.add_name(decl, NameSpec::reference(10, 1).bound(x));
        unit.add_name(decl, NameSpec::reference(12, 1).bound(x).synthetic());
        unit.add_name(decl, NameSpec::reference(14, 1).bound(x).external());
        unit.add_name(decl, NameSpec::reference(16, 1).bound(y));

        assert_eq!(find_references(&unit, x), vec![visible]);
    }

    #[test]
    fn test_unreferenced_binding_has_no_references() {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        assert!(find_references(&unit, x).is_empty());
    }
}
