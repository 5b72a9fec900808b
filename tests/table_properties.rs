//! Properties of the position index and table assembly.
//!
//! The assembly properties run against hand-built units so that traversal
//! order, duplicate paths and unresolved names can be set up exactly.

use cxx_xref::ast::memory::{MemoryUnit, NameSpec};
use cxx_xref::table::TableOptions;
use cxx_xref::{assemble, OffsetTranslator, TextPointer, TextRange};

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "int a;\r\nint b = a;\rint c;\n\nint d = b + a;\n";

    /// `int a;` / `int b = a;` / ... laid out over SOURCE, with the
    /// declarations added in `order`.
    fn unit_in_order(order: &[usize]) -> MemoryUnit {
        let mut unit = MemoryUnit::new();
        let a = unit.add_binding();
        let b = unit.add_binding();
        let c = unit.add_binding();
        let d = unit.add_binding();

        for &index in order {
            let decl = unit.add_declaration(None);
            match index {
                0 => {
                    unit.add_name(decl, NameSpec::declaration(4, 1).bound(a));
                }
                1 => {
                    unit.add_name(decl, NameSpec::declaration(12, 1).bound(b));
                    unit.add_name(decl, NameSpec::reference(16, 1).bound(a));
                }
                2 => {
                    unit.add_name(decl, NameSpec::declaration(23, 1).bound(c));
                }
                _ => {
                    unit.add_name(decl, NameSpec::declaration(31, 1).bound(d));
                    unit.add_name(decl, NameSpec::reference(35, 1).bound(b));
                    unit.add_name(decl, NameSpec::reference(39, 1).bound(a));
                }
            }
        }
        unit
    }

    #[test]
    fn test_offsets_round_trip() {
        let index = OffsetTranslator::new(SOURCE);
        for offset in 0..index.len() {
            let pointer = index.pointer(offset);
            let start = index.line_start(pointer.line).unwrap();
            assert_eq!(start + pointer.column, offset, "offset {}", offset);
        }
    }

    #[test]
    fn test_pointers_are_monotonic() {
        let index = OffsetTranslator::new(SOURCE);
        let pointers: Vec<TextPointer> = (0..=index.len()).map(|o| index.pointer(o)).collect();
        assert!(pointers.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_offset_past_end_clamps() {
        let index = OffsetTranslator::new(SOURCE);
        assert_eq!(index.pointer(index.len() + 100), index.pointer(index.len()));
    }

    #[test]
    fn test_assembly_is_independent_of_traversal_order() {
        let index = OffsetTranslator::new(SOURCE);
        let options = TableOptions::default();

        let forward = assemble(&unit_in_order(&[0, 1, 2, 3]), &index, &options);
        let backward = assemble(&unit_in_order(&[3, 2, 1, 0]), &index, &options);
        let again = assemble(&unit_in_order(&[0, 1, 2, 3]), &index, &options);

        assert_eq!(forward, backward);
        assert_eq!(forward, again);
        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&backward).unwrap()
        );

        let a = TextRange::from_coords(1, 4, 1, 5);
        assert_eq!(forward.get(&a).map(|refs| refs.len()), Some(2));
    }

    #[test]
    fn test_unresolved_declarations_never_become_keys() {
        let mut unit = unit_in_order(&[0, 1]);
        let orphan = unit.add_declaration(None);
        unit.add_name(orphan, NameSpec::declaration(23, 1));

        let table = assemble(&unit, &OffsetTranslator::new(SOURCE), &TableOptions::default());
        assert_eq!(table.len(), 2);
        assert!(!table.contains(&TextRange::from_coords(3, 4, 3, 5)));
    }

    #[test]
    fn test_reference_reached_twice_is_listed_once() {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        let decl = unit.add_declaration(None);
        unit.add_name(decl, NameSpec::declaration(4, 1).bound(x));
        let user = unit.add_declaration(None);
        let used = unit.add_name(user, NameSpec::reference(16, 1).bound(x));
        // the same declaration hangs under two parents
        unit.link_declaration(Some(decl), user);
        unit.report_reference(x, used);

        let table = assemble(&unit, &OffsetTranslator::new(SOURCE), &TableOptions::default());
        let refs = table.get(&TextRange::from_coords(1, 4, 1, 5)).unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs.contains(&TextRange::from_coords(2, 8, 2, 9)));
    }

    #[test]
    fn test_synthetic_and_external_names_are_dropped() {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        let decl = unit.add_declaration(None);
        unit.add_name(decl, NameSpec::declaration(4, 1).bound(x));
        unit.add_name(decl, NameSpec::declaration(12, 1).bound(x).synthetic());
        unit.add_detached_name(NameSpec::reference(16, 1).bound(x).external());
        unit.add_detached_name(NameSpec::reference(0, 0).bound(x).synthetic());

        let included = unit.add_declaration(None);
        unit.set_in_file(included, false);
        let y = unit.add_binding();
        unit.add_name(included, NameSpec::declaration(23, 1).bound(y));

        let table = assemble(&unit, &OffsetTranslator::new(SOURCE), &TableOptions::default());
        assert_eq!(table.len(), 1);
        assert!(table.get(&TextRange::from_coords(1, 4, 1, 5)).unwrap().is_empty());
    }
}
