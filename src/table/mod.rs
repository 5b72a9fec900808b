//! Symbol table assembly.
//!
//! Combines declaration collection, binding resolution and reference lookup
//! into a map from each declaration's range to the ranges referencing it.

use crate::ast::TranslationUnit;
use crate::collect::{collect_declaration_names, CollectOptions};
use crate::position::{OffsetTranslator, TextRange};
use crate::resolve::references::find_references;
use crate::resolve::resolve_binding;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// What to do when the resolver lists a declaration among its own
/// references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfReferencePolicy {
    /// Keep the resolver's answer as is.
    #[default]
    Preserve,
    /// Drop the declaration's own range from its reference set.
    Exclude,
}

/// Options for [`assemble`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableOptions {
    /// Declaration traversal policy.
    pub collect: CollectOptions,
    /// Handling of self-references.
    pub self_references: SelfReferencePolicy,
}

/// Map from declaration range to the set of its reference ranges.
///
/// Keys and values iterate in range order, so two tables built from the same
/// input compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    #[serde(with = "entries")]
    symbols: BTreeMap<TextRange, BTreeSet<TextRange>>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a declaration with its references, replacing any previous
    /// entry for the same range. Returns the replaced reference set.
    pub fn insert(
        &mut self,
        declaration: TextRange,
        references: BTreeSet<TextRange>,
    ) -> Option<BTreeSet<TextRange>> {
        self.symbols.insert(declaration, references)
    }

    /// References of the declaration at `declaration`.
    pub fn get(&self, declaration: &TextRange) -> Option<&BTreeSet<TextRange>> {
        self.symbols.get(declaration)
    }

    /// Whether `declaration` is a key.
    pub fn contains(&self, declaration: &TextRange) -> bool {
        self.symbols.contains_key(declaration)
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table holds no declarations.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Declaration ranges in order.
    pub fn declarations(&self) -> impl Iterator<Item = &TextRange> {
        self.symbols.keys()
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> btree_map::Iter<'_, TextRange, BTreeSet<TextRange>> {
        self.symbols.iter()
    }

    /// Total number of reference ranges over all declarations.
    pub fn reference_count(&self) -> usize {
        self.symbols.values().map(BTreeSet::len).sum()
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = (&'a TextRange, &'a BTreeSet<TextRange>);
    type IntoIter = btree_map::Iter<'a, TextRange, BTreeSet<TextRange>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build the symbol table of `unit`.
///
/// Declarations whose name does not resolve are left out. A declaration
/// with no references maps to an empty set. If two declarations occupy the
/// same range, the one processed last wins.
pub fn assemble<U>(unit: &U, translator: &OffsetTranslator, options: &TableOptions) -> SymbolTable
where
    U: TranslationUnit + ?Sized,
{
    let mut table = SymbolTable::new();
    let mut unresolved = 0usize;

    for name in collect_declaration_names(unit, &options.collect) {
        let Some(binding) = resolve_binding(unit, name) else {
            unresolved += 1;
            continue;
        };
        // collected names always carry a location
        let Some(location) = unit.file_location(name) else {
            continue;
        };
        let declaration = translator.range(location);

        let mut references: BTreeSet<TextRange> = find_references(unit, binding)
            .into_iter()
            .filter_map(|reference| unit.file_location(reference))
            .map(|location| translator.range(location))
            .collect();
        if options.self_references == SelfReferencePolicy::Exclude {
            references.remove(&declaration);
        }

        if table.insert(declaration, references).is_some() {
            log::debug!("Declaration at {} replaced an earlier entry", declaration);
        }
    }

    log::debug!(
        "Symbol table: {} declarations, {} references, {} unresolved",
        table.len(),
        table.reference_count(),
        unresolved
    );
    table
}

/// Serializes the map as a list of `{declaration, references}` objects,
/// since JSON object keys must be strings.
mod entries {
    use crate::position::TextRange;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::{BTreeMap, BTreeSet};

    #[derive(Serialize)]
    struct EntryRef<'a> {
        declaration: &'a TextRange,
        references: &'a BTreeSet<TextRange>,
    }

    #[derive(Deserialize)]
    struct Entry {
        declaration: TextRange,
        references: BTreeSet<TextRange>,
    }

    pub fn serialize<S>(
        symbols: &BTreeMap<TextRange, BTreeSet<TextRange>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(symbols.len()))?;
        for (declaration, references) in symbols {
            seq.serialize_element(&EntryRef {
                declaration,
                references,
            })?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<TextRange, BTreeSet<TextRange>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.declaration, entry.references))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::memory::{MemoryUnit, NameSpec};

    const SOURCE: &str = "int x;\nx = 5;\nint unused;";

    fn scenario() -> MemoryUnit {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        let unused = unit.add_binding();
        let decl_x = unit.add_declaration(None);
        unit.add_name(decl_x, NameSpec::declaration(4, 1).bound(x));
        let stmt = unit.add_declaration(None);
        unit.add_name(stmt, NameSpec::reference(7, 1).bound(x));
        let decl_unused = unit.add_declaration(None);
        unit.add_name(decl_unused, NameSpec::declaration(18, 6).bound(unused));
        unit
    }

    #[test]
    fn test_declaration_maps_to_its_uses() {
        let table = assemble(&scenario(), &OffsetTranslator::new(SOURCE), &TableOptions::default());

        let x = TextRange::from_coords(1, 4, 1, 5);
        let use_x = TextRange::from_coords(2, 0, 2, 1);
        assert_eq!(table.get(&x), Some(&BTreeSet::from([use_x])));
    }

    #[test]
    fn test_unreferenced_declaration_has_empty_set() {
        let table = assemble(&scenario(), &OffsetTranslator::new(SOURCE), &TableOptions::default());

        let unused = TextRange::from_coords(3, 4, 3, 10);
        assert_eq!(table.get(&unused), Some(&BTreeSet::new()));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unresolved_declaration_is_excluded() {
        let mut unit = MemoryUnit::new();
        let decl = unit.add_declaration(None);
        unit.add_name(decl, NameSpec::declaration(4, 1));

        let table = assemble(&unit, &OffsetTranslator::new(SOURCE), &TableOptions::default());
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_reference_locations_collapse() {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        let decl = unit.add_declaration(None);
        unit.add_name(decl, NameSpec::declaration(4, 1).bound(x));
        let first = unit.add_name(decl, NameSpec::reference(7, 1).bound(x));
        unit.report_reference(x, first);
        unit.add_detached_name(NameSpec::reference(7, 1).bound(x));

        let table = assemble(&unit, &OffsetTranslator::new(SOURCE), &TableOptions::default());
        let refs = table.get(&TextRange::from_coords(1, 4, 1, 5)).unwrap();
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_self_reference_policy() {
        let mut unit = MemoryUnit::new();
        let x = unit.add_binding();
        let decl = unit.add_declaration(None);
        let name = unit.add_name(decl, NameSpec::declaration(4, 1).bound(x));
        unit.report_reference(x, name);
        unit.add_name(decl, NameSpec::reference(7, 1).bound(x));
        let translator = OffsetTranslator::new(SOURCE);
        let x_range = TextRange::from_coords(1, 4, 1, 5);

        let preserved = assemble(&unit, &translator, &TableOptions::default());
        assert!(preserved.get(&x_range).unwrap().contains(&x_range));
        assert_eq!(preserved.get(&x_range).unwrap().len(), 2);

        let options = TableOptions {
            self_references: SelfReferencePolicy::Exclude,
            ..TableOptions::default()
        };
        let excluded = assemble(&unit, &translator, &options);
        assert!(!excluded.get(&x_range).unwrap().contains(&x_range));
        assert_eq!(excluded.get(&x_range).unwrap().len(), 1);
    }

    #[test]
    fn test_same_range_later_declaration_wins() {
        let mut unit = MemoryUnit::new();
        let first = unit.add_binding();
        let second = unit.add_binding();
        let a = unit.add_declaration(None);
        unit.add_name(a, NameSpec::declaration(4, 1).bound(first));
        unit.add_name(a, NameSpec::reference(7, 1).bound(first));
        let b = unit.add_declaration(None);
        unit.add_name(b, NameSpec::declaration(4, 1).bound(second));

        let table = assemble(&unit, &OffsetTranslator::new(SOURCE), &TableOptions::default());
        assert_eq!(table.len(), 1);
        assert!(table.get(&TextRange::from_coords(1, 4, 1, 5)).unwrap().is_empty());
    }

    #[test]
    fn test_json_shape() {
        let table = assemble(&scenario(), &OffsetTranslator::new(SOURCE), &TableOptions::default());
        let json = serde_json::to_value(&table).unwrap();

        let entries = json["symbols"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["declaration"]["start"]["line"], 1);
        assert_eq!(entries[0]["references"][0]["start"]["line"], 2);

        let back: SymbolTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
