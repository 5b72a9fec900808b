//! Symbol tables of real C/C++ sources.
//!
//! Each test runs the whole pipeline (text index, tree-sitter frontend,
//! table assembly) and checks declaration and reference ranges by
//! line:column.

use cxx_xref::collect::CollectOptions;
use cxx_xref::ingest::{AnalysisOptions, FileReport, Ingestor};
use cxx_xref::table::{SelfReferencePolicy, TableOptions};
use cxx_xref::{SymbolTable, TextRange};
use std::collections::BTreeSet;
use std::path::Path;

#[cfg(test)]
mod tests {
    use super::*;

    fn table(file: &str, source: &str) -> SymbolTable {
        table_with(file, source, AnalysisOptions::default())
    }

    fn table_with(file: &str, source: &str, options: AnalysisOptions) -> SymbolTable {
        let report: FileReport = Ingestor::new(options)
            .ingest_source(Path::new(file), source.as_bytes())
            .expect("Failed to index source");
        report.symbols
    }

    fn range(line: usize, start: usize, end: usize) -> TextRange {
        TextRange::from_coords(line, start, line, end)
    }

    fn refs<const N: usize>(ranges: [TextRange; N]) -> BTreeSet<TextRange> {
        BTreeSet::from(ranges)
    }

    #[test]
    fn test_declaration_and_later_assignment() {
        let symbols = table(
            "assign.c",
            "int x;\n\
             int main(void) {\n    x = 5;\n    return 0;\n}\n",
        );

        assert_eq!(symbols.get(&range(1, 4, 5)), Some(&refs([range(3, 4, 5)])));
        assert_eq!(symbols.get(&range(2, 4, 8)), Some(&BTreeSet::new()));
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn test_unused_declaration_has_empty_reference_set() {
        let symbols = table("unused.c", "int unused;\n");

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols.get(&range(1, 4, 10)), Some(&BTreeSet::new()));
    }

    #[test]
    fn test_inactive_branch_declarations_are_collected() {
        let source = "#if 0\n\
                      int hidden;\n\
                      int peek = hidden;\n\
                      #endif\n\
                      int shown;\n";

        let symbols = table("inactive.c", source);
        assert_eq!(symbols.get(&range(2, 4, 10)), Some(&refs([range(3, 11, 17)])));
        assert_eq!(symbols.get(&range(3, 4, 8)), Some(&BTreeSet::new()));
        assert!(symbols.contains(&range(5, 4, 9)));

        let options = AnalysisOptions {
            table: TableOptions {
                collect: CollectOptions {
                    include_inactive: false,
                },
                ..TableOptions::default()
            },
            ..AnalysisOptions::default()
        };
        let active_only = table_with("inactive.c", source, options);
        assert!(!active_only.contains(&range(2, 4, 10)));
        assert!(!active_only.contains(&range(3, 4, 8)));
        assert!(active_only.contains(&range(5, 4, 9)));
    }

    #[test]
    fn test_shadowed_names_have_distinct_entries() {
        let symbols = table(
            "shadow.cpp",
            "int value = 1;\n\
             int main() {\n    value = 2;\n    {\n        int value = 3;\n        value = 4;\n    }\n    return value;\n}\n",
        );

        let outer = symbols.get(&range(1, 4, 9)).unwrap();
        let inner = symbols.get(&range(5, 12, 17)).unwrap();
        assert_eq!(outer, &refs([range(3, 4, 9), range(8, 11, 16)]));
        assert_eq!(inner, &refs([range(6, 8, 13)]));
        assert!(outer.is_disjoint(inner));
    }

    #[test]
    fn test_class_members_and_out_of_line_definition() {
        let symbols = table(
            "counter.cpp",
            "class Counter {\n\
             public:\n    void bump();\n    int count;\n\
             };\n\
             void Counter::bump() { count++; }\n",
        );

        assert!(symbols
            .get(&range(1, 6, 13))
            .unwrap()
            .contains(&range(6, 5, 12)));
        assert_eq!(symbols.get(&range(4, 8, 13)), Some(&refs([range(6, 23, 28)])));

        // declaration and definition are one symbol
        assert_eq!(symbols.get(&range(3, 9, 13)), Some(&BTreeSet::new()));
        assert_eq!(symbols.get(&range(6, 14, 18)), Some(&BTreeSet::new()));
    }

    #[test]
    fn test_function_calls_across_forward_declaration() {
        let symbols = table(
            "calls.c",
            "int twice(int n);\n\
             int main(void) { return twice(2); }\n\
             int twice(int n) { return n + n; }\n",
        );

        let call = refs([range(2, 24, 29)]);
        assert_eq!(symbols.get(&range(1, 4, 9)), Some(&call));
        assert_eq!(symbols.get(&range(3, 4, 9)), Some(&call));

        // each parameter list declares its own n
        assert_eq!(symbols.get(&range(1, 14, 15)), Some(&BTreeSet::new()));
        assert_eq!(
            symbols.get(&range(3, 14, 15)),
            Some(&refs([range(3, 26, 27), range(3, 30, 31)]))
        );
    }

    #[test]
    fn test_namespace_qualified_uses() {
        let symbols = table(
            "ns.cpp",
            "namespace geo {\nint area(int w, int h);\n}\n\
             int total = geo::area(2, 3);\n",
        );

        assert_eq!(symbols.get(&range(1, 10, 13)), Some(&refs([range(4, 12, 15)])));
        assert_eq!(symbols.get(&range(2, 4, 8)), Some(&refs([range(4, 17, 21)])));
    }

    #[test]
    fn test_macro_references() {
        let symbols = table(
            "macro.c",
            "#define LIMIT 10\n\
             int cap = LIMIT;\n\
             #undef LIMIT\n",
        );

        let limit = symbols.get(&range(1, 8, 13)).unwrap();
        assert!(limit.contains(&range(2, 10, 15)));
    }

    #[test]
    fn test_struct_field_access() {
        let symbols = table(
            "point.c",
            "struct point { int x; int y; };\n\
             int sum(struct point *p) { return p->x + p->y; }\n",
        );

        assert_eq!(symbols.get(&range(1, 19, 20)), Some(&refs([range(2, 37, 38)])));
        assert_eq!(symbols.get(&range(1, 26, 27)), Some(&refs([range(2, 44, 45)])));
        assert!(symbols
            .get(&range(1, 7, 12))
            .unwrap()
            .contains(&range(2, 15, 20)));
    }

    #[test]
    fn test_struct_tag_and_function_of_same_name() {
        let symbols = table(
            "stat.c",
            "struct stat { int size; };\n\
             int stat(const char *p, struct stat *b);\n\
             int main(void) { struct stat b; return stat(\"x\", &b); }\n",
        );

        assert_eq!(
            symbols.get(&range(1, 7, 11)),
            Some(&refs([range(2, 31, 35), range(3, 24, 28)]))
        );
        assert_eq!(symbols.get(&range(2, 4, 8)), Some(&refs([range(3, 39, 43)])));
    }

    #[test]
    fn test_variable_named_after_its_struct_tag() {
        let symbols = table(
            "tagvar.c",
            "struct s { int v; };\n\
             struct s s;\n\
             int get(void) { return s.v; }\n",
        );

        assert_eq!(symbols.get(&range(1, 7, 8)), Some(&refs([range(2, 7, 8)])));
        assert_eq!(symbols.get(&range(2, 9, 10)), Some(&refs([range(3, 23, 24)])));
        assert_eq!(symbols.get(&range(1, 15, 16)), Some(&refs([range(3, 25, 26)])));
    }

    #[test]
    fn test_self_reference_policy_with_declaration_uses() {
        let source = "int x;\nint y = x;\n";
        let mut options = AnalysisOptions {
            declarations_as_references: true,
            ..AnalysisOptions::default()
        };

        let preserved = table_with("self.c", source, options);
        assert_eq!(
            preserved.get(&range(1, 4, 5)),
            Some(&refs([range(1, 4, 5), range(2, 8, 9)]))
        );

        options.table.self_references = SelfReferencePolicy::Exclude;
        let excluded = table_with("self.c", source, options);
        assert_eq!(excluded.get(&range(1, 4, 5)), Some(&refs([range(2, 8, 9)])));
    }

    #[test]
    fn test_columns_count_characters() {
        let symbols = table("wide.c", "/* héllo */ int x;\nint y = x;\n");

        assert_eq!(symbols.get(&range(1, 16, 17)), Some(&refs([range(2, 8, 9)])));
    }

    #[test]
    fn test_crlf_line_endings() {
        let symbols = table("crlf.c", "int x;\r\nint y = x;\r\n");

        assert_eq!(symbols.get(&range(1, 4, 5)), Some(&refs([range(2, 8, 9)])));
    }

    #[test]
    fn test_recovered_tree_still_indexes() {
        let symbols = table("broken.c", "int ok;\nint bad = ;\nint later = ok;\n");

        assert!(symbols
            .get(&range(1, 4, 6))
            .unwrap()
            .contains(&range(3, 12, 14)));
    }
}
