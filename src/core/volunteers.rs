//! Selectable volunteers of a category table

use std::collections::BTreeSet;

use crate::core::schema::SchemaAdapter;
use crate::types::Table;

/// Deduplicated identities of `table` in ascending order.
///
/// Rows with an empty identity and the header sentinel row are left out.
/// Derived from the current table contents, so callers recompute after any
/// mutation.
pub fn volunteer_index(table: &Table, adapter: &dyn SchemaAdapter) -> Vec<String> {
    let sentinel = adapter.sentinel();
    let identities: BTreeSet<String> = (0..table.height())
        .map(|row| adapter.identity(table, row))
        .filter(|identity| !identity.is_empty() && identity != sentinel)
        .collect();
    identities.into_iter().collect()
}

/// Data rows whose identity matches exactly
pub fn rows_for_identity(table: &Table, adapter: &dyn SchemaAdapter, identity: &str) -> Vec<usize> {
    (0..table.height())
        .filter(|&row| adapter.identity(table, row) == identity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{PositionalLayout, HEADER_SENTINEL};
    use crate::types::Cell;
    use pretty_assertions::assert_eq;

    fn table_with_names(names: &[(&str, &str, &str)]) -> Table {
        let mut table = Table::new("ACTIVOS ", &["N", "", "", "", "", ""]);
        PositionalLayout::default().normalize(&mut table);
        for (first, second, third) in names {
            table.push_row(vec![
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::from(*first),
                Cell::from(*second),
                Cell::from(*third),
            ]);
        }
        table
    }

    #[test]
    fn test_index_sorted_and_deduplicated() {
        let table = table_with_names(&[
            ("Pedro", "Soto", "Vera"),
            ("Ana", "Lopez", "Diaz"),
            ("Pedro", "Soto", "Vera"),
        ]);
        let index = volunteer_index(&table, &PositionalLayout::default());
        assert_eq!(index, vec!["Ana Lopez Diaz", "Pedro Soto Vera"]);
    }

    #[test]
    fn test_index_skips_sentinel_and_empty_rows() {
        let table = table_with_names(&[
            ("Nombre", "Primer Apellido", "Segundo Apellido"),
            ("", "", ""),
            ("  ", "", ""),
            ("Luis", "", ""),
        ]);
        let index = volunteer_index(&table, &PositionalLayout::default());
        assert_eq!(index, vec!["Luis"]);
        assert!(!index.iter().any(|v| v == HEADER_SENTINEL));
    }

    #[test]
    fn test_index_of_empty_table() {
        let table = table_with_names(&[]);
        assert!(volunteer_index(&table, &PositionalLayout::default()).is_empty());
    }

    #[test]
    fn test_rows_for_identity_finds_duplicates() {
        let table = table_with_names(&[
            ("Ana", "Lopez", "Diaz"),
            ("Luis", "", ""),
            ("Ana", "Lopez", "Diaz"),
        ]);
        let rows = rows_for_identity(&table, &PositionalLayout::default(), "Ana Lopez Diaz");
        assert_eq!(rows, vec![0, 2]);
        assert!(rows_for_identity(&table, &PositionalLayout::default(), "ana lopez diaz").is_empty());
    }
}
