//! Course catalog: course labels stored as data in the label row
//!
//! Course names are not column headers. They sit in the label row (data row
//! 0 by default) from the course offset onward, and the column they sit in
//! is where completion dates are written.

use tracing::warn;

use crate::core::schema::SchemaAdapter;
use crate::types::{ColumnRef, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub label: String,
    pub column: ColumnRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseCatalog {
    /// Non-blank label cells in column order (duplicates kept)
    labels: Vec<String>,
    /// Column of each entry in `labels`
    columns: Vec<ColumnRef>,
    /// label → column, one entry per distinct label
    mapping: Vec<Course>,
    collisions: usize,
}

impl CourseCatalog {
    /// Build the catalog from the adapter's label row.
    ///
    /// Duplicate labels: the mapping keeps the last column seen for a label,
    /// at the position where the label first appeared. Each such collision
    /// is logged and counted.
    pub fn from_table(table: &Table, adapter: &dyn SchemaAdapter) -> Self {
        let mut catalog = CourseCatalog::default();
        let row = adapter.label_row();
        if row >= table.height() {
            return catalog;
        }

        for col in adapter.course_offset()..table.width() {
            let Some(cell) = table.cell(row, col) else {
                continue;
            };
            if cell.is_blank() {
                continue;
            }
            let Some(name) = table.column_name(col) else {
                continue;
            };
            catalog.labels.push(cell.display_text());
            catalog.columns.push(ColumnRef::new(name));
        }

        for (label, column) in catalog.labels.iter().zip(catalog.columns.iter()) {
            match catalog.mapping.iter_mut().find(|c| &c.label == label) {
                Some(existing) => {
                    warn!(
                        sheet = %table.name,
                        "course label '{}' repeated: column {} replaces {}",
                        label,
                        column,
                        existing.column
                    );
                    existing.column = column.clone();
                    catalog.collisions += 1;
                }
                None => catalog.mapping.push(Course {
                    label: label.clone(),
                    column: column.clone(),
                }),
            }
        }

        catalog
    }

    /// Course labels in column order, as offered for selection
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Columns parallel to [`labels`](Self::labels)
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// One course per distinct label
    pub fn courses(&self) -> &[Course] {
        &self.mapping
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Number of label collisions seen while building the mapping
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Column a course label maps to
    pub fn column_for(&self, label: &str) -> Option<&ColumnRef> {
        self.mapping
            .iter()
            .find(|c| c.label == label)
            .map(|c| &c.column)
    }

    /// First label mapped to `column`
    pub fn label_for(&self, column: &ColumnRef) -> Option<&str> {
        self.mapping
            .iter()
            .find(|c| &c.column == column)
            .map(|c| c.label.as_str())
    }

    /// Label for display, falling back to the raw column name
    pub fn display_label(&self, column: &ColumnRef) -> String {
        self.label_for(column)
            .map(str::to_string)
            .unwrap_or_else(|| column.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::PositionalLayout;
    use crate::types::Cell;
    use pretty_assertions::assert_eq;

    fn headers(width: usize) -> Vec<String> {
        (0..width).map(|i| format!("C{}", i + 1)).collect()
    }

    fn table_with_labels(labels: &[(usize, &str)], width: usize) -> Table {
        let mut table = Table::new("HONORARIOS ", &headers(width));
        let mut row = vec![Cell::Empty; width];
        for (col, label) in labels {
            row[*col] = Cell::from(*label);
        }
        table.push_row(row);
        table
    }

    #[test]
    fn test_labels_start_at_offset() {
        let table = table_with_labels(
            &[(2, "Admin"), (15, "Primeros Auxilios"), (17, "Rescate")],
            18,
        );
        let catalog = CourseCatalog::from_table(&table, &PositionalLayout::default());
        assert_eq!(catalog.labels(), &["Primeros Auxilios", "Rescate"]);
        assert_eq!(
            catalog.columns(),
            &[ColumnRef::from("C16"), ColumnRef::from("C18")]
        );
        assert_eq!(catalog.collisions(), 0);
    }

    #[test]
    fn test_forward_and_reverse_round_trip() {
        let table = table_with_labels(&[(15, "Primeros Auxilios"), (16, "Rescate")], 17);
        let catalog = CourseCatalog::from_table(&table, &PositionalLayout::default());
        for label in catalog.labels() {
            let column = catalog.column_for(label).unwrap();
            assert_eq!(catalog.label_for(column), Some(label.as_str()));
        }
    }

    #[test]
    fn test_duplicate_label_last_column_wins() {
        let table = table_with_labels(&[(15, "Rescate"), (16, "Hazmat"), (17, "Rescate")], 18);
        let catalog = CourseCatalog::from_table(&table, &PositionalLayout::default());
        assert_eq!(catalog.labels().len(), 3);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.collisions(), 1);
        assert_eq!(catalog.column_for("Rescate"), Some(&ColumnRef::from("C18")));
        assert_eq!(catalog.label_for(&ColumnRef::from("C17")), Some("Hazmat"));
        // The overwritten column no longer maps back to any label
        assert_eq!(catalog.label_for(&ColumnRef::from("C16")), None);
        assert_eq!(catalog.courses()[0].label, "Rescate");
    }

    #[test]
    fn test_numeric_label_uses_display_text() {
        let mut table = Table::new("ACTIVOS ", &headers(16));
        let mut row = vec![Cell::Empty; 16];
        row[15] = Cell::Number(2024.0);
        table.push_row(row);
        let catalog = CourseCatalog::from_table(&table, &PositionalLayout::default());
        assert_eq!(catalog.labels(), &["2024"]);
    }

    #[test]
    fn test_table_without_rows_has_empty_catalog() {
        let table = Table::new("ACTIVOS ", &headers(20));
        let catalog = CourseCatalog::from_table(&table, &PositionalLayout::default());
        assert!(catalog.is_empty());
        assert!(catalog.labels().is_empty());
    }

    #[test]
    fn test_display_label_falls_back_to_column() {
        let catalog = CourseCatalog::default();
        assert_eq!(catalog.display_label(&ColumnRef::from("C40")), "C40");
    }
}
