//! Sheet layout adapter
//!
//! Everything that depends on where things sit in the registry sheets goes
//! through [`SchemaAdapter`]: which anonymous columns hold the name fields,
//! which data row carries the course labels and where course columns begin.

use serde::{Deserialize, Serialize};

use crate::types::{ColumnRef, Table};

/// Stray header-like row found in the data region of registry sheets
pub const HEADER_SENTINEL: &str = "Nombre Primer Apellido Segundo Apellido";

/// Columns before this index hold identity/admin fields, never courses
pub const DEFAULT_COURSE_OFFSET: usize = 15;

pub trait SchemaAdapter: Send + Sync {
    /// Give the name columns their semantic names
    fn normalize(&self, table: &mut Table);

    /// Name columns in concatenation order (first name, surnames)
    fn name_columns(&self) -> Vec<ColumnRef>;

    /// Data row holding the course labels
    fn label_row(&self) -> usize;

    /// First column that may hold a course
    fn course_offset(&self) -> usize;

    /// Identity value that marks a header artifact rather than a volunteer
    fn sentinel(&self) -> &str;

    /// Full name for `row`: name fields joined by single spaces, then trimmed.
    /// Missing columns or cells count as empty strings.
    fn identity(&self, table: &Table, row: usize) -> String {
        let parts: Vec<String> = self
            .name_columns()
            .iter()
            .map(|column| {
                table
                    .column_index(column)
                    .and_then(|col| table.cell(row, col))
                    .map(|cell| cell.display_text())
                    .unwrap_or_default()
            })
            .collect();
        parts.join(" ").trim().to_string()
    }
}

/// A name field bound to a zero-based column position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameColumn {
    pub position: usize,
    pub name: String,
}

impl NameColumn {
    fn new(position: usize, name: &str) -> Self {
        Self {
            position,
            name: name.to_string(),
        }
    }
}

/// Position-based layout of the registry workbook.
///
/// The raw sheets leave the name columns (zero-based 3, 4 and 5) without a
/// header, so they are renamed by position. If the source format stops
/// following that convention this layout must be swapped, not patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionalLayout {
    pub name_columns: Vec<NameColumn>,
    pub label_row: usize,
    pub course_offset: usize,
    pub sentinel: String,
}

impl Default for PositionalLayout {
    fn default() -> Self {
        Self {
            name_columns: vec![
                NameColumn::new(3, "Nombre"),
                NameColumn::new(4, "Primer Apellido"),
                NameColumn::new(5, "Segundo Apellido"),
            ],
            label_row: 0,
            course_offset: DEFAULT_COURSE_OFFSET,
            sentinel: HEADER_SENTINEL.to_string(),
        }
    }
}

impl SchemaAdapter for PositionalLayout {
    fn normalize(&self, table: &mut Table) {
        for column in &self.name_columns {
            if !table.rename_column(column.position, &column.name) {
                tracing::debug!(
                    sheet = %table.name,
                    position = column.position,
                    "sheet too narrow for name column '{}'",
                    column.name
                );
            }
        }
    }

    fn name_columns(&self) -> Vec<ColumnRef> {
        self.name_columns
            .iter()
            .map(|c| ColumnRef::new(c.name.clone()))
            .collect()
    }

    fn label_row(&self) -> usize {
        self.label_row
    }

    fn course_offset(&self) -> usize {
        self.course_offset
    }

    fn sentinel(&self) -> &str {
        &self.sentinel
    }
}
