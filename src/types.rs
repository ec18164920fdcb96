use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::RegistryError;

//==============================================================================
// Cells
//==============================================================================

/// A single spreadsheet value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Empty cells and empty strings both count as missing data
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text used for name concatenation and course labels (blank → "")
    pub fn display_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Cell::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

//==============================================================================
// Columns
//==============================================================================

/// Reference to a table column by its (unique) header name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnRef(String);

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Column header as read from the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    /// Synthesized for a blank header cell; exported as a blank cell again
    pub placeholder: bool,
}

//==============================================================================
// Tables
//==============================================================================

/// One worksheet: a header row plus ordered data rows.
///
/// Row indexes count data rows only, so row 0 is the first row under the
/// headers. Column names are unique: blank headers become `Unnamed: {idx}`
/// and repeated headers get a `.{n}` suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    headers: Vec<Header>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, raw_headers: &[S]) -> Self {
        let mut headers: Vec<Header> = Vec::with_capacity(raw_headers.len());
        for (idx, raw) in raw_headers.iter().enumerate() {
            let raw = raw.as_ref();
            let header = if raw.is_empty() {
                Header {
                    name: format!("Unnamed: {}", idx),
                    placeholder: true,
                }
            } else {
                let mut name = raw.to_string();
                let mut suffix = 1;
                while headers.iter().any(|h| h.name == name) {
                    name = format!("{}.{}", raw, suffix);
                    suffix += 1;
                }
                Header {
                    name,
                    placeholder: false,
                }
            };
            headers.push(header);
        }

        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a data row, padded or cut to the header width
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.width(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|h| h.name.as_str())
    }

    pub fn column_name(&self, col: usize) -> Option<&str> {
        self.headers.get(col).map(|h| h.name.as_str())
    }

    pub fn column_index(&self, column: &ColumnRef) -> Option<usize> {
        self.headers.iter().position(|h| h.name == column.as_str())
    }

    /// Rename the column at `col`; returns false when the table is narrower.
    ///
    /// Another column already called `name` gets a `.{n}` suffix so names
    /// stay unique.
    pub fn rename_column(&mut self, col: usize, name: &str) -> bool {
        if col >= self.headers.len() {
            return false;
        }

        if let Some(other) = self
            .headers
            .iter()
            .enumerate()
            .position(|(idx, h)| idx != col && h.name == name)
        {
            let mut suffix = 1;
            let mut renamed = format!("{}.{}", name, suffix);
            while self.headers.iter().any(|h| h.name == renamed) {
                suffix += 1;
                renamed = format!("{}.{}", name, suffix);
            }
            warn!(
                sheet = %self.name,
                "column {} is already named '{}'; it becomes '{}'",
                other,
                name,
                renamed
            );
            self.headers[other].name = renamed;
        }

        let header = &mut self.headers[col];
        header.name = name.to_string();
        header.placeholder = false;
        true
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

//==============================================================================
// Categories and pending edits
//==============================================================================

/// The two volunteer groupings of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Honorarios,
    Activos,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Honorarios, Category::Activos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Honorarios => "HONORARIOS",
            Category::Activos => "ACTIVOS",
        }
    }

    /// Sheet name literal, trailing space included; downstream readers expect it
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Category::Honorarios => "HONORARIOS ",
            Category::Activos => "ACTIVOS ",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HONORARIOS" => Ok(Category::Honorarios),
            "ACTIVOS" => Ok(Category::Activos),
            _ => Err(RegistryError::UnknownCategory(s.to_string())),
        }
    }
}

/// A staged (uncommitted) course completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEdit {
    pub category: Category,
    pub identity: String,
    pub course_column: ColumnRef,
    pub date: NaiveDate,
}

impl PendingEdit {
    pub fn new(
        category: Category,
        identity: impl Into<String>,
        course_column: ColumnRef,
        date: NaiveDate,
    ) -> Self {
        Self {
            category,
            identity: identity.into(),
            course_column,
            date,
        }
    }
}

/// Years a workbook date cell can hold
pub const EXCEL_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

/// Reject dates the workbook writer cannot store
pub fn check_date(date: NaiveDate) -> Result<NaiveDate, RegistryError> {
    if EXCEL_YEARS.contains(&date.year()) {
        Ok(date)
    } else {
        Err(RegistryError::Date(format!(
            "'{}': year must be between {} and {}",
            date,
            EXCEL_YEARS.start(),
            EXCEL_YEARS.end()
        )))
    }
}

/// Parse a `YYYY-MM-DD` completion date
pub fn parse_date(value: &str) -> Result<NaiveDate, RegistryError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| RegistryError::Date(format!("'{}': {}", value, e)))?;
    check_date(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_headers_become_placeholders() {
        let table = Table::new("t", &["ID", "", "Name"]);
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["ID", "Unnamed: 1", "Name"]);
        assert!(table.headers()[1].placeholder);
        assert!(!table.headers()[0].placeholder);
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let table = Table::new("t", &["Curso", "Curso", "Curso"]);
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["Curso", "Curso.1", "Curso.2"]);
    }

    #[test]
    fn test_push_row_pads_to_width() {
        let mut table = Table::new("t", &["a", "b", "c"]);
        table.push_row(vec![Cell::from("x")]);
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.cell(0, 2), Some(&Cell::Empty));
    }

    #[test]
    fn test_set_cell_out_of_bounds() {
        let mut table = Table::new("t", &["a"]);
        table.push_row(vec![Cell::from("x")]);
        assert!(table.set_cell(0, 0, Cell::Bool(true)));
        assert!(!table.set_cell(1, 0, Cell::Bool(true)));
        assert!(!table.set_cell(0, 1, Cell::Bool(true)));
    }

    #[test]
    fn test_rename_clears_placeholder() {
        let mut table = Table::new("t", &["", "", "", "", ""]);
        assert!(table.rename_column(3, "Nombre"));
        assert!(!table.rename_column(9, "Nope"));
        assert_eq!(table.column_name(3), Some("Nombre"));
        assert!(!table.headers()[3].placeholder);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Empty.to_string(), "");
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Cell::Date(d).to_string(), "2024-03-01");
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("honorarios".parse::<Category>().unwrap(), Category::Honorarios);
        assert_eq!(" Activos ".parse::<Category>().unwrap(), Category::Activos);
        assert!("bomberos".parse::<Category>().is_err());
    }

    #[test]
    fn test_sheet_name_keeps_trailing_space() {
        assert_eq!(Category::Honorarios.sheet_name(), "HONORARIOS ");
        assert_eq!(Category::Activos.sheet_name(), "ACTIVOS ");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date("01/03/2024").is_err());
    }

    #[test]
    fn test_dates_outside_excel_range_rejected() {
        assert!(matches!(parse_date("1800-01-01"), Err(RegistryError::Date(_))));
        assert!(parse_date("1900-01-01").is_ok());
        assert!(parse_date("9999-12-31").is_ok());
        let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        assert!(matches!(check_date(far), Err(RegistryError::Date(_))));
    }

    #[test]
    fn test_rename_onto_existing_name_keeps_names_unique() {
        let mut table = Table::new("t", &["Nombre", "Nombre.1", "", "", ""]);
        assert!(table.rename_column(3, "Nombre"));
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(
            names,
            vec!["Nombre.2", "Nombre.1", "Unnamed: 2", "Nombre", "Unnamed: 4"]
        );
        assert_eq!(table.column_index(&ColumnRef::from("Nombre")), Some(3));
    }

    #[test]
    fn test_rename_to_own_name_is_stable() {
        let mut table = Table::new("t", &["A", "Nombre"]);
        assert!(table.rename_column(1, "Nombre"));
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["A", "Nombre"]);
    }
}
