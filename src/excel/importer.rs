//! Excel importer implementation - Excel (.xlsx) → tables

use crate::error::{RegistryError, RegistryResult};
use crate::types::{Cell, Table};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::debug;

/// Excel importer for reading every worksheet of a .xlsx file
pub struct ExcelImporter {
    path: std::path::PathBuf,
}

impl ExcelImporter {
    /// Create a new Excel importer
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Import every worksheet, in workbook order
    pub fn import(&self) -> RegistryResult<Vec<Table>> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .map_err(|e| RegistryError::Import(format!("Failed to open Excel file: {}", e)))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut tables = Vec::with_capacity(sheet_names.len());

        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                RegistryError::Import(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;
            tables.push(self.process_sheet(&sheet_name, &range));
        }

        Ok(tables)
    }

    /// Convert one worksheet. Row 0 of the sheet is the header row.
    ///
    /// calamine ranges start at the first used cell, so cells are read by
    /// absolute position to keep column indexes anchored at A1.
    fn process_sheet(&self, sheet_name: &str, range: &Range<Data>) -> Table {
        let Some((last_row, last_col)) = range.end() else {
            // Empty sheet
            return Table::new(sheet_name, &[] as &[&str]);
        };

        let cell_at = |row: u32, col: u32| -> Cell {
            range
                .get_value((row, col))
                .map(convert_cell)
                .unwrap_or_default()
        };

        let headers: Vec<String> = (0..=last_col)
            .map(|col| cell_at(0, col).display_text())
            .collect();
        let mut table = Table::new(sheet_name, &headers);

        for row in 1..=last_row {
            let cells: Vec<Cell> = (0..=last_col).map(|col| cell_at(row, col)).collect();
            table.push_row(cells);
        }

        debug!(
            sheet = sheet_name,
            "imported {} rows x {} columns",
            table.height(),
            table.width()
        );
        table
    }
}

/// Convert a calamine cell to a table cell
pub(crate) fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => serial_to_cell(dt.as_f64()),
        Data::DateTimeIso(s) => parse_iso_cell(s),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}

/// Excel serial date (1900 system) → Date, or DateTime when there is a time part
fn serial_to_cell(serial: f64) -> Cell {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return Cell::Number(serial);
    };
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let Some(date) = epoch.checked_add_signed(Duration::days(days as i64)) else {
        return Cell::Number(serial);
    };

    if seconds == 0 {
        Cell::Date(date)
    } else {
        match date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.checked_add_signed(Duration::seconds(seconds)))
        {
            Some(dt) => Cell::DateTime(dt),
            None => Cell::Date(date),
        }
    }
}

fn parse_iso_cell(value: &str) -> Cell {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Cell::Date(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        if dt.time() == chrono::NaiveTime::MIN {
            return Cell::Date(dt.date());
        }
        return Cell::DateTime(dt);
    }
    Cell::Text(value.to_string())
}
