//! Excel exporter implementation

use crate::core::commit::WorkbookSink;
use crate::core::resolver::ResolvedSheets;
use crate::error::{RegistryError, RegistryResult};
use crate::types::{Category, Cell, Table};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes both category tables back into a registry workbook
pub struct ExcelExporter<'a> {
    sheets: &'a ResolvedSheets,
}

impl<'a> ExcelExporter<'a> {
    /// Create a new Excel exporter
    pub fn new(sheets: &'a ResolvedSheets) -> Self {
        Self { sheets }
    }

    /// Export to an .xlsx file.
    ///
    /// The workbook is written to a temp file next to `output_path` and moved
    /// over it, so a failed save leaves the previous file untouched.
    pub fn export(&self, output_path: &Path) -> RegistryResult<()> {
        let bytes = self.to_buffer()?;
        let save_failed = |e: std::io::Error| {
            RegistryError::SerializationFailure(format!(
                "Failed to save Excel file {}: {}",
                output_path.display(),
                e
            ))
        };

        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(save_failed)?;
        staged.write_all(&bytes).map_err(save_failed)?;
        staged.as_file().sync_all().map_err(save_failed)?;
        staged
            .persist(output_path)
            .map_err(|e| save_failed(e.error))?;
        Ok(())
    }

    /// Export to an in-memory .xlsx buffer
    pub fn to_buffer(&self) -> RegistryResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook.save_to_buffer().map_err(|e| {
            RegistryError::SerializationFailure(format!("Failed to build Excel file: {}", e))
        })
    }

    fn build(&self) -> RegistryResult<Workbook> {
        let mut workbook = Workbook::new();
        // Sheet names always use the exact literals, whatever casing came in
        for category in Category::ALL {
            self.export_table(&mut workbook, category.sheet_name(), self.sheets.table(category))?;
        }
        Ok(workbook)
    }

    /// Export a single table to a worksheet
    fn export_table(
        &self,
        workbook: &mut Workbook,
        sheet_name: &str,
        table: &Table,
    ) -> RegistryResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name).map_err(|e| {
            RegistryError::SerializationFailure(format!("Failed to set worksheet name: {}", e))
        })?;

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

        // Header row; placeholder names go back out as blank cells
        for (col_idx, header) in table.headers().iter().enumerate() {
            if header.placeholder {
                continue;
            }
            worksheet
                .write_string(0, col_idx as u16, &header.name)
                .map_err(|e| {
                    RegistryError::SerializationFailure(format!("Failed to write header: {}", e))
                })?;
        }

        // Data rows start at sheet row 1
        for (row_idx, row) in table.rows().iter().enumerate() {
            let excel_row = (row_idx + 1) as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                write_cell(
                    worksheet,
                    excel_row,
                    col_idx as u16,
                    cell,
                    &date_format,
                    &datetime_format,
                )?;
            }
        }

        Ok(())
    }
}

/// Write a single cell value based on its type
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    date_format: &Format,
    datetime_format: &Format,
) -> RegistryResult<()> {
    let result = match cell {
        Cell::Empty => return Ok(()),
        Cell::Text(text) => worksheet.write_string(row, col, text).map(|_| ()),
        Cell::Number(n) => worksheet.write_number(row, col, *n).map(|_| ()),
        Cell::Bool(b) => worksheet.write_boolean(row, col, *b).map(|_| ()),
        Cell::Date(date) => {
            let value = excel_date(date)?;
            worksheet
                .write_datetime_with_format(row, col, &value, date_format)
                .map(|_| ())
        }
        Cell::DateTime(dt) => {
            let value = excel_datetime(dt)?;
            worksheet
                .write_datetime_with_format(row, col, &value, datetime_format)
                .map(|_| ())
        }
    };
    result.map_err(|e| {
        RegistryError::SerializationFailure(format!(
            "Failed to write cell ({}, {}): {}",
            row, col, e
        ))
    })
}

fn excel_date(date: &NaiveDate) -> RegistryResult<ExcelDateTime> {
    ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
        .map_err(|e| RegistryError::SerializationFailure(format!("Invalid date {}: {}", date, e)))
}

fn excel_datetime(dt: &NaiveDateTime) -> RegistryResult<ExcelDateTime> {
    excel_date(&dt.date())?
        .and_hms(dt.hour() as u16, dt.minute() as u8, dt.second())
        .map_err(|e| {
            RegistryError::SerializationFailure(format!("Invalid datetime {}: {}", dt, e))
        })
}

/// Commit sink that saves the workbook to a file
#[derive(Debug, Clone)]
pub struct XlsxFileSink {
    path: PathBuf,
}

impl XlsxFileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkbookSink for XlsxFileSink {
    fn write_sheets(&self, sheets: &ResolvedSheets) -> RegistryResult<()> {
        ExcelExporter::new(sheets).export(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheets() -> ResolvedSheets {
        ResolvedSheets {
            honorarios: Table::new("honorarios ", &["N"]),
            activos: Table::new("ACTIVOS ", &["N"]),
            found_sheets: vec![],
        }
    }

    #[test]
    fn test_excel_date_conversion() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(excel_date(&date).is_ok());
    }

    #[test]
    fn test_to_buffer_produces_zip() {
        let sheets = sheets();
        let bytes = ExcelExporter::new(&sheets).to_buffer().unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_sink_reports_unwritable_path() {
        let sink = XlsxFileSink::new("/nonexistent-dir/out.xlsx");
        let err = sink.write_sheets(&sheets()).unwrap_err();
        assert!(matches!(err, RegistryError::SerializationFailure(_)));
    }

    #[test]
    fn test_failed_save_keeps_previous_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registro.xlsx");
        XlsxFileSink::new(&path).write_sheets(&sheets()).unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut broken = sheets();
        broken
            .activos
            .push_row(vec![Cell::Date(NaiveDate::from_ymd_opt(1800, 1, 1).unwrap())]);
        let err = XlsxFileSink::new(&path).write_sheets(&broken).unwrap_err();
        assert!(matches!(err, RegistryError::SerializationFailure(_)));

        assert_eq!(std::fs::read(&path).unwrap(), before);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registro.xlsx");
        std::fs::write(&path, b"old contents").unwrap();

        XlsxFileSink::new(&path).write_sheets(&sheets()).unwrap();

        assert_eq!(&std::fs::read(&path).unwrap()[..2], b"PK");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("registro.xlsx")]);
    }
}
