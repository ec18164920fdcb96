//! Excel codec for the registry workbook
//!
//! - Import: .xlsx → named tables (calamine)
//! - Export: category tables → .xlsx (rust_xlsxwriter)

mod exporter;
mod importer;

pub use exporter::{ExcelExporter, XlsxFileSink};
pub use importer::ExcelImporter;

/// Suggested file name for the downloaded registry
pub const DOWNLOAD_FILE_NAME: &str = "Registro_Quinta_Cursos.xlsx";

/// MIME type of .xlsx downloads
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
