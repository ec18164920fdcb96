//! Course Registry - stage and commit volunteer course completions
//!
//! This library loads the volunteer registry workbook (two category sheets,
//! HONORARIOS and ACTIVOS), lets a session stage completion dates per
//! volunteer and course, and commits them back into the workbook.
//!
//! # Features
//!
//! - Case-insensitive resolution of the two category sheets
//! - Positional layout for unnamed name columns and the course-label row
//! - Pending edit ledger with remove/clear and an explicit commit
//! - Excel import/export
//! - HTTP API with isolated per-upload sessions
//!
//! # Example
//!
//! ```no_run
//! use course_registry::config::RegistryConfig;
//! use course_registry::core::Session;
//! use course_registry::excel::{ExcelImporter, XlsxFileSink};
//! use course_registry::types::{parse_date, Category};
//! use std::path::Path;
//!
//! let tables = ExcelImporter::new(Path::new("registro.xlsx")).import()?;
//! let mut session = Session::open(tables, &RegistryConfig::default())?;
//!
//! let date = parse_date("2024-03-01")?;
//! session.add_edit(Category::Activos, "Ana Lopez Diaz", "Primeros Auxilios", date)?;
//! session.commit(&XlsxFileSink::new("registro.xlsx"))?;
//! # Ok::<(), course_registry::error::RegistryError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod types;

// Re-export commonly used types
pub use error::{RegistryError, RegistryResult};
pub use types::{Category, Cell, ColumnRef, PendingEdit, Table};
