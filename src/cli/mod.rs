//! CLI command handlers

pub mod commands;

pub use commands::{apply, courses, parse_edit_arg, preview, sheets, volunteers, EditBatch, EditRequest};
