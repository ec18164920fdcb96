//! Commit engine: materialize the ledger into the category tables

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::ledger::EditLedger;
use crate::core::resolver::ResolvedSheets;
use crate::core::schema::SchemaAdapter;
use crate::core::volunteers::rows_for_identity;
use crate::error::{RegistryError, RegistryResult};
use crate::types::{Cell, PendingEdit};

/// Destination the committed tables are serialized to
pub trait WorkbookSink {
    fn write_sheets(&self, sheets: &ResolvedSheets) -> RegistryResult<()>;
}

/// What happens to the live tables when serialization fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Mutate the live tables, then serialize. A failed write leaves the
    /// applied mutations in place.
    #[default]
    InPlace,
    /// Mutate and serialize a copy; the live tables are replaced only after
    /// the write succeeds.
    CopyOnWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    IdentityNotFound,
    ColumnNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEdit {
    pub position: usize,
    pub identity: String,
    pub column: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Edits that matched at least one row
    pub applied: usize,
    pub cells_written: usize,
    pub skipped: Vec<SkippedEdit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    NothingToCommit,
    Committed(CommitReport),
}

/// Write every ledger record into its category table, in ledger order.
///
/// The date goes into each row whose identity matches. Records with no
/// matching row, or whose column is gone, are skipped and reported.
pub fn apply_edits<'a, I>(
    edits: I,
    sheets: &mut ResolvedSheets,
    adapter: &dyn SchemaAdapter,
) -> CommitReport
where
    I: IntoIterator<Item = &'a PendingEdit>,
{
    let mut report = CommitReport::default();

    for (position, edit) in edits.into_iter().enumerate() {
        let table = sheets.table_mut(edit.category);

        let Some(col) = table.column_index(&edit.course_column) else {
            warn!(
                category = %edit.category,
                "skipping edit {}: column {} not found",
                position,
                edit.course_column
            );
            report.skipped.push(skipped(position, edit, SkipReason::ColumnNotFound));
            continue;
        };

        let rows = rows_for_identity(table, adapter, &edit.identity);
        if rows.is_empty() {
            warn!(
                category = %edit.category,
                "skipping edit {}: volunteer '{}' not found",
                position,
                edit.identity
            );
            report.skipped.push(skipped(position, edit, SkipReason::IdentityNotFound));
            continue;
        }

        for row in rows {
            if table.set_cell(row, col, Cell::Date(edit.date)) {
                report.cells_written += 1;
            }
        }
        report.applied += 1;
    }

    report
}

fn skipped(position: usize, edit: &PendingEdit, reason: SkipReason) -> SkippedEdit {
    SkippedEdit {
        position,
        identity: edit.identity.clone(),
        column: edit.course_column.to_string(),
        reason,
    }
}

/// Apply the ledger, serialize both tables once, then clear the ledger.
///
/// An empty ledger touches nothing and never reaches the sink. When the sink
/// fails the ledger is left as it was so the commit can be retried; whether
/// the live tables keep the applied edits depends on `policy`.
pub fn commit(
    ledger: &mut EditLedger,
    sheets: &mut ResolvedSheets,
    adapter: &dyn SchemaAdapter,
    sink: &dyn WorkbookSink,
    policy: CommitPolicy,
) -> RegistryResult<CommitOutcome> {
    if ledger.is_empty() {
        return Ok(CommitOutcome::NothingToCommit);
    }

    let report = match policy {
        CommitPolicy::InPlace => {
            let report = apply_edits(ledger.iter(), sheets, adapter);
            write(sink, sheets)?;
            report
        }
        CommitPolicy::CopyOnWrite => {
            let mut staged = sheets.clone();
            let report = apply_edits(ledger.iter(), &mut staged, adapter);
            write(sink, &staged)?;
            *sheets = staged;
            report
        }
    };

    info!(
        "committed {} edits ({} cells, {} skipped)",
        report.applied,
        report.cells_written,
        report.skipped.len()
    );
    ledger.clear();
    Ok(CommitOutcome::Committed(report))
}

fn write(sink: &dyn WorkbookSink, sheets: &ResolvedSheets) -> RegistryResult<()> {
    sink.write_sheets(sheets).map_err(|e| match e {
        RegistryError::SerializationFailure(_) => e,
        other => RegistryError::SerializationFailure(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::PositionalLayout;
    use crate::types::{Category, ColumnRef, Table};
    use chrono::NaiveDate;
    use std::cell::Cell as Counter;

    struct CountingSink {
        calls: Counter<usize>,
        fail: bool,
    }

    impl CountingSink {
        fn new(fail: bool) -> Self {
            Self {
                calls: Counter::new(0),
                fail,
            }
        }
    }

    impl WorkbookSink for CountingSink {
        fn write_sheets(&self, _sheets: &ResolvedSheets) -> RegistryResult<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(RegistryError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )))
            } else {
                Ok(())
            }
        }
    }

    fn sheets() -> ResolvedSheets {
        let layout = PositionalLayout::default();
        let mut tables = Vec::new();
        for category in Category::ALL {
            let mut table = Table::new(category.sheet_name(), &["N", "", "", "", "", "", "Curso"]);
            layout.normalize(&mut table);
            table.push_row(vec![
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::from("Ana"),
                Cell::from("Lopez"),
                Cell::from("Diaz"),
            ]);
            tables.push(table);
        }
        let mut tables = tables.into_iter();
        ResolvedSheets {
            honorarios: tables.next().unwrap(),
            activos: tables.next().unwrap(),
            found_sheets: vec![],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_empty_ledger_is_noop() {
        let mut sheets = sheets();
        let before = sheets.clone();
        let sink = CountingSink::new(false);
        let outcome = commit(
            &mut EditLedger::new(),
            &mut sheets,
            &PositionalLayout::default(),
            &sink,
            CommitPolicy::InPlace,
        )
        .unwrap();
        assert_eq!(outcome, CommitOutcome::NothingToCommit);
        assert_eq!(sink.calls.get(), 0);
        assert_eq!(sheets, before);
    }

    #[test]
    fn test_edit_lands_in_owning_table_only() {
        let mut sheets = sheets();
        let mut ledger = EditLedger::new();
        ledger.append(PendingEdit::new(
            Category::Activos,
            "Ana Lopez Diaz",
            ColumnRef::from("Curso"),
            date(),
        ));
        let sink = CountingSink::new(false);
        commit(
            &mut ledger,
            &mut sheets,
            &PositionalLayout::default(),
            &sink,
            CommitPolicy::InPlace,
        )
        .unwrap();
        assert_eq!(sheets.activos.cell(0, 6), Some(&Cell::Date(date())));
        assert_eq!(sheets.honorarios.cell(0, 6), Some(&Cell::Empty));
        assert_eq!(sink.calls.get(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unknown_identity_and_column_are_skipped() {
        let mut sheets = sheets();
        let edits = vec![
            PendingEdit::new(Category::Honorarios, "Nadie", ColumnRef::from("Curso"), date()),
            PendingEdit::new(Category::Honorarios, "Ana Lopez Diaz", ColumnRef::from("X"), date()),
        ];
        let report = apply_edits(&edits, &mut sheets, &PositionalLayout::default());
        assert_eq!(report.applied, 0);
        assert_eq!(report.cells_written, 0);
        assert_eq!(report.skipped[0].reason, SkipReason::IdentityNotFound);
        assert_eq!(report.skipped[1].reason, SkipReason::ColumnNotFound);
        assert_eq!(report.skipped[1].position, 1);
    }

    #[test]
    fn test_copy_on_write_keeps_live_tables_on_failure() {
        let mut sheets = sheets();
        let before = sheets.clone();
        let mut ledger = EditLedger::new();
        ledger.append(PendingEdit::new(
            Category::Honorarios,
            "Ana Lopez Diaz",
            ColumnRef::from("Curso"),
            date(),
        ));
        let err = commit(
            &mut ledger,
            &mut sheets,
            &PositionalLayout::default(),
            &CountingSink::new(true),
            CommitPolicy::CopyOnWrite,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::SerializationFailure(_)));
        assert_eq!(sheets, before);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_copy_on_write_swaps_in_on_success() {
        let mut sheets = sheets();
        let mut ledger = EditLedger::new();
        ledger.append(PendingEdit::new(
            Category::Honorarios,
            "Ana Lopez Diaz",
            ColumnRef::from("Curso"),
            date(),
        ));
        commit(
            &mut ledger,
            &mut sheets,
            &PositionalLayout::default(),
            &CountingSink::new(false),
            CommitPolicy::CopyOnWrite,
        )
        .unwrap();
        assert_eq!(sheets.honorarios.cell(0, 6), Some(&Cell::Date(date())));
        assert!(ledger.is_empty());
    }
}
