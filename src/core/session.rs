//! Session context: the resolved tables plus the pending edit ledger
//!
//! All user actions (add, remove, clear, commit) go through a [`Session`],
//! so several independent sessions can live side by side.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::core::catalog::CourseCatalog;
use crate::core::commit::{self, CommitOutcome, CommitPolicy, WorkbookSink};
use crate::core::ledger::EditLedger;
use crate::core::resolver::{resolve_sheets, ResolvedSheets};
use crate::core::schema::SchemaAdapter;
use crate::core::volunteers::volunteer_index;
use crate::error::{RegistryError, RegistryResult};
use crate::types::{check_date, Category, PendingEdit, Table};

pub struct Session {
    sheets: ResolvedSheets,
    ledger: EditLedger,
    adapter: Arc<dyn SchemaAdapter>,
    policy: CommitPolicy,
}

impl Session {
    /// Resolve the category sheets of a freshly loaded workbook
    pub fn open(tables: Vec<Table>, config: &RegistryConfig) -> RegistryResult<Self> {
        let adapter = config.adapter();
        let sheets = resolve_sheets(tables, adapter.as_ref())?;
        Ok(Self::new(sheets, adapter, config.commit_policy))
    }

    pub fn new(
        sheets: ResolvedSheets,
        adapter: Arc<dyn SchemaAdapter>,
        policy: CommitPolicy,
    ) -> Self {
        Self {
            sheets,
            ledger: EditLedger::new(),
            adapter,
            policy,
        }
    }

    pub fn sheets(&self) -> &ResolvedSheets {
        &self.sheets
    }

    pub fn table(&self, category: Category) -> &Table {
        self.sheets.table(category)
    }

    pub fn found_sheets(&self) -> &[String] {
        &self.sheets.found_sheets
    }

    pub fn volunteers(&self, category: Category) -> Vec<String> {
        volunteer_index(self.sheets.table(category), self.adapter.as_ref())
    }

    pub fn catalog(&self, category: Category) -> CourseCatalog {
        CourseCatalog::from_table(self.sheets.table(category), self.adapter.as_ref())
    }

    /// Stage a completion date for a volunteer's course.
    ///
    /// The volunteer must be in the category's current index and the label
    /// in its course catalog. The date must fit in a workbook date cell.
    pub fn add_edit(
        &mut self,
        category: Category,
        identity: &str,
        course_label: &str,
        date: NaiveDate,
    ) -> RegistryResult<PendingEdit> {
        let date = check_date(date)?;
        if !self.volunteers(category).iter().any(|v| v == identity) {
            return Err(RegistryError::UnknownVolunteer {
                category: category.to_string(),
                identity: identity.to_string(),
            });
        }
        let catalog = self.catalog(category);
        let column = catalog
            .column_for(course_label)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownCourse {
                category: category.to_string(),
                label: course_label.to_string(),
            })?;

        debug!(category = %category, "staging {} -> {} on {}", identity, column, date);
        let edit = PendingEdit::new(category, identity, column, date);
        self.ledger.append(edit.clone());
        Ok(edit)
    }

    pub fn remove_edit(&mut self, position: usize) -> RegistryResult<PendingEdit> {
        self.ledger.remove_at(position)
    }

    pub fn clear_edits(&mut self) {
        self.ledger.clear();
    }

    pub fn pending_edits(&self) -> &EditLedger {
        &self.ledger
    }

    /// One-line description of a staged edit, course shown by its label
    pub fn describe_edit(&self, edit: &PendingEdit) -> String {
        let label = self.catalog(edit.category).display_label(&edit.course_column);
        format!(
            "Voluntario: {}, Curso: {}, Fecha: {}",
            edit.identity, label, edit.date
        )
    }

    pub fn commit(&mut self, sink: &dyn WorkbookSink) -> RegistryResult<CommitOutcome> {
        commit::commit(
            &mut self.ledger,
            &mut self.sheets,
            self.adapter.as_ref(),
            sink,
            self.policy,
        )
    }
}
