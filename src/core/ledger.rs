//! Pending edit ledger

use crate::error::{RegistryError, RegistryResult};
use crate::types::PendingEdit;

/// Ordered list of staged edits for one session.
///
/// The ledger does no validation of its own; callers check that the
/// identity and course exist before appending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditLedger {
    edits: Vec<PendingEdit>,
}

impl EditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, edit: PendingEdit) {
        self.edits.push(edit);
    }

    pub fn remove_at(&mut self, position: usize) -> RegistryResult<PendingEdit> {
        if position >= self.edits.len() {
            return Err(RegistryError::IndexOutOfRange {
                position,
                len: self.edits.len(),
            });
        }
        Ok(self.edits.remove(position))
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// Records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, PendingEdit> {
        self.edits.iter()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

impl<'a> IntoIterator for &'a EditLedger {
    type Item = &'a PendingEdit;
    type IntoIter = std::slice::Iter<'a, PendingEdit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
