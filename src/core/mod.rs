//! Staged edit model: sheet resolution, indexes, ledger and commit

pub mod catalog;
pub mod commit;
pub mod ledger;
pub mod resolver;
pub mod schema;
pub mod session;
pub mod volunteers;

pub use catalog::{Course, CourseCatalog};
pub use commit::{CommitOutcome, CommitPolicy, CommitReport, WorkbookSink};
pub use ledger::EditLedger;
pub use resolver::{resolve_sheets, ResolvedSheets};
pub use schema::{PositionalLayout, SchemaAdapter};
pub use session::Session;
pub use volunteers::volunteer_index;
