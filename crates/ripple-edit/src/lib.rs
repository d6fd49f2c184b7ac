//! Backed-up, validated single-file edits with rollback

pub mod backup;
pub mod checks;
pub mod context;
pub mod editor;
pub mod error;
pub mod heuristic;
pub mod history;
pub mod writer;


pub use backup::{BackupManager, BackupRecord};
pub use context::{EditContext, EditState, SafetyChecks, ValidationReport};
pub use editor::{ChangePatterns, EditOutcome, RollbackOutcome, SafeEditor};
pub use error::EditError;
pub use history::EditHistory;
pub use writer::{ContentWriter, DirectWriter};
