//! Cadence: recurring calendar occurrences
//!
//! A scheduling engine that stores one-off and recurring occurrences,
//! materializes recurring groups into concrete rows on demand, and deletes
//! with `this` / `future` / `all` semantics.

pub mod calendar;
pub mod config;
pub mod error;
pub mod occurrence;
pub mod recurrence;
pub mod storage;

pub use calendar::{
    CalendarManager, DeleteScope, DeletionCoordinator, DeletionReport, MaterializationReport,
    Materializer,
};
pub use config::Config;
pub use error::{CadenceError, ConfigError, Result, StorageError, ValidationError};
pub use occurrence::{
    NewOccurrence, Occurrence, OccurrenceId, OccurrenceStatus, RecurrenceRule, RecurrenceTag,
    UserId,
};
pub use recurrence::OccurrenceGenerator;
pub use storage::{create_store, EmbeddedOccurrenceStore, OccurrenceStore};
