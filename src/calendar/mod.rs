//! Calendar module for recurring occurrence management.
//!
//! - **CalendarManager**: CRUD, range queries and deletion for callers
//! - **Materializer**: creates the concrete children of recurring groups
//! - **DeletionCoordinator**: `this` / `future` / `all` deletion with root
//!   promotion
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  CalendarManager                     │
//! │   create / get / edit          occurrences_in_range  │
//! │            │                    │              │     │
//! │            │          ┌─────────▼──────┐       │     │
//! │            │          │  Materializer  │       │     │
//! │            │          │  (generator)   │       │     │
//! │            │          └─────────┬──────┘       │     │
//! │   delete ──┼──► DeletionCoordinator            │     │
//! │            ▼                    ▼              ▼     │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │               OccurrenceStore                  │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use cadence::calendar::{CalendarManager, DeleteScope};
//! use cadence::occurrence::{NewOccurrence, RecurrenceTag, UserId};
//! use cadence::storage::EmbeddedOccurrenceStore;
//! use std::sync::Arc;
//!
//! let calendar = CalendarManager::new(Arc::new(EmbeddedOccurrenceStore::new()));
//!
//! let root = calendar
//!     .create(
//!         NewOccurrence::new("Standup", "user-1")
//!             .schedule(start, start + Duration::minutes(30))
//!             .with_recurrence(RecurrenceTag::Daily),
//!     )
//!     .await?;
//!
//! let week = calendar
//!     .occurrences_in_range(&UserId::from("user-1"), monday, sunday)
//!     .await?;
//!
//! calendar.delete(week[2].id().unwrap(), DeleteScope::Future).await?;
//! ```

mod deletion;
mod events;
mod materializer;
pub mod types;

pub use deletion::DeletionCoordinator;
pub use events::CalendarManager;
pub use materializer::Materializer;
pub use types::{DeleteScope, DeletionReport, MaterializationReport};
