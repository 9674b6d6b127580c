//! Occurrence aggregate: the entity every calendar operation works on.
//!
//! - **Occurrence**: one activity, either a one-off, the root of a recurring
//!   group, or a child generated from a root's rule
//! - **RecurrenceRule**: anchor, until-cap, count-cap, exclusion dates
//! - **Status / RecurrenceTag**: closed enums parsed from their snake_case names

mod types;

pub use types::{
    validate_schedule, Classification, NewOccurrence, Occurrence, OccurrenceId, OccurrenceStatus,
    RecurrenceRule, RecurrenceTag, RuleFieldsUpdate, UserId, SLOT_MINUTES,
};
