//! Storage port consumed by the materializer and the deletion coordinator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::occurrence::{Occurrence, OccurrenceId, RuleFieldsUpdate, UserId};

/// Trait for occurrence storage backends.
///
/// Groups are an adjacency relation: a child stores its root's id, and the
/// backend answers group-shaped queries over that reference. Nothing here is
/// transactional across calls.
#[async_trait]
pub trait OccurrenceStore: Send + Sync {
    // ========================================================================
    // Single Occurrence Operations
    // ========================================================================

    /// Get an occurrence by ID.
    async fn find_by_id(&self, id: &OccurrenceId) -> Result<Option<Occurrence>>;

    /// Insert an occurrence, assigning an identity if it has none.
    async fn save(&self, occurrence: Occurrence) -> Result<Occurrence>;

    /// Replace a stored occurrence. Fails with not-found if it is missing.
    async fn update(&self, occurrence: &Occurrence) -> Result<()>;

    /// Delete an occurrence. Returns false if there was nothing to delete.
    async fn delete(&self, id: &OccurrenceId) -> Result<bool>;

    /// Insert a batch of occurrences.
    async fn save_many(&self, occurrences: Vec<Occurrence>) -> Result<Vec<Occurrence>>;

    // ========================================================================
    // Group Operations
    // ========================================================================

    /// All group roots owned by `user_id`.
    async fn find_group_roots_for_user(&self, user_id: &UserId) -> Result<Vec<Occurrence>>;

    /// Number of children referencing `root_id`, regardless of date.
    async fn count_children(&self, root_id: &OccurrenceId) -> Result<usize>;

    /// Start instants of children of `root_id` that fall in `[start, end]`.
    async fn find_child_starts_in_window(
        &self,
        root_id: &OccurrenceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>>;

    /// The root plus every child referencing it.
    async fn find_group(&self, root_id: &OccurrenceId) -> Result<Vec<Occurrence>>;

    /// Partial update of the root's anchor, until, count and exclusions.
    async fn update_root_rule(&self, root_id: &OccurrenceId, update: &RuleFieldsUpdate)
        -> Result<()>;

    /// Delete every child of `root_id`. Returns the number removed.
    async fn delete_children_of_root(&self, root_id: &OccurrenceId) -> Result<usize>;

    /// Delete children of `root_id` starting at or after `from`.
    async fn delete_children_from(
        &self,
        root_id: &OccurrenceId,
        from: DateTime<Utc>,
    ) -> Result<usize>;

    // ========================================================================
    // Auxiliary Links
    // ========================================================================

    /// Ids of auxiliary records (e.g. projects) linked to an occurrence.
    async fn find_linked_ids(&self, id: &OccurrenceId) -> Result<Vec<String>>;

    /// Link auxiliary ids to an occurrence. Existing links are kept.
    async fn link_ids(&self, id: &OccurrenceId, linked: &[String]) -> Result<()>;

    // ========================================================================
    // Range Reads
    // ========================================================================

    /// Occurrences of `user_id` starting in `[start, end]`, ascending by start.
    async fn find_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>>;
}
