//! Group-aware deletion of occurrences.
//!
//! Each scope runs as a sequence of independent store calls. A failure part
//! way through leaves the earlier steps applied; re-running the same deletion
//! is safe because deleting a row that is already gone is not an error.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{CadenceError, Result};
use crate::occurrence::{Occurrence, OccurrenceId, RecurrenceRule, RuleFieldsUpdate};
use crate::recurrence::end_of_day;
use crate::storage::OccurrenceStore;

use super::types::{DeleteScope, DeletionReport};

/// Deletes one occurrence, the rest of its series, or its whole group.
pub struct DeletionCoordinator<S: OccurrenceStore> {
    store: Arc<S>,
}

impl<S: OccurrenceStore> DeletionCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Delete `id` with the given scope.
    ///
    /// Fails with [`CadenceError::NotFound`] when `id` does not resolve.
    pub async fn delete_instance(
        &self,
        id: &OccurrenceId,
        scope: DeleteScope,
    ) -> Result<DeletionReport> {
        let occurrence = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(id.to_string()))?;

        let root_id = occurrence.root_id().cloned().unwrap_or_else(|| id.clone());
        let is_root = !occurrence.is_child();

        let report = match scope {
            DeleteScope::This => self.delete_this(&occurrence, id, &root_id, is_root).await?,
            DeleteScope::Future if is_root => self.delete_all(&root_id).await?,
            DeleteScope::Future => self.delete_future(&occurrence, id, &root_id).await?,
            DeleteScope::All => self.delete_all(&root_id).await?,
        };

        info!(
            "Deleted {} occurrence(s) for {} with scope {}",
            report.deleted, id, report.scope
        );
        Ok(report)
    }

    async fn delete_this(
        &self,
        occurrence: &Occurrence,
        id: &OccurrenceId,
        root_id: &OccurrenceId,
        is_root: bool,
    ) -> Result<DeletionReport> {
        let mut report = DeletionReport::new(DeleteScope::This);

        if is_root {
            report.promoted = self.promote_successor(occurrence).await?;
        } else if let Some(date) = occurrence.start_date_key() {
            self.record_exclusion(root_id, &date).await?;
        }

        if self.store.delete(id).await? {
            report.deleted = 1;
        }
        Ok(report)
    }

    async fn delete_future(
        &self,
        occurrence: &Occurrence,
        id: &OccurrenceId,
        root_id: &OccurrenceId,
    ) -> Result<DeletionReport> {
        let mut report = DeletionReport::new(DeleteScope::Future);

        if let Some(start) = occurrence.start() {
            // Close the rule at the end of the previous day
            if let Some(previous_day) = start.date_naive().pred_opt() {
                self.store
                    .update_root_rule(root_id, &RuleFieldsUpdate::until(end_of_day(previous_day)))
                    .await?;
            }
            report.deleted += self.store.delete_children_from(root_id, start).await?;
        }

        // Usually already removed by the bulk delete above
        if self.store.delete(id).await? {
            report.deleted += 1;
        }
        Ok(report)
    }

    async fn delete_all(&self, root_id: &OccurrenceId) -> Result<DeletionReport> {
        let mut report = DeletionReport::new(DeleteScope::All);
        report.deleted += self.store.delete_children_of_root(root_id).await?;
        if self.store.delete(root_id).await? {
            report.deleted += 1;
        }
        Ok(report)
    }

    /// Add `date` to the root's exclusion set so it is never materialized
    /// again. A missing root is logged and skipped.
    pub(crate) async fn record_exclusion(&self, root_id: &OccurrenceId, date: &str) -> Result<()> {
        let Some(mut root) = self.store.find_by_id(root_id).await? else {
            warn!("Group root {} is missing; not recording exclusion {}", root_id, date);
            return Ok(());
        };

        if root.exclude_date(date)? {
            let excluded = root
                .rule()
                .map(|rule| rule.excluded_dates.clone())
                .unwrap_or_default();
            self.store
                .update_root_rule(root_id, &RuleFieldsUpdate::excluded_dates(excluded))
                .await?;
        }
        Ok(())
    }

    /// Hand the group's rule to its earliest remaining child.
    ///
    /// Returns the promoted child's id, or `None` when the root has no
    /// children and the group simply ends with it.
    async fn promote_successor(&self, old_root: &Occurrence) -> Result<Option<OccurrenceId>> {
        let Some(old_id) = old_root.id() else {
            return Ok(None);
        };

        let mut remaining: Vec<Occurrence> = self
            .store
            .find_group(old_id)
            .await?
            .into_iter()
            .filter(|o| o.id() != Some(old_id))
            .collect();
        if remaining.is_empty() {
            return Ok(None);
        }

        // Unscheduled children sort first
        remaining.sort_by_key(|o| o.start());
        let mut new_root = remaining.remove(0);
        let Some(new_id) = new_root.id().cloned() else {
            return Ok(None);
        };

        let old_rule = old_root.rule().cloned().unwrap_or_default();
        let mut rule = RecurrenceRule {
            anchor: old_root.effective_anchor(),
            until: old_rule.until,
            max_count: old_rule.max_count,
            excluded_dates: old_rule.excluded_dates,
            copy_links: old_rule.copy_links,
        };
        if let Some(vacated) = old_root.start_date_key() {
            rule.exclude(vacated);
        }

        new_root.promote(rule);
        self.store.update(&new_root).await?;

        for mut sibling in remaining {
            sibling.attach_to(new_id.clone());
            self.store.update(&sibling).await?;
        }

        info!("Promoted {} to group root in place of {}", new_id, old_id);
        Ok(Some(new_id))
    }
}

// ============================================================================
// Tests
// ============================================================================
