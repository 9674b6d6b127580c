//! Materialization of recurring groups into concrete child occurrences.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::RecurrenceConfig;
use crate::error::Result;
use crate::occurrence::{Occurrence, OccurrenceId, UserId};
use crate::recurrence::{
    at_time_of, date_key, default_cap, end_of_day, start_of_day, OccurrenceGenerator,
};
use crate::storage::OccurrenceStore;

use super::types::MaterializationReport;

/// Creates the missing children of every recurring group in a date window.
///
/// Repeated calls over overlapping windows create nothing new: existing
/// children, the root's own date and excluded dates are all skipped. The
/// store offers no uniqueness guarantee, so two concurrent calls for the same
/// user may still race.
pub struct Materializer<S: OccurrenceStore> {
    store: Arc<S>,
    generator: OccurrenceGenerator,
    horizon_months: u32,
}

impl<S: OccurrenceStore> Materializer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, &RecurrenceConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: &RecurrenceConfig) -> Self {
        Self {
            store,
            generator: OccurrenceGenerator::new()
                .with_monthly_limit(config.monthly_iteration_limit),
            horizon_months: config.horizon_months,
        }
    }

    /// Materialize every group root owned by `user_id` over the window.
    ///
    /// Roots are processed one after another. A storage failure aborts the
    /// remaining roots; children already saved for earlier roots stay saved.
    pub async fn materialize(
        &self,
        user_id: &UserId,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<MaterializationReport> {
        let roots = self.store.find_group_roots_for_user(user_id).await?;
        let mut report = MaterializationReport::default();

        for root in &roots {
            let created = self.materialize_root(root, window_start, window_end).await?;
            report.roots_processed += 1;
            report.created.extend(created);
        }

        info!(
            "Materialized {} occurrences across {} groups for user {}",
            report.created.len(),
            report.roots_processed,
            user_id
        );
        Ok(report)
    }

    /// Materialize a single group root over the window.
    pub async fn materialize_root(
        &self,
        root: &Occurrence,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<OccurrenceId>> {
        let (Some(root_id), Some(root_start), Some(anchor), Some(duration)) = (
            root.id(),
            root.start(),
            root.effective_anchor(),
            root.duration(),
        ) else {
            debug!("Skipping unscheduled group root {:?}", root.id());
            return Ok(Vec::new());
        };

        let rule = root.rule().cloned().unwrap_or_default();
        let cap = rule
            .until
            .unwrap_or_else(|| default_cap(anchor, self.horizon_months));

        let candidates =
            self.generator
                .generate(root.recurrence(), anchor, window_start, window_end, cap);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let existing_count = match rule.max_count {
            Some(_) => self.store.count_children(root_id).await?,
            None => 0,
        };

        // Whole days, so a child later on the window's last day still counts
        let mut taken: HashSet<String> = self
            .store
            .find_child_starts_in_window(
                root_id,
                start_of_day(window_start.date_naive()),
                end_of_day(window_end.date_naive()),
            )
            .await?
            .into_iter()
            .map(|start| date_key(start.date_naive()))
            .collect();
        taken.insert(date_key(root_start.date_naive()));

        let mut children = Vec::new();
        for date in candidates {
            if let Some(max_count) = rule.max_count {
                if existing_count + children.len() >= max_count as usize {
                    break;
                }
            }

            let key = date_key(date);
            if taken.contains(&key) || rule.is_excluded(&key) {
                continue;
            }

            let start = at_time_of(date, anchor);
            children.push(Occurrence::child_of(root, start, start + duration)?);
            taken.insert(key);
        }

        if children.is_empty() {
            return Ok(Vec::new());
        }

        let saved = self.store.save_many(children).await?;
        let created: Vec<OccurrenceId> = saved.iter().filter_map(|o| o.id().cloned()).collect();

        if rule.copy_links {
            let links = self.store.find_linked_ids(root_id).await?;
            if !links.is_empty() {
                for id in &created {
                    self.store.link_ids(id, &links).await?;
                }
            }
        }

        debug!(
            "Created {} children for group {} ({})",
            created.len(),
            root_id,
            root.recurrence()
        );
        Ok(created)
    }
}

// ============================================================================
// Tests
// ============================================================================
