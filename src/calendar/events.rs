//! Calendar occurrence management.
//!
//! This module provides the CalendarManager, the single entry point callers
//! use to create, query, edit and delete occurrences.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{Config, RecurrenceConfig};
use crate::error::{CadenceError, Result};
use crate::occurrence::{NewOccurrence, Occurrence, OccurrenceId, UserId};
use crate::storage::OccurrenceStore;

use super::deletion::DeletionCoordinator;
use super::materializer::Materializer;
use super::types::{DeleteScope, DeletionReport, MaterializationReport};

// ============================================================================
// Calendar Manager
// ============================================================================

/// Manager for calendar occurrences, tying storage to materialization and
/// group-aware deletion.
pub struct CalendarManager<S: OccurrenceStore> {
    store: Arc<S>,
    materializer: Materializer<S>,
    deletion: DeletionCoordinator<S>,
}

impl<S: OccurrenceStore> CalendarManager<S> {
    /// Create a new CalendarManager with default recurrence settings.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_recurrence(store, &RecurrenceConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: &Config) -> Self {
        Self::with_recurrence(store, &config.recurrence)
    }

    fn with_recurrence(store: Arc<S>, recurrence: &RecurrenceConfig) -> Self {
        Self {
            materializer: Materializer::with_config(store.clone(), recurrence),
            deletion: DeletionCoordinator::new(store.clone()),
            store,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ========================================================================
    // CRUD Operations
    // ========================================================================

    /// Validate and persist a new occurrence.
    pub async fn create(&self, input: NewOccurrence) -> Result<Occurrence> {
        let occurrence = Occurrence::new(input)?;
        let saved = self.store.save(occurrence).await?;
        debug!(
            "Created occurrence: {} ({})",
            saved.name(),
            saved.id().map(|id| id.as_str()).unwrap_or_default()
        );
        Ok(saved)
    }

    /// Get an occurrence by ID.
    pub async fn get(&self, id: &OccurrenceId) -> Result<Occurrence> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(id.to_string()))
    }

    pub async fn mark_done(&self, id: &OccurrenceId) -> Result<Occurrence> {
        self.modify(id, |o| {
            o.mark_done();
            Ok(())
        })
        .await
    }

    pub async fn reopen(&self, id: &OccurrenceId) -> Result<Occurrence> {
        self.modify(id, |o| {
            o.reopen();
            Ok(())
        })
        .await
    }

    pub async fn rename(&self, id: &OccurrenceId, name: &str) -> Result<Occurrence> {
        self.modify(id, |o| Ok(o.rename(name)?)).await
    }

    /// Move an occurrence. Siblings are left alone.
    ///
    /// When a child moves to another calendar date, its old date is added to
    /// the root's exclusion set so materialization does not refill it.
    pub async fn reschedule(
        &self,
        id: &OccurrenceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Occurrence> {
        let mut occurrence = self.get(id).await?;
        let vacated = occurrence
            .root_id()
            .cloned()
            .zip(occurrence.start_date_key());

        occurrence.reschedule(start, end)?;
        self.store.update(&occurrence).await?;

        if let Some((root_id, old_date)) = vacated {
            if occurrence.start_date_key().as_ref() != Some(&old_date) {
                self.deletion.record_exclusion(&root_id, &old_date).await?;
            }
        }

        debug!("Rescheduled occurrence: {} ({})", occurrence.name(), id);
        Ok(occurrence)
    }

    pub async fn resize(&self, id: &OccurrenceId, end: DateTime<Utc>) -> Result<Occurrence> {
        self.modify(id, |o| Ok(o.resize(end)?)).await
    }

    /// Attach auxiliary links to an occurrence.
    pub async fn link(&self, id: &OccurrenceId, linked: &[String]) -> Result<()> {
        self.get(id).await?;
        self.store.link_ids(id, linked).await
    }

    /// Delete with group-aware semantics.
    pub async fn delete(&self, id: &OccurrenceId, scope: DeleteScope) -> Result<DeletionReport> {
        self.deletion.delete_instance(id, scope).await
    }

    // ========================================================================
    // Query Operations
    // ========================================================================

    /// Materialize the user's recurring groups over the range, then return
    /// every occurrence starting within it, sorted by start.
    pub async fn occurrences_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>> {
        if end < start {
            return Ok(Vec::new());
        }
        self.materialize(user_id, start, end).await?;
        self.store.find_in_range(user_id, start, end).await
    }

    pub async fn materialize(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<MaterializationReport> {
        self.materializer.materialize(user_id, start, end).await
    }

    async fn modify<F>(&self, id: &OccurrenceId, change: F) -> Result<Occurrence>
    where
        F: FnOnce(&mut Occurrence) -> Result<()>,
    {
        let mut occurrence = self.get(id).await?;
        change(&mut occurrence)?;
        self.store.update(&occurrence).await?;
        debug!("Updated occurrence: {} ({})", occurrence.name(), id);
        Ok(occurrence)
    }
}

// ============================================================================
// Tests
// ============================================================================
