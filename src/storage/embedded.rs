//! Embedded occurrence store.
//!
//! Keeps every occurrence in memory behind a single `RwLock`, with an index
//! from root id to child ids. When a data directory is given, the whole
//! store is rewritten to `occurrences.json` after each mutating call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, RwLock};

use crate::error::{CadenceError, Result, StorageError};
use crate::occurrence::{Occurrence, OccurrenceId, RuleFieldsUpdate, UserId};

use super::traits::OccurrenceStore;

const PERSISTENCE_FILE: &str = "occurrences.json";

// ============================================================================
// Internal Data Structure
// ============================================================================

#[derive(Debug, Default)]
struct OccurrenceData {
    /// Occurrences indexed by ID.
    occurrences: HashMap<OccurrenceId, Occurrence>,
    /// Index: root id -> child ids.
    children_by_root: HashMap<OccurrenceId, Vec<OccurrenceId>>,
    /// Auxiliary links per occurrence.
    links: HashMap<OccurrenceId, Vec<String>>,
}

impl OccurrenceData {
    fn index_child(&mut self, id: &OccurrenceId, root_id: Option<&OccurrenceId>) {
        if let Some(root_id) = root_id {
            let children = self.children_by_root.entry(root_id.clone()).or_default();
            if !children.contains(id) {
                children.push(id.clone());
            }
        }
    }

    fn unindex_child(&mut self, id: &OccurrenceId, root_id: Option<&OccurrenceId>) {
        if let Some(root_id) = root_id {
            if let Some(children) = self.children_by_root.get_mut(root_id) {
                children.retain(|child| child != id);
                if children.is_empty() {
                    self.children_by_root.remove(root_id);
                }
            }
        }
    }

    fn insert(&mut self, occurrence: Occurrence) -> Occurrence {
        let (id, occurrence) = match occurrence.id().cloned() {
            Some(id) => (id, occurrence),
            None => {
                let id = OccurrenceId::generate();
                (id.clone(), occurrence.with_id(id))
            }
        };

        if let Some(previous) = self.occurrences.get(&id) {
            let previous_root = previous.root_id().cloned();
            self.unindex_child(&id, previous_root.as_ref());
        }
        self.index_child(&id, occurrence.root_id());
        self.occurrences.insert(id, occurrence.clone());
        occurrence
    }

    fn remove(&mut self, id: &OccurrenceId) -> Option<Occurrence> {
        let removed = self.occurrences.remove(id)?;
        self.unindex_child(id, removed.root_id());
        self.links.remove(id);
        Some(removed)
    }

    fn children(&self, root_id: &OccurrenceId) -> impl Iterator<Item = &Occurrence> {
        self.children_by_root
            .get(root_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.occurrences.get(id))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistenceData {
    version: u32,
    occurrences: Vec<Occurrence>,
    #[serde(default)]
    links: HashMap<OccurrenceId, Vec<String>>,
}

// ============================================================================
// Embedded Implementation
// ============================================================================

/// In-memory occurrence store with optional persistence.
pub struct EmbeddedOccurrenceStore {
    data: RwLock<OccurrenceData>,
    persistence_path: Option<PathBuf>,
    persist_lock: AsyncMutex<()>,
}

impl Default for EmbeddedOccurrenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedOccurrenceStore {
    /// Create a new in-memory store without persistence.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(OccurrenceData::default()),
            persistence_path: None,
            persist_lock: AsyncMutex::new(()),
        }
    }

    /// Create a store persisted under `data_dir`, loading existing data.
    pub async fn with_persistence(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(StorageError::Io)?;

        let persistence_path = data_dir.join(PERSISTENCE_FILE);
        let store = Self {
            data: RwLock::new(OccurrenceData::default()),
            persistence_path: Some(persistence_path.clone()),
            persist_lock: AsyncMutex::new(()),
        };

        if persistence_path.exists() {
            store.load_from_file(&persistence_path).await?;
        }

        Ok(store)
    }

    /// Number of stored occurrences.
    pub async fn len(&self) -> usize {
        self.data.read().await.occurrences.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn load_from_file(&self, path: &Path) -> Result<()> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(CadenceError::Io)?;
        let persisted: PersistenceData = serde_json::from_str(&content)?;

        let mut data = self.data.write().await;
        for occurrence in persisted.occurrences {
            data.insert(occurrence);
        }
        data.links = persisted.links;

        tracing::info!(
            "Loaded {} occurrences from {}",
            data.occurrences.len(),
            path.display()
        );
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let Some(ref path) = self.persistence_path else {
            return Ok(());
        };

        let _lock = self.persist_lock.lock().await;

        let data = self.data.read().await;
        let persisted = PersistenceData {
            version: 1,
            occurrences: data.occurrences.values().cloned().collect(),
            links: data.links.clone(),
        };
        drop(data);

        let content = serde_json::to_string_pretty(&persisted)?;

        // Write to temp file first, then rename
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| StorageError::Persistence(e.to_string()))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| StorageError::Persistence(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl OccurrenceStore for EmbeddedOccurrenceStore {
    async fn find_by_id(&self, id: &OccurrenceId) -> Result<Option<Occurrence>> {
        let data = self.data.read().await;
        Ok(data.occurrences.get(id).cloned())
    }

    async fn save(&self, occurrence: Occurrence) -> Result<Occurrence> {
        let mut data = self.data.write().await;
        let saved = data.insert(occurrence);
        drop(data);

        self.persist().await?;
        Ok(saved)
    }

    async fn update(&self, occurrence: &Occurrence) -> Result<()> {
        let id = occurrence.id().ok_or_else(|| {
            StorageError::InvalidOperation("cannot update an unsaved occurrence".to_string())
        })?;

        let mut data = self.data.write().await;
        if !data.occurrences.contains_key(id) {
            return Err(StorageError::NotFound(id.to_string()).into());
        }
        data.insert(occurrence.clone());
        drop(data);

        self.persist().await
    }

    async fn delete(&self, id: &OccurrenceId) -> Result<bool> {
        let mut data = self.data.write().await;
        let removed = data.remove(id).is_some();
        drop(data);

        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn save_many(&self, occurrences: Vec<Occurrence>) -> Result<Vec<Occurrence>> {
        if occurrences.is_empty() {
            return Ok(Vec::new());
        }

        let mut data = self.data.write().await;
        let saved: Vec<Occurrence> = occurrences
            .into_iter()
            .map(|occurrence| data.insert(occurrence))
            .collect();
        drop(data);

        self.persist().await?;
        Ok(saved)
    }

    async fn find_group_roots_for_user(&self, user_id: &UserId) -> Result<Vec<Occurrence>> {
        let data = self.data.read().await;
        let mut roots: Vec<Occurrence> = data
            .occurrences
            .values()
            .filter(|o| o.user_id() == user_id && o.is_group_root())
            .cloned()
            .collect();
        roots.sort_by_key(|o| o.created_at());
        Ok(roots)
    }

    async fn count_children(&self, root_id: &OccurrenceId) -> Result<usize> {
        let data = self.data.read().await;
        Ok(data.children(root_id).count())
    }

    async fn find_child_starts_in_window(
        &self,
        root_id: &OccurrenceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let data = self.data.read().await;
        Ok(data
            .children(root_id)
            .filter_map(|o| o.start())
            .filter(|s| *s >= start && *s <= end)
            .collect())
    }

    async fn find_group(&self, root_id: &OccurrenceId) -> Result<Vec<Occurrence>> {
        let data = self.data.read().await;
        let mut group: Vec<Occurrence> =
            data.occurrences.get(root_id).cloned().into_iter().collect();
        group.extend(data.children(root_id).cloned());
        Ok(group)
    }

    async fn update_root_rule(
        &self,
        root_id: &OccurrenceId,
        update: &RuleFieldsUpdate,
    ) -> Result<()> {
        let mut data = self.data.write().await;
        let root = data
            .occurrences
            .get_mut(root_id)
            .ok_or_else(|| StorageError::NotFound(root_id.to_string()))?;
        root.apply_rule_update(update)?;
        drop(data);

        self.persist().await
    }

    async fn delete_children_of_root(&self, root_id: &OccurrenceId) -> Result<usize> {
        let mut data = self.data.write().await;
        let ids = data.children_by_root.get(root_id).cloned().unwrap_or_default();
        let removed = ids.iter().filter(|id| data.remove(id).is_some()).count();
        drop(data);

        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn delete_children_from(
        &self,
        root_id: &OccurrenceId,
        from: DateTime<Utc>,
    ) -> Result<usize> {
        let mut data = self.data.write().await;
        let ids: Vec<OccurrenceId> = data
            .children(root_id)
            .filter(|o| o.start().is_some_and(|s| s >= from))
            .filter_map(|o| o.id().cloned())
            .collect();
        let removed = ids.iter().filter(|id| data.remove(id).is_some()).count();
        drop(data);

        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn find_linked_ids(&self, id: &OccurrenceId) -> Result<Vec<String>> {
        let data = self.data.read().await;
        Ok(data.links.get(id).cloned().unwrap_or_default())
    }

    async fn link_ids(&self, id: &OccurrenceId, linked: &[String]) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.occurrences.contains_key(id) {
            return Err(StorageError::NotFound(id.to_string()).into());
        }
        let links = data.links.entry(id.clone()).or_default();
        for link in linked {
            if !links.contains(link) {
                links.push(link.clone());
            }
        }
        drop(data);

        self.persist().await
    }

    async fn find_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>> {
        let data = self.data.read().await;
        let mut found: Vec<Occurrence> = data
            .occurrences
            .values()
            .filter(|o| o.user_id() == user_id)
            .filter(|o| o.start().is_some_and(|s| s >= start && s <= end))
            .cloned()
            .collect();
        found.sort_by_key(|o| o.start());
        Ok(found)
    }
}

// ============================================================================
// Tests
// ============================================================================
