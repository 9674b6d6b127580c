//! Tests for partial-failure behavior when the store errors mid-operation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use cadence::calendar::{CalendarManager, DeleteScope};
use cadence::error::{CadenceError, Result, StorageError};
use cadence::occurrence::{
    NewOccurrence, Occurrence, OccurrenceId, RecurrenceTag, RuleFieldsUpdate, UserId,
};
use cadence::storage::{EmbeddedOccurrenceStore, OccurrenceStore};

/// Embedded store that fails selected calls.
#[derive(Default)]
struct FailingStore {
    inner: EmbeddedOccurrenceStore,
    save_many_calls: AtomicUsize,
    fail_save_many_on: Option<usize>,
    fail_rule_updates: bool,
}

#[async_trait]
impl OccurrenceStore for FailingStore {
    async fn find_by_id(&self, id: &OccurrenceId) -> Result<Option<Occurrence>> {
        self.inner.find_by_id(id).await
    }

    async fn save(&self, occurrence: Occurrence) -> Result<Occurrence> {
        self.inner.save(occurrence).await
    }

    async fn update(&self, occurrence: &Occurrence) -> Result<()> {
        self.inner.update(occurrence).await
    }

    async fn delete(&self, id: &OccurrenceId) -> Result<bool> {
        self.inner.delete(id).await
    }

    async fn save_many(&self, occurrences: Vec<Occurrence>) -> Result<Vec<Occurrence>> {
        let call = self.save_many_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_save_many_on == Some(call) {
            return Err(StorageError::Persistence(format!("save_many call {call} failed")).into());
        }
        self.inner.save_many(occurrences).await
    }

    async fn find_group_roots_for_user(&self, user_id: &UserId) -> Result<Vec<Occurrence>> {
        self.inner.find_group_roots_for_user(user_id).await
    }

    async fn count_children(&self, root_id: &OccurrenceId) -> Result<usize> {
        self.inner.count_children(root_id).await
    }

    async fn find_child_starts_in_window(
        &self,
        root_id: &OccurrenceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        self.inner.find_child_starts_in_window(root_id, start, end).await
    }

    async fn find_group(&self, root_id: &OccurrenceId) -> Result<Vec<Occurrence>> {
        self.inner.find_group(root_id).await
    }

    async fn update_root_rule(
        &self,
        root_id: &OccurrenceId,
        update: &RuleFieldsUpdate,
    ) -> Result<()> {
        if self.fail_rule_updates {
            return Err(StorageError::Persistence("rule update failed".to_string()).into());
        }
        self.inner.update_root_rule(root_id, update).await
    }

    async fn delete_children_of_root(&self, root_id: &OccurrenceId) -> Result<usize> {
        self.inner.delete_children_of_root(root_id).await
    }

    async fn delete_children_from(
        &self,
        root_id: &OccurrenceId,
        from: DateTime<Utc>,
    ) -> Result<usize> {
        self.inner.delete_children_from(root_id, from).await
    }

    async fn find_linked_ids(&self, id: &OccurrenceId) -> Result<Vec<String>> {
        self.inner.find_linked_ids(id).await
    }

    async fn link_ids(&self, id: &OccurrenceId, linked: &[String]) -> Result<()> {
        self.inner.link_ids(id, linked).await
    }

    async fn find_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>> {
        self.inner.find_in_range(user_id, start, end).await
    }
}

fn nine_am(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()
}

fn user() -> UserId {
    UserId::from("user-1")
}

async fn create_daily(calendar: &CalendarManager<FailingStore>, name: &str) -> Occurrence {
    calendar
        .create(
            NewOccurrence::new(name, "user-1")
                .schedule(nine_am(1), nine_am(1) + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::Daily),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_failed_batch_save_stops_remaining_roots() {
    let store = Arc::new(FailingStore {
        fail_save_many_on: Some(2),
        ..Default::default()
    });
    let calendar = CalendarManager::new(store.clone());
    for name in ["Standup", "Gym", "Reading"] {
        create_daily(&calendar, name).await;
    }

    let err = calendar
        .materialize(&user(), nine_am(2), nine_am(4))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CadenceError::Storage(StorageError::Persistence(_))
    ));
    assert_eq!(store.save_many_calls.load(Ordering::SeqCst), 2);

    // The first root processed keeps its children; the rest were never reached
    let roots = store.find_group_roots_for_user(&user()).await.unwrap();
    assert_eq!(roots.len(), 3);
    let mut counts = Vec::new();
    for root in &roots {
        counts.push(store.count_children(root.id().unwrap()).await.unwrap());
    }
    counts.sort_unstable();
    assert_eq!(counts, vec![0, 0, 3]);
}

#[tokio::test]
async fn test_failed_rule_update_aborts_future_delete() {
    let store = Arc::new(FailingStore {
        fail_rule_updates: true,
        ..Default::default()
    });
    let calendar = CalendarManager::new(store.clone());
    let root = create_daily(&calendar, "Standup").await;
    let found = calendar
        .occurrences_in_range(&user(), nine_am(1), nine_am(5))
        .await
        .unwrap();
    assert_eq!(found.len(), 5);
    let target = found
        .iter()
        .find(|o| o.start() == Some(nine_am(3)))
        .unwrap();

    let err = calendar
        .delete(target.id().unwrap(), DeleteScope::Future)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CadenceError::Storage(StorageError::Persistence(_))
    ));

    // Truncation never ran, so the whole group is still there
    assert_eq!(store.inner.len().await, 5);
    let root = store.find_by_id(root.id().unwrap()).await.unwrap().unwrap();
    assert!(root.rule().unwrap().until.is_none());
}
