//! Tests for on-disk persistence of groups and their rules.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use cadence::calendar::{CalendarManager, DeleteScope};
use cadence::config::Config;
use cadence::occurrence::{NewOccurrence, RecurrenceTag, UserId};
use cadence::storage::{create_store, EmbeddedOccurrenceStore, OccurrenceStore};

/// Create a test configuration persisting under `data_dir`.
fn create_test_config(data_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.to_string_lossy().to_string();
    config.storage.persist = true;
    config
}

async fn open(config: &Config) -> CalendarManager<EmbeddedOccurrenceStore> {
    let store = create_store(config).await.unwrap();
    CalendarManager::with_config(Arc::new(store), config)
}

fn nine_am(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn test_group_survives_reopen() {
    let data_dir = TempDir::new().unwrap();
    let config = create_test_config(data_dir.path());
    let user = UserId::from("user-1");

    let root_id = {
        let calendar = open(&config).await;
        let root = calendar
            .create(
                NewOccurrence::new("Standup", "user-1")
                    .schedule(nine_am(1), nine_am(1) + Duration::minutes(30))
                    .with_recurrence(RecurrenceTag::Daily)
                    .copy_links(true),
            )
            .await
            .unwrap();
        calendar
            .link(root.id().unwrap(), &["project-1".to_string()])
            .await
            .unwrap();

        let found = calendar
            .occurrences_in_range(&user, nine_am(1), nine_am(4))
            .await
            .unwrap();
        assert_eq!(found.len(), 4);

        calendar
            .delete(found[2].id().unwrap(), DeleteScope::This)
            .await
            .unwrap();
        root.id().unwrap().clone()
    };

    assert!(data_dir.path().join("occurrences.json").exists());

    let calendar = open(&config).await;
    let root = calendar.get(&root_id).await.unwrap();
    assert!(root.rule().unwrap().is_excluded("2024-01-03"));

    let found = calendar
        .occurrences_in_range(&user, nine_am(1), nine_am(4))
        .await
        .unwrap();
    let starts: Vec<_> = found.iter().filter_map(|o| o.start()).collect();
    assert_eq!(starts, vec![nine_am(1), nine_am(2), nine_am(4)]);

    for child in found.iter().filter(|o| o.is_child()) {
        let links = calendar
            .store()
            .find_linked_ids(child.id().unwrap())
            .await
            .unwrap();
        assert_eq!(links, vec!["project-1"]);
    }
}

#[tokio::test]
async fn test_config_file_drives_store_location() {
    let data_dir = TempDir::new().unwrap();
    let config_path = data_dir.path().join("cadence.toml");
    std::fs::write(
        &config_path,
        format!(
            "[storage]\ndata_dir = \"{}\"\n\n[recurrence]\nhorizon_months = 1\n",
            data_dir.path().join("store").display()
        ),
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.recurrence.horizon_months, 1);

    let calendar = open(&config).await;
    calendar
        .create(
            NewOccurrence::new("Standup", "user-1")
                .schedule(nine_am(1), nine_am(1) + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::Weekly),
        )
        .await
        .unwrap();

    // One month of horizon: Jan 8 through Jan 29, nothing in February
    let found = calendar
        .occurrences_in_range(
            &UserId::from("user-1"),
            nine_am(1),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 5);
    assert!(data_dir.path().join("store/occurrences.json").exists());
}
