//! Tests for recurring group materialization through the CalendarManager.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use cadence::calendar::CalendarManager;
use cadence::error::{CadenceError, ValidationError};
use cadence::occurrence::{NewOccurrence, RecurrenceTag, UserId};
use cadence::storage::{EmbeddedOccurrenceStore, OccurrenceStore};

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn manager() -> CalendarManager<EmbeddedOccurrenceStore> {
    CalendarManager::new(Arc::new(EmbeddedOccurrenceStore::new()))
}

fn user() -> UserId {
    UserId::from("user-1")
}

#[tokio::test]
async fn test_forty_five_minute_occurrence_is_rejected() {
    let calendar = manager();
    let start = utc(2024, 1, 1, 9);

    let err = calendar
        .create(NewOccurrence::new("Sync", "user-1").schedule(start, start + Duration::minutes(45)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CadenceError::Validation(ValidationError::InvalidDuration { minutes: 45 })
    ));

    let created = calendar
        .create(NewOccurrence::new("Sync", "user-1").schedule(start, start + Duration::minutes(60)))
        .await
        .unwrap();
    let err = calendar
        .reschedule(created.id().unwrap(), start, start + Duration::minutes(45))
        .await
        .unwrap_err();
    assert!(matches!(err, CadenceError::Validation(_)));
}

#[tokio::test]
async fn test_daily_group_fills_window() {
    let calendar = manager();
    let anchor = utc(2024, 1, 1, 9);
    calendar
        .create(
            NewOccurrence::new("Standup", "user-1")
                .schedule(anchor, anchor + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::Daily),
        )
        .await
        .unwrap();

    let report = calendar
        .materialize(&user(), utc(2024, 1, 2, 0), utc(2024, 1, 5, 0))
        .await
        .unwrap();
    assert_eq!(report.roots_processed, 1);
    assert_eq!(report.created_count(), 4);

    let found = calendar
        .occurrences_in_range(&user(), utc(2024, 1, 2, 0), utc(2024, 1, 6, 0))
        .await
        .unwrap();
    let starts: Vec<_> = found.iter().filter_map(|o| o.start()).collect();
    assert_eq!(
        starts,
        vec![
            utc(2024, 1, 2, 9),
            utc(2024, 1, 3, 9),
            utc(2024, 1, 4, 9),
            utc(2024, 1, 5, 9),
        ]
    );
    assert!(found
        .iter()
        .all(|o| o.duration() == Some(Duration::minutes(30))));
}

#[tokio::test]
async fn test_second_pass_creates_nothing() {
    let calendar = manager();
    let anchor = utc(2024, 1, 1, 9);
    calendar
        .create(
            NewOccurrence::new("Gym", "user-1")
                .schedule(anchor, anchor + Duration::hours(1))
                .with_recurrence(RecurrenceTag::Weekly),
        )
        .await
        .unwrap();

    let window = (utc(2024, 1, 1, 0), utc(2024, 3, 1, 0));
    let first = calendar.materialize(&user(), window.0, window.1).await.unwrap();
    assert!(first.created_count() > 0);

    let second = calendar.materialize(&user(), window.0, window.1).await.unwrap();
    assert_eq!(second.created_count(), 0);
    assert_eq!(calendar.store().len().await, first.created_count() + 1);
}

#[tokio::test]
async fn test_monthly_group_clamps_to_month_end() {
    let calendar = manager();
    let anchor = utc(2024, 1, 31, 8);
    calendar
        .create(
            NewOccurrence::new("Rent", "user-1")
                .schedule(anchor, anchor + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::Monthly),
        )
        .await
        .unwrap();

    let found = calendar
        .occurrences_in_range(&user(), utc(2024, 2, 1, 0), utc(2024, 4, 30, 23))
        .await
        .unwrap();
    let starts: Vec<_> = found.iter().filter_map(|o| o.start()).collect();
    assert_eq!(
        starts,
        vec![utc(2024, 2, 29, 8), utc(2024, 3, 31, 8), utc(2024, 4, 30, 8)]
    );
}

#[tokio::test]
async fn test_exhausted_max_count_creates_nothing() {
    let calendar = manager();
    let anchor = utc(2024, 1, 1, 9);
    let root = calendar
        .create(
            NewOccurrence::new("Course", "user-1")
                .schedule(anchor, anchor + Duration::hours(2))
                .with_recurrence(RecurrenceTag::Weekly)
                .max_count(2),
        )
        .await
        .unwrap();

    let first = calendar
        .materialize(&user(), utc(2024, 1, 1, 0), utc(2024, 2, 28, 0))
        .await
        .unwrap();
    assert_eq!(first.created_count(), 2);

    for (start, end) in [
        (utc(2024, 1, 1, 0), utc(2024, 2, 28, 0)),
        (utc(2024, 5, 1, 0), utc(2024, 6, 30, 0)),
    ] {
        let report = calendar.materialize(&user(), start, end).await.unwrap();
        assert_eq!(report.created_count(), 0);
    }
    assert_eq!(
        calendar
            .store()
            .count_children(root.id().unwrap())
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_default_horizon_caps_open_ended_rule() {
    let calendar = manager();
    let anchor = utc(2024, 1, 1, 9);
    calendar
        .create(
            NewOccurrence::new("Standup", "user-1")
                .schedule(anchor, anchor + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::Daily),
        )
        .await
        .unwrap();

    let report = calendar
        .materialize(&user(), utc(2025, 1, 1, 0), utc(2025, 1, 10, 0))
        .await
        .unwrap();
    assert_eq!(report.created_count(), 1);

    let report = calendar
        .materialize(&user(), utc(2025, 2, 1, 0), utc(2025, 2, 10, 0))
        .await
        .unwrap();
    assert_eq!(report.created_count(), 0);
}

#[tokio::test]
async fn test_business_day_groups_generate_nothing() {
    let calendar = manager();
    let anchor = utc(2024, 1, 1, 9);
    calendar
        .create(
            NewOccurrence::new("Office hours", "user-1")
                .schedule(anchor, anchor + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::DailyBusinessDays),
        )
        .await
        .unwrap();

    let report = calendar
        .materialize(&user(), utc(2024, 1, 1, 0), utc(2024, 1, 31, 0))
        .await
        .unwrap();
    assert_eq!(report.roots_processed, 1);
    assert_eq!(report.created_count(), 0);
}

#[tokio::test]
async fn test_moved_child_is_not_recreated_on_its_old_date() {
    let calendar = manager();
    let anchor = utc(2024, 1, 1, 9);
    let root = calendar
        .create(
            NewOccurrence::new("Standup", "user-1")
                .schedule(anchor, anchor + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::Daily),
        )
        .await
        .unwrap();

    let found = calendar
        .occurrences_in_range(&user(), utc(2024, 1, 1, 0), utc(2024, 1, 5, 23))
        .await
        .unwrap();
    let jan_3 = found
        .iter()
        .find(|o| o.start() == Some(utc(2024, 1, 3, 9)))
        .unwrap();

    calendar
        .reschedule(
            jan_3.id().unwrap(),
            utc(2024, 1, 20, 9),
            utc(2024, 1, 20, 9) + Duration::minutes(30),
        )
        .await
        .unwrap();

    let root = calendar.get(root.id().unwrap()).await.unwrap();
    assert!(root.rule().unwrap().is_excluded("2024-01-03"));

    let found = calendar
        .occurrences_in_range(&user(), utc(2024, 1, 1, 0), utc(2024, 1, 5, 23))
        .await
        .unwrap();
    let starts: Vec<_> = found.iter().filter_map(|o| o.start()).collect();
    assert_eq!(
        starts,
        vec![
            utc(2024, 1, 1, 9),
            utc(2024, 1, 2, 9),
            utc(2024, 1, 4, 9),
            utc(2024, 1, 5, 9),
        ]
    );

    // The moved child occupies Jan 20, so no second one appears there
    let around = calendar
        .occurrences_in_range(&user(), utc(2024, 1, 19, 0), utc(2024, 1, 21, 23))
        .await
        .unwrap();
    let starts: Vec<_> = around.iter().filter_map(|o| o.start()).collect();
    assert_eq!(
        starts,
        vec![utc(2024, 1, 19, 9), utc(2024, 1, 20, 9), utc(2024, 1, 21, 9)]
    );
}

#[tokio::test]
async fn test_moving_child_within_its_day_keeps_date_open() {
    let calendar = manager();
    let anchor = utc(2024, 1, 1, 9);
    let root = calendar
        .create(
            NewOccurrence::new("Standup", "user-1")
                .schedule(anchor, anchor + Duration::minutes(30))
                .with_recurrence(RecurrenceTag::Daily),
        )
        .await
        .unwrap();

    let found = calendar
        .occurrences_in_range(&user(), utc(2024, 1, 2, 0), utc(2024, 1, 2, 23))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    calendar
        .reschedule(found[0].id().unwrap(), utc(2024, 1, 2, 14), utc(2024, 1, 2, 15))
        .await
        .unwrap();

    let root = calendar.get(root.id().unwrap()).await.unwrap();
    assert!(root.rule().unwrap().excluded_dates.is_empty());

    let found = calendar
        .occurrences_in_range(&user(), utc(2024, 1, 2, 0), utc(2024, 1, 2, 23))
        .await
        .unwrap();
    let starts: Vec<_> = found.iter().filter_map(|o| o.start()).collect();
    assert_eq!(starts, vec![utc(2024, 1, 2, 14)]);
}
