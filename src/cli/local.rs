//! Local execution via CalendarManager.
//!
//! This module opens the configured store and executes CLI commands directly.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use cadence::{
    calendar::{CalendarManager, DeleteScope, DeletionReport},
    occurrence::{NewOccurrence, Occurrence, OccurrenceId, RecurrenceTag, UserId},
    recurrence::start_of_day,
    storage::{create_store, EmbeddedOccurrenceStore},
    Config,
};

use super::types::{parse_datetime, parse_range_end, CreateOptions};

async fn open(config: &Config) -> Result<CalendarManager<EmbeddedOccurrenceStore>> {
    let store = create_store(config)
        .await
        .context("failed to open occurrence store")?;
    Ok(CalendarManager::with_config(Arc::new(store), config))
}

/// Create a one-off occurrence or a recurring group root.
pub async fn create(config: &Config, options: CreateOptions) -> Result<Occurrence> {
    let recurrence: RecurrenceTag = options.recurrence.parse()?;

    let mut input = NewOccurrence::new(options.name, options.user).with_recurrence(recurrence);
    input.start = options.start.as_deref().map(parse_datetime).transpose()?;
    input.end = options.end.as_deref().map(parse_datetime).transpose()?;
    input.rule.until = options.until.as_deref().map(parse_range_end).transpose()?;
    input.rule.max_count = options.max_count;
    input.rule.copy_links = options.copy_links;
    input.classification.category_id = options.category;
    input.classification.kind = options.kind;
    input.classification.discipline_id = options.discipline;
    input.classification.phase = options.phase;

    let calendar = open(config).await?;
    Ok(calendar.create(input).await?)
}

/// Materialize and list occurrences in a range.
pub async fn list(
    config: &Config,
    user: String,
    from: Option<String>,
    to: Option<String>,
) -> Result<Vec<Occurrence>> {
    let start = match from {
        Some(from) => parse_datetime(&from)?,
        None => start_of_day(Utc::now().date_naive()),
    };
    let end = match to {
        Some(to) => parse_range_end(&to)?,
        None => start + Duration::days(7),
    };

    let calendar = open(config).await?;
    Ok(calendar
        .occurrences_in_range(&UserId::from(user), start, end)
        .await?)
}

pub async fn show(config: &Config, id: String) -> Result<Occurrence> {
    let calendar = open(config).await?;
    Ok(calendar.get(&OccurrenceId::from(id)).await?)
}

pub async fn done(config: &Config, id: String) -> Result<Occurrence> {
    let calendar = open(config).await?;
    Ok(calendar.mark_done(&OccurrenceId::from(id)).await?)
}

pub async fn reopen(config: &Config, id: String) -> Result<Occurrence> {
    let calendar = open(config).await?;
    Ok(calendar.reopen(&OccurrenceId::from(id)).await?)
}

pub async fn rename(config: &Config, id: String, name: String) -> Result<Occurrence> {
    let calendar = open(config).await?;
    Ok(calendar.rename(&OccurrenceId::from(id), &name).await?)
}

pub async fn reschedule(
    config: &Config,
    id: String,
    start: String,
    end: String,
) -> Result<Occurrence> {
    let start = parse_datetime(&start)?;
    let end = parse_datetime(&end)?;
    let calendar = open(config).await?;
    Ok(calendar
        .reschedule(&OccurrenceId::from(id), start, end)
        .await?)
}

pub async fn resize(config: &Config, id: String, end: String) -> Result<Occurrence> {
    let end = parse_datetime(&end)?;
    let calendar = open(config).await?;
    Ok(calendar.resize(&OccurrenceId::from(id), end).await?)
}

pub async fn link(config: &Config, id: String, targets: Vec<String>) -> Result<()> {
    let calendar = open(config).await?;
    calendar.link(&OccurrenceId::from(id), &targets).await?;
    Ok(())
}

pub async fn delete(config: &Config, id: String, scope: String) -> Result<DeletionReport> {
    let scope: DeleteScope = scope.parse()?;
    let calendar = open(config).await?;
    Ok(calendar.delete(&OccurrenceId::from(id), scope).await?)
}
