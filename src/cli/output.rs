//! Output formatting for CLI commands.
//!
//! This module handles formatting output as either JSON or human-readable text.

use anyhow::Result;

use cadence::calendar::DeletionReport;
use cadence::occurrence::Occurrence;

use super::types::CommandResult;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Print a single occurrence.
pub fn print_occurrence(occurrence: &Occurrence, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(occurrence)?);
        return Ok(());
    }

    println!("ID: {}", occurrence.id().map(|id| id.as_str()).unwrap_or("-"));
    println!("Name: {}", occurrence.name());
    println!("User: {}", occurrence.user_id());
    println!("Status: {}", occurrence.status());
    match (occurrence.start(), occurrence.end()) {
        (Some(start), Some(end)) => {
            println!("Start: {}", start.format(TIME_FORMAT));
            println!("End: {}", end.format(TIME_FORMAT));
        }
        _ => println!("Unscheduled"),
    }
    println!("Recurrence: {}", occurrence.recurrence());
    if let Some(root_id) = occurrence.root_id() {
        println!("Group root: {}", root_id);
    }
    if let Some(rule) = occurrence.rule() {
        if let Some(until) = rule.until {
            println!("Until: {}", until.format(TIME_FORMAT));
        }
        if let Some(max_count) = rule.max_count {
            println!("Max count: {}", max_count);
        }
        if !rule.excluded_dates.is_empty() {
            println!("Excluded: {}", rule.excluded_dates.join(", "));
        }
    }

    let classification = occurrence.classification();
    for (label, value) in [
        ("Category", &classification.category_id),
        ("Kind", &classification.kind),
        ("Discipline", &classification.discipline_id),
        ("Phase", &classification.phase),
    ] {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    Ok(())
}

/// Print occurrences as a table sorted by start.
pub fn print_occurrences(occurrences: &[Occurrence], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(occurrences)?);
        return Ok(());
    }

    if occurrences.is_empty() {
        println!("No occurrences found.");
        return Ok(());
    }

    println!(
        "{:<16}  {:<5}  {:<6}  {:<19}  {:<36}  NAME",
        "START", "END", "STATUS", "RECURRENCE", "ID"
    );
    for o in occurrences {
        let start = o
            .start()
            .map(|s| s.format(TIME_FORMAT).to_string())
            .unwrap_or_default();
        let end = o
            .end()
            .map(|e| e.format("%H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<16}  {:<5}  {:<6}  {:<19}  {:<36}  {}",
            start,
            end,
            o.status(),
            o.recurrence(),
            o.id().map(|id| id.as_str()).unwrap_or("-"),
            o.name()
        );
    }
    println!("\n{} occurrence(s)", occurrences.len());
    Ok(())
}

/// Print the outcome of a deletion.
pub fn print_deletion(report: &DeletionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Deleted {} occurrence(s) (scope: {})",
        report.deleted, report.scope
    );
    if let Some(promoted) = &report.promoted {
        println!("Promoted {} to group root", promoted);
    }
    Ok(())
}

/// Print a generic command result.
pub fn print_result(result: &CommandResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", result.message);
    }
    Ok(())
}
