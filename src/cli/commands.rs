//! CLI command dispatcher.
//!
//! Each `run_*` function executes a command locally and prints its result.

use anyhow::Result;
use cadence::Config;

use super::types::{CommandResult, CreateOptions};
use super::{local, output};

/// Run the create command.
pub async fn run_create(config: &Config, options: CreateOptions, json_output: bool) -> Result<()> {
    let occurrence = local::create(config, options).await?;
    output::print_occurrence(&occurrence, json_output)
}

/// Run the list command.
pub async fn run_list(
    config: &Config,
    user: String,
    from: Option<String>,
    to: Option<String>,
    json_output: bool,
) -> Result<()> {
    let occurrences = local::list(config, user, from, to).await?;
    output::print_occurrences(&occurrences, json_output)
}

/// Run the show command.
pub async fn run_show(config: &Config, id: String, json_output: bool) -> Result<()> {
    let occurrence = local::show(config, id).await?;
    output::print_occurrence(&occurrence, json_output)
}

/// Run the done command.
pub async fn run_done(config: &Config, id: String, json_output: bool) -> Result<()> {
    let occurrence = local::done(config, id).await?;
    output::print_occurrence(&occurrence, json_output)
}

/// Run the reopen command.
pub async fn run_reopen(config: &Config, id: String, json_output: bool) -> Result<()> {
    let occurrence = local::reopen(config, id).await?;
    output::print_occurrence(&occurrence, json_output)
}

/// Run the rename command.
pub async fn run_rename(
    config: &Config,
    id: String,
    name: String,
    json_output: bool,
) -> Result<()> {
    let occurrence = local::rename(config, id, name).await?;
    output::print_occurrence(&occurrence, json_output)
}

/// Run the reschedule command.
pub async fn run_reschedule(
    config: &Config,
    id: String,
    start: String,
    end: String,
    json_output: bool,
) -> Result<()> {
    let occurrence = local::reschedule(config, id, start, end).await?;
    output::print_occurrence(&occurrence, json_output)
}

/// Run the resize command.
pub async fn run_resize(config: &Config, id: String, end: String, json_output: bool) -> Result<()> {
    let occurrence = local::resize(config, id, end).await?;
    output::print_occurrence(&occurrence, json_output)
}

/// Run the link command.
pub async fn run_link(
    config: &Config,
    id: String,
    targets: Vec<String>,
    json_output: bool,
) -> Result<()> {
    let count = targets.len();
    local::link(config, id.clone(), targets.clone()).await?;
    let result = CommandResult {
        success: true,
        message: format!("Linked {} target(s) to {}", count, id),
        data: serde_json::json!({ "id": id, "linked": targets }),
    };
    output::print_result(&result, json_output)
}

/// Run the delete command.
pub async fn run_delete(
    config: &Config,
    id: String,
    scope: String,
    json_output: bool,
) -> Result<()> {
    let report = local::delete(config, id, scope).await?;
    output::print_deletion(&report, json_output)
}
