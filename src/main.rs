//! Cadence CLI Entry Point

use cadence::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

/// Cadence: recurring calendar occurrences
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Owning user for created and listed occurrences
    #[arg(short, long, global = true, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a one-off occurrence or a recurring group
    Create {
        /// Occurrence name
        name: String,
        /// Start (RFC 3339, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD")
        #[arg(short, long)]
        start: Option<String>,
        /// End, same formats as --start
        #[arg(short, long)]
        end: Option<String>,
        /// Recurrence: none, daily, weekly, monthly, daily_business_days
        #[arg(short, long, default_value = "none")]
        recurrence: String,
        /// Stop generating after this instant
        #[arg(long)]
        until: Option<String>,
        /// Maximum number of generated occurrences
        #[arg(long)]
        max_count: Option<u32>,
        /// Copy the root's links onto generated occurrences
        #[arg(long)]
        copy_links: bool,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        discipline: Option<String>,
        #[arg(long)]
        phase: Option<String>,
    },
    /// List occurrences in a range, generating recurring ones first
    List {
        /// Range start (defaults to today)
        #[arg(long)]
        from: Option<String>,
        /// Range end (defaults to seven days after the start)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show a single occurrence
    Show {
        /// Occurrence ID
        id: String,
    },
    /// Mark an occurrence done
    Done {
        /// Occurrence ID
        id: String,
    },
    /// Mark an occurrence open again
    Reopen {
        /// Occurrence ID
        id: String,
    },
    /// Rename an occurrence
    Rename {
        /// Occurrence ID
        id: String,
        /// New name
        name: String,
    },
    /// Move an occurrence to new start and end instants
    Reschedule {
        /// Occurrence ID
        id: String,
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        end: String,
    },
    /// Change only the end of an occurrence
    Resize {
        /// Occurrence ID
        id: String,
        #[arg(short, long)]
        end: String,
    },
    /// Attach links (e.g. project IDs) to an occurrence
    Link {
        /// Occurrence ID
        id: String,
        /// Linked IDs
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// Delete an occurrence
    Delete {
        /// Occurrence ID
        id: String,
        /// Scope: this, future, all
        #[arg(short, long, default_value = "this")]
        scope: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    init_tracing(&config, args.json_logs);

    let json = args.json;
    let user = args.user;

    match args.command {
        Command::Create {
            name,
            start,
            end,
            recurrence,
            until,
            max_count,
            copy_links,
            category,
            kind,
            discipline,
            phase,
        } => {
            let options = cli::types::CreateOptions {
                name,
                user,
                start,
                end,
                recurrence,
                until,
                max_count,
                copy_links,
                category,
                kind,
                discipline,
                phase,
            };
            cli::run_create(&config, options, json).await
        }
        Command::List { from, to } => cli::run_list(&config, user, from, to, json).await,
        Command::Show { id } => cli::run_show(&config, id, json).await,
        Command::Done { id } => cli::run_done(&config, id, json).await,
        Command::Reopen { id } => cli::run_reopen(&config, id, json).await,
        Command::Rename { id, name } => cli::run_rename(&config, id, name, json).await,
        Command::Reschedule { id, start, end } => {
            cli::run_reschedule(&config, id, start, end, json).await
        }
        Command::Resize { id, end } => cli::run_resize(&config, id, end, json).await,
        Command::Link { id, targets } => cli::run_link(&config, id, targets, json).await,
        Command::Delete { id, scope } => cli::run_delete(&config, id, scope, json).await,
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &Config, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if json_logs || config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
