//! tripcache - command line access to a travel journal.
//!
//! Reads go through the same cache and mutation layer a graphical front end
//! would use, against the HTTP service named in the config file.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tripcache_core::utils::{format_date_range, format_tags, truncate_string};
use tripcache_core::{
    Config, Confirmation, EntityCache, EntryDeletion, HttpStore, MutationCoordinator, TripError,
    TripQueries,
};

/// Width of the description column in `list`
const DESCRIPTION_WIDTH: usize = 48;

const USAGE: &str = "\
Usage: tripcache <command>

Commands:
  list                            List all trips
  show <trip-id>                  Show a trip and its journal
  delete <trip-id>                Delete a trip and its journal
  delete-entry <trip-id> <entry>  Delete a single journal entry
  tags                            List the tag catalog
  --help                          Show this message

Environment:
  TRIPCACHE_API_URL               Overrides the configured service URL
  RUST_LOG                        Log filter (default: warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

enum Command {
    List,
    Show(String),
    Delete(String),
    DeleteEntry(String, String),
    Tags,
    Help,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let arg = |i: usize, name: &str| -> Result<String> {
            args.get(i)
                .cloned()
                .with_context(|| format!("missing <{}>\n\n{}", name, USAGE))
        };

        match args.first().map(String::as_str) {
            None | Some("--help") | Some("-h") | Some("help") => Ok(Command::Help),
            Some("list") => Ok(Command::List),
            Some("show") => Ok(Command::Show(arg(1, "trip-id")?)),
            Some("delete") => Ok(Command::Delete(arg(1, "trip-id")?)),
            Some("delete-entry") => Ok(Command::DeleteEntry(
                arg(1, "trip-id")?,
                arg(2, "entry")?,
            )),
            Some("tags") => Ok(Command::Tags),
            Some(other) => bail!("unknown command '{}'\n\n{}", other, USAGE),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if let Command::Help = command {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load().context("Failed to load config")?;
    debug!(url = %config.api_base_url, "Using trip service");
    let store = HttpStore::from_config(&config)?;
    let queries = TripQueries::new(Arc::new(store), EntityCache::new(config.cache_config()));
    let coordinator = MutationCoordinator::new(queries.clone());

    let result = match command {
        Command::List => list(&queries).await,
        Command::Show(id) => show(&queries, &id).await,
        Command::Delete(id) => delete_trip(&coordinator, &id).await,
        Command::DeleteEntry(trip_id, entry_id) => {
            delete_entry(&coordinator, &trip_id, &entry_id).await
        }
        Command::Tags => tags(&queries).await,
        Command::Help => Ok(()),
    };

    if let Err(e) = result {
        info!(error = %e, "Command failed");
        bail!("{}", failure_message(&e));
    }
    Ok(())
}

async fn list(queries: &TripQueries) -> Result<(), TripError> {
    let mut trips = queries.trips().await?;
    trips.sort_by_key(|t| t.start_date);

    if trips.is_empty() {
        println!("No trips yet.");
    }
    for trip in &trips {
        println!(
            "{:<14} {:<24} {:<28} {}",
            trip.id,
            truncate_string(&trip.title, 24),
            format_date_range(trip.start_date, trip.end_date),
            truncate_string(&trip.description, DESCRIPTION_WIDTH),
        );
    }
    Ok(())
}

async fn show(queries: &TripQueries, id: &str) -> Result<(), TripError> {
    let detail = queries.trip(id).await?;
    let trip = &detail.trip;

    println!("{}", trip.title);
    println!("  {}", format_date_range(trip.start_date, trip.end_date));
    if !trip.location.is_empty() {
        println!("  {}", trip.location);
    }
    if !trip.tags.is_empty() {
        println!("  {}", format_tags(&trip.tags));
    }
    println!(
        "  updated {}",
        trip.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    if !trip.description.is_empty() {
        println!("\n{}", trip.description);
    }

    for entry in &detail.logs {
        println!("\n[{}] {} ({})", entry.date, entry.location, entry.id);
        if !entry.content.is_empty() {
            println!("  {}", entry.content);
        }
        if !entry.images.is_empty() {
            println!("  {} photo(s)", entry.images.len());
        }
    }
    Ok(())
}

async fn delete_trip(coordinator: &MutationCoordinator, id: &str) -> Result<(), TripError> {
    let detail = coordinator.queries().trip(id).await?;
    let prompt = format!(
        "Delete '{}' and its {} journal entries?",
        detail.trip.title,
        detail.logs.len()
    );
    if confirm(&prompt) == Confirmation::Declined {
        println!("Cancelled.");
        return Ok(());
    }

    coordinator.delete_trip(id).await?;
    println!("Deleted.");
    Ok(())
}

async fn delete_entry(
    coordinator: &MutationCoordinator,
    trip_id: &str,
    entry_id: &str,
) -> Result<(), TripError> {
    let answer = confirm("Delete this journal entry?");
    match coordinator.delete_entry(trip_id, entry_id, answer).await? {
        EntryDeletion::Deleted => println!("Deleted."),
        EntryDeletion::Cancelled => println!("Cancelled."),
    }
    Ok(())
}

async fn tags(queries: &TripQueries) -> Result<(), TripError> {
    for tag in queries.tags().await? {
        println!("{:<14} {:<9} {}", tag.id, tag.color, tag.name);
    }
    Ok(())
}

/// One-line description of a failed command. Nothing is retried or
/// refreshed after a failure, so a missing item is reported as-is.
fn failure_message(e: &TripError) -> String {
    if e.is_not_found() {
        e.to_string()
    } else {
        e.user_message()
    }
}

/// Ask a y/N question on stdin. Anything but an explicit yes declines.
fn confirm(prompt: &str) -> Confirmation {
    print!("{} [y/N] ", prompt);
    let _ = io::stdout().flush();

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return Confirmation::Declined;
    }
    Confirmation::from(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
