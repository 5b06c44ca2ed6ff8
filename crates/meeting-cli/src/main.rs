//! `meet` CLI — meeting suggestions, conflict checks, free time and a local
//! event store from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Rank meeting times for a request with embedded attendee availability
//! meet suggest -i request.json
//!
//! # Same, with scoring weights and defaults from a TOML file
//! meet --config meet.toml suggest -i request.json --now 2026-03-01T09:00:00Z
//!
//! # Events from a JSON array that overlap an interval
//! meet conflicts -i events.json --start 2026-03-02T10:00:00Z --end 2026-03-02T11:00:00Z
//!
//! # Free gaps of at least 30 minutes
//! meet free -i events.json --start 2026-03-02T09:00:00Z --end 2026-03-02T17:00:00Z --min-minutes 30
//!
//! # Local event store
//! meet events --db calendar.db add -i event.json
//! meet events --db calendar.db list --start 2026-03-01T00:00:00Z --end 2026-04-01T00:00:00Z
//! meet events --db calendar.db delete standup
//! ```

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, LevelFilter};
use meeting_engine::{
    conflicts, find_free_slots, AvailabilityMap, CalendarEvent, EngineConfig, SuggestionRequest,
};
use meeting_sync::{
    AggregatorConfig, AvailabilityAggregator, BatchPolicy, CancelSignal, EventService,
    EventStore, MeetingPlanner, RangeQuery, SqliteEventStore, StaticAvailability,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "meet", version, about = "Meeting scheduling and calendar tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with [scoring] weights and [suggestions] defaults
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidate meeting times for a request
    Suggest {
        /// Request JSON with an "availability" map (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Reference instant for recency scoring (defaults to now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// List events that overlap an interval
    Conflicts {
        /// JSON array of events (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        /// Event id to ignore, e.g. the event being rescheduled
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Compute free gaps between events inside a window
    Free {
        /// JSON array of events (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        /// Drop gaps shorter than this many minutes
        #[arg(long, default_value_t = 0)]
        min_minutes: i64,
    },
    /// Manage events in a local SQLite store
    Events {
        /// Path to the SQLite database (created if missing)
        #[arg(long)]
        db: String,
        #[command(subcommand)]
        action: EventsAction,
    },
}

#[derive(Subcommand)]
enum EventsAction {
    /// Store one event or a JSON array of events
    Add {
        /// Event JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Keep adding after an invalid event instead of stopping
        #[arg(long)]
        keep_going: bool,
    },
    /// Print events overlapping an interval
    List {
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long)]
        calendar: Option<String>,
    },
    /// Delete an event by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.config.as_deref() {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Suggest { input, output, now } => {
            let raw = read_input(input.as_deref())?;
            let (request, availability) = parse_suggest_input(&raw, &config)?;
            debug!(
                "event=cli_suggest module=cli status=start attendees={} known={}",
                request.attendees.len(),
                availability.len()
            );

            let planner = MeetingPlanner::new(
                AvailabilityAggregator::new(
                    Arc::new(StaticAvailability::new(availability)),
                    AggregatorConfig::default(),
                ),
                config.scoring.clone(),
            );
            let suggestions = planner
                .suggest_at(&request, now.unwrap_or_else(Utc::now), &CancelSignal::never())
                .await
                .context("Failed to compute suggestions")?;

            let json = serde_json::to_string_pretty(&suggestions)?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Conflicts {
            input,
            start,
            end,
            exclude,
        } => {
            ensure_ordered(start, end)?;
            let events = read_events(input.as_deref())?;
            let overlapping = conflicts(start, end, &events, exclude.as_deref());
            println!("{}", serde_json::to_string_pretty(&overlapping)?);
        }
        Commands::Free {
            input,
            start,
            end,
            min_minutes,
        } => {
            ensure_ordered(start, end)?;
            let events = read_events(input.as_deref())?;
            let busy: Vec<CalendarEvent> =
                events.into_iter().filter(CalendarEvent::is_blocking).collect();
            let free: Vec<_> = find_free_slots(&busy, start, end)
                .into_iter()
                .filter(|slot| slot.duration_minutes >= min_minutes)
                .collect();
            println!("{}", serde_json::to_string_pretty(&free)?);
        }
        Commands::Events { db, action } => {
            let store: Arc<dyn EventStore> = Arc::new(
                SqliteEventStore::open(&db)
                    .with_context(|| format!("Failed to open event store: {}", db))?,
            );
            run_events(store, action).await?;
        }
    }

    Ok(())
}

async fn run_events(store: Arc<dyn EventStore>, action: EventsAction) -> Result<()> {
    match action {
        EventsAction::Add { input, keep_going } => {
            let raw = read_input(input.as_deref())?;
            let value: Value = serde_json::from_str(&raw).context("Failed to parse event JSON")?;
            let service = EventService::local(store);

            if value.is_array() {
                let events: Vec<CalendarEvent> =
                    serde_json::from_value(value).context("Failed to parse event JSON")?;
                let policy = if keep_going {
                    BatchPolicy::ContinueOnError
                } else {
                    BatchPolicy::AbortOnFirstError
                };
                let report = service
                    .batch_create_events(&events, policy)
                    .await
                    .context("Failed to store events")?;
                for failure in &report.failures {
                    eprintln!("event {} not stored: {}", failure.index, failure.error);
                }
                println!("{}", serde_json::to_string_pretty(&report.completed)?);
                if !report.is_success() {
                    anyhow::bail!(
                        "{} of {} events could not be stored",
                        report.failures.len(),
                        events.len()
                    );
                }
            } else {
                let event: CalendarEvent =
                    serde_json::from_value(value).context("Failed to parse event JSON")?;
                let outcome = service
                    .create_event(&event)
                    .await
                    .context("Failed to store event")?;
                println!("{}", serde_json::to_string_pretty(&outcome.value)?);
            }
        }
        EventsAction::List {
            start,
            end,
            calendar,
        } => {
            ensure_ordered(start, end)?;
            let mut query = RangeQuery::new(start, end);
            if let Some(calendar) = calendar {
                query = query.in_calendar(calendar);
            }
            let events = store
                .events_in_range(&query)
                .await
                .context("Failed to query events")?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        EventsAction::Delete { id } => {
            let outcome = EventService::local(store)
                .delete_event(&id)
                .await
                .context("Failed to delete event")?;
            if outcome.value {
                println!("Deleted {}", id);
            } else {
                println!("No event with id '{}'; nothing deleted", id);
            }
        }
    }
    Ok(())
}

/// Split a suggest document into the request and its `availability` map.
///
/// A request without `options` takes the `[suggestions]` defaults from the
/// configuration.
fn parse_suggest_input(
    raw: &str,
    config: &EngineConfig,
) -> Result<(SuggestionRequest, AvailabilityMap)> {
    let mut value: Value = serde_json::from_str(raw).context("Failed to parse request JSON")?;
    let object = value
        .as_object_mut()
        .context("Request JSON must be an object")?;

    let availability = match object.remove("availability") {
        Some(map) => serde_json::from_value(map).context("Failed to parse availability map")?,
        None => AvailabilityMap::new(),
    };
    if !object.contains_key("options") {
        object.insert(
            "options".to_string(),
            serde_json::to_value(&config.suggestions)?,
        );
    }

    let request = serde_json::from_value(value).context("Failed to parse request JSON")?;
    Ok((request, availability))
}

fn ensure_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        anyhow::bail!("--end ({}) must be after --start ({})", end, start);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}

fn read_events(path: Option<&str>) -> Result<Vec<CalendarEvent>> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse events JSON")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
