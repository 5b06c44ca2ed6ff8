//! # meeting-engine
//!
//! Deterministic meeting-time suggestions for calendar agents.
//!
//! Given a meeting duration, a set of attendees with known availability,
//! preferred wall-clock windows and a date range, the engine enumerates
//! candidate slots, checks them against every attendee's busy time and ranks
//! them with a multi-factor score. Everything here is synchronous and free of
//! I/O; fetching availability and persisting events live in `meeting-sync`.
//!
//! ## Modules
//!
//! - [`event`], [`calendar`], [`metadata`] — Data model and validation
//! - [`interval`] — Half-open interval arithmetic
//! - [`conflict`] — Detect overlapping events
//! - [`freebusy`] — Compute free time slots from busy intervals
//! - [`window`], [`dst`] — Wall-clock windows, date ranges, DST policies
//! - [`slots`] — Candidate slot generation
//! - [`availability`] — Per-attendee and combined availability scores
//! - [`scorer`] — Suggestion scoring and ranking
//! - [`suggest`] — The end-to-end pipeline
//! - [`config`] — TOML configuration
//! - [`error`] — Error types

pub mod availability;
pub mod calendar;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod event;
pub mod freebusy;
pub mod interval;
pub mod metadata;
pub mod options;
pub mod scorer;
pub mod slot;
pub mod slots;
pub mod suggest;
pub mod window;

pub use availability::{availability_from_events, AvailabilityMap};
pub use calendar::Calendar;
pub use config::EngineConfig;
pub use conflict::{conflicts, find_conflicts, Conflict};
pub use dst::DstPolicy;
pub use error::{EngineError, ValidationError};
pub use event::{
    Attachment, Attendee, AttendeeStatus, CalendarEvent, EventSource, EventStatus,
    RecurrenceRule, Reminder, ReminderMethod, Visibility,
};
pub use freebusy::{find_free_slots, FreeSlot};
pub use interval::Interval;
pub use metadata::{Metadata, MetadataValue};
pub use options::SuggestionOptions;
pub use scorer::{ScoringWeights, SuggestionScorer};
pub use slot::{AvailabilityStatus, MeetingSuggestion, TimeSlot};
pub use slots::SlotGenerator;
pub use suggest::{suggest_meetings, SuggestionRequest};
pub use window::{DateRange, TimeWindow};
