//! Data models for travel-journal entities.
//!
//! - `Trip`, `TripSummary`, `TripDetail`: a trip and its list/detail projections
//! - `TripPatch`, `NewTrip`: user input for editing and creating trips
//! - `JournalEntry`, `EntryDraft`: dated journal entries with photos
//! - `Tag`: colored labels attached to trips
//!
//! Field names on the wire are camelCase, dates are ISO-8601.

pub mod journal;
pub mod tag;
pub mod trip;

pub use journal::{sort_entries, EntryDraft, JournalEntry, MAX_ENTRY_IMAGES};
pub use tag::{Tag, DEFAULT_TAG_COLOR, MAX_TRIP_TAGS};
pub use trip::{validate_date_range, NewTrip, Trip, TripDetail, TripPatch, TripSummary};

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of locally generated identifiers.
const LOCAL_ID_LENGTH: usize = 12;

/// Generate an opaque identifier for an entity created on this client.
///
/// The store accepts client-assigned ids, so the optimistic cache entry never
/// has to be re-keyed once the create call succeeds.
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LOCAL_ID_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
