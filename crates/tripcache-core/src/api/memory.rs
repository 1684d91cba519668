//! In-process trip store.
//!
//! `MemoryStore` keeps its data behind a mutex inside the value itself, so
//! every test or demo gets an isolated store. It can be seeded with sample
//! fixtures, counts calls per operation, and can be told to fail upcoming
//! calls of a given operation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use tracing::debug;

use super::{RemoteStore, StoreError, StoreResult};
use crate::models::{JournalEntry, Tag, Trip, TripDetail, TripPatch, TripSummary};

/// Store operation, used to count calls and inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListTrips,
    TripDetail,
    DeleteTrip,
    CreateTrip,
    UpdateTrip,
    SaveEntry,
    DeleteEntry,
    ListTags,
}

#[derive(Debug, Default)]
struct MemoryState {
    trips: Vec<Trip>,
    entries: Vec<JournalEntry>,
    tags: Vec<Tag>,
    calls: HashMap<StoreOp, usize>,
    failures: HashMap<StoreOp, VecDeque<StoreError>>,
}

impl MemoryState {
    /// Record a call and pop an injected failure for it, if any
    fn begin(&mut self, op: StoreOp) -> StoreResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.get_mut(&op).and_then(|q| q.pop_front()) {
            Some(err) => {
                debug!(?op, error = %err, "Injected store failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn trip_mut(&mut self, id: &str) -> StoreResult<&mut Trip> {
        self.trips
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::trip_not_found(id))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding three trips, six journal entries and five tags
    pub fn with_sample_data() -> Self {
        let tags = sample_tags();
        let trips = sample_trips(&tags);
        Self::with_data(trips, sample_entries(), tags)
    }

    pub fn with_data(trips: Vec<Trip>, entries: Vec<JournalEntry>, tags: Vec<Tag>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                trips,
                entries,
                tags,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `op` fail with `err`. Failures queue up, one per call.
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// How many times `op` has been called, failed calls included
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn trip_count(&self) -> usize {
        self.lock().trips.len()
    }

    pub fn entry_count(&self, trip_id: &str) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.trip_id == trip_id)
            .count()
    }

    pub fn contains_trip(&self, id: &str) -> bool {
        self.lock().trips.iter().any(|t| t.id == id)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_trips(&self) -> StoreResult<Vec<TripSummary>> {
        let mut state = self.lock();
        state.begin(StoreOp::ListTrips)?;
        Ok(state.trips.iter().map(Trip::summary).collect())
    }

    async fn trip_detail(&self, id: &str) -> StoreResult<TripDetail> {
        let mut state = self.lock();
        state.begin(StoreOp::TripDetail)?;
        let trip = state.trip_mut(id)?.clone();
        let logs = state
            .entries
            .iter()
            .filter(|e| e.trip_id == id)
            .cloned()
            .collect();
        Ok(TripDetail { trip, logs })
    }

    async fn delete_trip(&self, id: &str) -> StoreResult<()> {
        let mut state = self.lock();
        state.begin(StoreOp::DeleteTrip)?;
        let index = state
            .trips
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::trip_not_found(id))?;
        state.trips.remove(index);
        // Journal entries go with their trip
        state.entries.retain(|e| e.trip_id != id);
        Ok(())
    }

    async fn create_trip(&self, trip: &Trip) -> StoreResult<Trip> {
        let mut state = self.lock();
        state.begin(StoreOp::CreateTrip)?;
        if state.trips.iter().any(|t| t.id == trip.id) {
            return Err(StoreError::Unavailable(format!(
                "trip {} already exists",
                trip.id
            )));
        }
        state.trips.push(trip.clone());
        Ok(trip.clone())
    }

    async fn update_trip(&self, id: &str, patch: &TripPatch) -> StoreResult<Trip> {
        let mut state = self.lock();
        state.begin(StoreOp::UpdateTrip)?;
        let trip = state.trip_mut(id)?;
        patch.apply_to_trip(trip);
        trip.updated_at = Utc::now();
        Ok(trip.clone())
    }

    async fn save_entry(&self, entry: &JournalEntry) -> StoreResult<JournalEntry> {
        let mut state = self.lock();
        state.begin(StoreOp::SaveEntry)?;
        state.trip_mut(&entry.trip_id)?;
        match state.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => state.entries.push(entry.clone()),
        }
        Ok(entry.clone())
    }

    async fn delete_entry(&self, trip_id: &str, entry_id: &str) -> StoreResult<()> {
        let mut state = self.lock();
        state.begin(StoreOp::DeleteEntry)?;
        let index = state
            .entries
            .iter()
            .position(|e| e.id == entry_id && e.trip_id == trip_id)
            .ok_or_else(|| StoreError::entry_not_found(trip_id, entry_id))?;
        state.entries.remove(index);
        Ok(())
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let mut state = self.lock();
        state.begin(StoreOp::ListTags)?;
        Ok(state.tags.clone())
    }
}

// ============================================================================
// Sample fixtures
// ============================================================================

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn sample_tags() -> Vec<Tag> {
    vec![
        Tag::new("1", "healing", "#22c55e"),
        Tag::new("2", "food", "#ef4444"),
        Tag::new("3", "nature", "#3b82f6"),
        Tag::new("4", "shopping", "#f59e0b"),
        Tag::new("5", "theme park", "#8b5cf6"),
    ]
}

fn sample_trips(tags: &[Tag]) -> Vec<Trip> {
    let pick = |ids: &[&str]| -> Vec<Tag> {
        tags.iter()
            .filter(|t| ids.contains(&t.id.as_str()))
            .cloned()
            .collect()
    };
    let trip = |id: &str,
                title: &str,
                description: &str,
                location: &str,
                start: NaiveDate,
                end: NaiveDate,
                cover: &str,
                tag_ids: &[&str]| {
        let created = Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap_or_default());
        Trip {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            start_date: start,
            end_date: end,
            cover_image: cover.to_string(),
            tags: pick(tag_ids),
            created_at: created,
            updated_at: created,
        }
    };

    vec![
        trip(
            "1",
            "Tokyo",
            "This time the theme is a first visit to Disneyland",
            "Tokyo",
            day(2024, 3, 10),
            day(2024, 3, 15),
            "/images/tokyo-cover.jpg",
            &["2", "4", "5"],
        ),
        trip(
            "2",
            "Jeju Island",
            "So close that we somehow never go",
            "Jeju",
            day(2024, 5, 1),
            day(2024, 5, 5),
            "/images/jeju-cover.jpg",
            &["1", "2", "3"],
        ),
        trip(
            "3",
            "Osaka",
            "Third time in Osaka already",
            "Osaka",
            day(2024, 7, 20),
            day(2024, 7, 24),
            "",
            &["2", "3", "5"],
        ),
    ]
}

fn sample_entries() -> Vec<JournalEntry> {
    let entry = |id: &str,
                 trip_id: &str,
                 date: NaiveDate,
                 content: &str,
                 images: &[&str],
                 location: &str,
                 mood: &str| {
        JournalEntry {
            id: id.to_string(),
            trip_id: trip_id.to_string(),
            date,
            content: content.to_string(),
            images: images.iter().map(|s| s.to_string()).collect(),
            location: location.to_string(),
            weather: "sunny".to_string(),
            mood: mood.to_string(),
        }
    };

    vec![
        entry(
            "1",
            "1",
            day(2024, 3, 10),
            "Landed in Tokyo. The trip finally starts.",
            &["/images/tokyo-station.jpg"],
            "Tokyo Station",
            "excited",
        ),
        entry(
            "2",
            "1",
            day(2024, 3, 15),
            "First visit to Disneyland, a whole day with the characters.",
            &["/images/tokyo-disney.png", "/images/tokyo-disney2.png"],
            "Tokyo Disneyland",
            "happy",
        ),
        entry(
            "3",
            "2",
            day(2024, 5, 1),
            "Arrived on Jeju. Always a good feeling.",
            &["/images/jeju-airport.jpeg"],
            "Jeju International Airport",
            "happy",
        ),
        entry(
            "4",
            "2",
            day(2024, 5, 2),
            "Seongsan Ilchulbong feels different than on the school trip.",
            &["/images/jeju-sungsan.jpg"],
            "Seongsan Ilchulbong",
            "calm",
        ),
        entry(
            "5",
            "3",
            day(2024, 7, 20),
            "Straight to Dotonbori. Crowded as ever, takoyaki as good as ever.",
            &["/images/osaka-dotonbori.jpg", "/images/osaka-takoyaki.jpg"],
            "Dotonbori",
            "excited",
        ),
        entry(
            "6",
            "3",
            day(2024, 7, 21),
            "Lost track of time at Universal Studios.",
            &["/images/osaka-usj.jpg"],
            "Universal Studios Japan",
            "happy",
        ),
    ]
}
