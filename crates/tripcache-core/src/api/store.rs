use async_trait::async_trait;

use super::StoreError;
use crate::models::{JournalEntry, Tag, Trip, TripDetail, TripPatch, TripSummary};

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the trip service supports.
///
/// Implementations perform the call and nothing else: no caching, no retries
/// beyond what the transport itself does, and every failure is returned as a
/// [`StoreError`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All trips in list form. Order is not significant.
    async fn list_trips(&self) -> StoreResult<Vec<TripSummary>>;

    /// A trip with its journal. `NotFound` when the id is unknown.
    async fn trip_detail(&self, id: &str) -> StoreResult<TripDetail>;

    /// `NotFound` when the id is unknown.
    async fn delete_trip(&self, id: &str) -> StoreResult<()>;

    /// Store a trip under the id the client assigned.
    async fn create_trip(&self, trip: &Trip) -> StoreResult<Trip>;

    async fn update_trip(&self, id: &str, patch: &TripPatch) -> StoreResult<Trip>;

    /// Insert or replace an entry, keyed by its id.
    async fn save_entry(&self, entry: &JournalEntry) -> StoreResult<JournalEntry>;

    async fn delete_entry(&self, trip_id: &str, entry_id: &str) -> StoreResult<()>;

    async fn list_tags(&self) -> StoreResult<Vec<Tag>>;
}
