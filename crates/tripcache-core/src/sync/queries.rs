use std::sync::Arc;

use futures::FutureExt;
use tracing::debug;

use crate::api::{RemoteStore, StoreError};
use crate::cache::{EntityCache, FetchFuture, QueryData, QueryKey};
use crate::error::TripError;
use crate::models::{Tag, TripDetail, TripSummary};

/// Read-through queries for trips and tags.
///
/// Every read is served by the cache when fresh and shares any fetch already
/// pending for the same key.
#[derive(Clone)]
pub struct TripQueries {
    store: Arc<dyn RemoteStore>,
    cache: EntityCache,
}

impl TripQueries {
    pub fn new(store: Arc<dyn RemoteStore>, cache: EntityCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    pub async fn trips(&self) -> Result<Vec<TripSummary>, TripError> {
        let key = QueryKey::TripList;
        let data = self.cache.query(key.clone(), self.fetch_trips()).await?;
        data.into_trip_list().ok_or_else(|| mismatch(&key))
    }

    /// A trip with its journal entries sorted by date
    pub async fn trip(&self, id: &str) -> Result<TripDetail, TripError> {
        let key = QueryKey::detail(id);
        let data = self.cache.query(key.clone(), self.fetch_trip(id)).await?;
        data.into_trip_detail()
            .map(|detail| detail.for_display())
            .ok_or_else(|| mismatch(&key))
    }

    pub async fn tags(&self) -> Result<Vec<Tag>, TripError> {
        let key = QueryKey::Tags;
        let data = self.cache.query(key.clone(), self.fetch_tags()).await?;
        data.into_tags().ok_or_else(|| mismatch(&key))
    }

    /// The cached detail as stored, without fetching
    pub fn cached_trip(&self, id: &str) -> Option<TripDetail> {
        self.cache
            .get(&QueryKey::detail(id))
            .and_then(QueryData::into_trip_detail)
    }

    pub fn cached_trips(&self) -> Option<Vec<TripSummary>> {
        self.cache
            .get(&QueryKey::TripList)
            .and_then(QueryData::into_trip_list)
    }

    pub fn cached_tags(&self) -> Option<Vec<Tag>> {
        self.cache.get(&QueryKey::Tags).and_then(QueryData::into_tags)
    }

    // ===== Fetch builders =====

    pub(crate) fn fetch_trips(&self) -> impl FnOnce() -> FetchFuture {
        let store = Arc::clone(&self.store);
        move || {
            async move {
                debug!("Fetching trip list");
                store.list_trips().await.map(QueryData::TripList)
            }
            .boxed()
        }
    }

    pub(crate) fn fetch_trip(&self, id: &str) -> impl FnOnce() -> FetchFuture {
        let store = Arc::clone(&self.store);
        let id = id.to_string();
        move || {
            async move {
                debug!(trip_id = %id, "Fetching trip detail");
                store.trip_detail(&id).await.map(QueryData::TripDetail)
            }
            .boxed()
        }
    }

    pub(crate) fn fetch_tags(&self) -> impl FnOnce() -> FetchFuture {
        let store = Arc::clone(&self.store);
        move || {
            async move {
                debug!("Fetching tags");
                store.list_tags().await.map(QueryData::Tags)
            }
            .boxed()
        }
    }
}

fn mismatch(key: &QueryKey) -> TripError {
    StoreError::Unavailable(format!("unexpected cached value for {}", key)).into()
}
