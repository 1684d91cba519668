//! Core library for tripcache.
//!
//! A travel-journal client keeps trips, tags and dated journal entries in a
//! local query cache that is synchronized with a remote store:
//!
//! - [`api`]: the [`RemoteStore`] trait plus an HTTP and an in-memory store
//! - [`cache`]: the keyed [`EntityCache`] with freshness and in-flight dedup
//! - [`sync`]: query functions, optimistic mutations and prefetching
//! - [`models`]: wire types shared by all of the above

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod sync;
pub mod utils;

pub use api::{HttpStore, MemoryStore, RemoteStore, StoreError};
pub use cache::{CacheConfig, EntityCache, QueryData, QueryKey};
pub use config::Config;
pub use error::{TripError, ValidationError};
pub use models::{EntryDraft, JournalEntry, NewTrip, Tag, Trip, TripDetail, TripPatch, TripSummary};
pub use sync::{
    Confirmation, EntryDeletion, MutationCoordinator, Navigation, PrefetchOutcome, Prefetcher,
    TripQueries,
};
