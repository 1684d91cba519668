//! Local query cache.
//!
//! This module provides the `EntityCache`, the single source of truth for what
//! the presentation layer renders. Values are keyed by [`QueryKey`]:
//!
//! - `("list")`: the trip summaries
//! - `("detail", id)`: one trip with its journal
//! - `("tags")`: the global tag set
//!
//! Values are fresh for a configurable window (5 minutes by default). Stale
//! values are still served while a background re-fetch runs, and concurrent
//! readers of one key share a single pending fetch.

pub mod entry;
pub mod key;
pub mod query;

pub use entry::CachedData;
pub use key::{QueryData, QueryKey};
pub use query::{CacheConfig, EntityCache, FetchFuture, FetchState};
