//! Synchronization between the [`EntityCache`](crate::cache::EntityCache) and
//! a [`RemoteStore`](crate::api::RemoteStore).
//!
//! Reads go through [`TripQueries`], writes through [`MutationCoordinator`],
//! and [`Prefetcher`] warms trip details ahead of navigation. All three share
//! the same cache handle.

pub mod coordinator;
pub mod prefetch;
pub mod queries;

pub use coordinator::{Confirmation, EntryDeletion, MutationCoordinator, Navigation};
pub use prefetch::{PrefetchOutcome, Prefetcher};
pub use queries::TripQueries;
