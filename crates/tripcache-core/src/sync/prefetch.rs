use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::queries::TripQueries;
use crate::cache::{FetchState, QueryKey};

/// Result of a prefetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// The detail is cached and fresh.
    Fresh,
    /// A fetch for the detail is already pending.
    InFlight,
    /// A background fetch was spawned.
    Started,
    /// Not called from inside a tokio runtime, so nothing could be spawned.
    NoRuntime,
}

impl From<FetchState> for PrefetchOutcome {
    fn from(state: FetchState) -> Self {
        match state {
            FetchState::Fresh => PrefetchOutcome::Fresh,
            FetchState::InFlight => PrefetchOutcome::InFlight,
            FetchState::Started => PrefetchOutcome::Started,
        }
    }
}

/// Warms trip details before the user opens them, e.g. on hover.
///
/// Prefetching never blocks and never reports fetch errors; a failed prefetch
/// simply leaves the cache as it was and the later read fetches again.
#[derive(Clone)]
pub struct Prefetcher {
    queries: TripQueries,
}

impl Prefetcher {
    pub fn new(queries: TripQueries) -> Self {
        Self { queries }
    }

    pub fn prefetch(&self, trip_id: &str) -> PrefetchOutcome {
        if Handle::try_current().is_err() {
            warn!(trip_id = %trip_id, "Prefetch requested outside a runtime, skipping");
            return PrefetchOutcome::NoRuntime;
        }

        let outcome: PrefetchOutcome = self
            .queries
            .cache()
            .fetch_in_background(QueryKey::detail(trip_id), self.queries.fetch_trip(trip_id))
            .into();
        debug!(trip_id = %trip_id, ?outcome, "Prefetch");
        outcome
    }

    /// Prefetch every trip in the cached list. Returns how many fetches were
    /// started.
    pub fn prefetch_listed(&self) -> usize {
        let Some(trips) = self.queries.cached_trips() else {
            return 0;
        };
        trips
            .iter()
            .filter(|s| self.prefetch(&s.id) == PrefetchOutcome::Started)
            .count()
    }
}
