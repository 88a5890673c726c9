//! Load-state bookkeeping shared by every store.

use std::time::Instant;

use linkwatch_client::FetchError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Which response wins when fetches on one store overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Whichever response arrives last is kept, regardless of issue order.
    #[default]
    LastArrival,
    /// Only the response to the most recently issued request is kept;
    /// responses to older requests are discarded.
    LatestRequest,
}

/// Lifecycle of a store's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing has been fetched successfully yet.
    Empty,
    /// At least one fetch is outstanding.
    Loading,
    /// A successfully fetched value is held.
    Ready,
}

/// Point-in-time view of a store's load state.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub state: LoadState,
    /// The held value predates the most recent failed fetch.
    pub stale: bool,
    /// Error from the most recent failed fetch, cleared on success.
    pub last_error: Option<FetchError>,
    /// When the value was last replaced by a successful fetch.
    pub last_success: Option<Instant>,
    /// How many times the store has published.
    pub publications: u64,
}

#[derive(Debug, Default)]
struct Meta {
    issued: u64,
    in_flight: usize,
    ready: bool,
    stale: bool,
    last_error: Option<FetchError>,
    last_success: Option<Instant>,
}

/// Tracks outstanding requests and the outcome of the last one.
#[derive(Debug)]
pub(crate) struct Tracker {
    meta: Mutex<Meta>,
    ordering: ResponseOrdering,
}

impl Tracker {
    pub(crate) fn new(ordering: ResponseOrdering) -> Self {
        Self {
            meta: Mutex::new(Meta::default()),
            ordering,
        }
    }

    pub(crate) fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Mark a request as issued. The guard keeps the store in `Loading`
    /// until it is resolved or dropped.
    pub(crate) fn begin(&self) -> InFlight<'_> {
        let mut meta = self.meta.lock();
        meta.issued += 1;
        meta.in_flight += 1;
        InFlight {
            tracker: self,
            generation: meta.issued,
        }
    }

    pub(crate) fn status(&self, publications: u64) -> StoreStatus {
        let meta = self.meta.lock();
        let state = if meta.in_flight > 0 {
            LoadState::Loading
        } else if meta.ready {
            LoadState::Ready
        } else {
            LoadState::Empty
        };
        StoreStatus {
            state,
            stale: meta.stale,
            last_error: meta.last_error.clone(),
            last_success: meta.last_success,
            publications,
        }
    }

    fn superseded(&self, meta: &Meta, generation: u64) -> bool {
        self.ordering == ResponseOrdering::LatestRequest && generation != meta.issued
    }
}

/// An outstanding request. Dropping it without resolving (for example when
/// the calling future is dropped) just ends the `Loading` state.
#[must_use]
pub(crate) struct InFlight<'a> {
    tracker: &'a Tracker,
    generation: u64,
}

impl InFlight<'_> {
    /// Record a successful response and run `apply` to install it, both
    /// under the tracker lock so no newer response can land in between.
    /// Returns `false`, without running `apply`, if the response was
    /// superseded.
    pub(crate) fn succeed_with(self, apply: impl FnOnce()) -> bool {
        let mut meta = self.tracker.meta.lock();
        if self.tracker.superseded(&meta, self.generation) {
            return false;
        }
        meta.ready = true;
        meta.stale = false;
        meta.last_error = None;
        meta.last_success = Some(Instant::now());
        apply();
        true
    }

    /// Record a failed response. The held value is left alone.
    pub(crate) fn fail(self, err: &FetchError) {
        let mut meta = self.tracker.meta.lock();
        if self.tracker.superseded(&meta, self.generation) {
            return;
        }
        meta.stale = meta.ready;
        meta.last_error = Some(err.clone());
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut meta = self.tracker.meta.lock();
        meta.in_flight = meta.in_flight.saturating_sub(1);
    }
}
