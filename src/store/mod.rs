//! Observable stores for registry and telemetry state.
//!
//! Every store owns one value behind an [`Observable`] cell and exposes the
//! same read surface: `current()`, `subscribe()`, `watch()` and `status()`.
//! A fetch replaces the value wholesale on success and leaves it untouched
//! on failure; the error is always returned to the caller.
//!
//! ```text
//!   fetch ──▶ Tracker::begin ──▶ RemoteClient::get_json ──▶ decode
//!                                                             │
//!                      ┌──────────── ok ──────────────────────┤
//!                      ▼                                      ▼ err
//!              Observable::replace                    InFlight::fail
//!                      │                              (value kept, stale)
//!                      ▼
//!        callbacks + watch receivers
//! ```

mod observable;
mod registry;
mod status;
mod telemetry;

pub use observable::{Observable, Subscription};
pub use registry::RegistryStore;
pub use status::{LoadState, ResponseOrdering, StoreStatus};
pub use telemetry::{EntityTelemetry, TelemetryStore};

use std::sync::Arc;

use tokio::sync::watch;

use status::{InFlight, Tracker};

/// An observable value plus its load-state bookkeeping.
#[derive(Debug)]
pub(crate) struct Store<T> {
    cell: Observable<T>,
    tracker: Tracker,
}

impl<T: Send + Sync + 'static> Store<T> {
    pub(crate) fn new(initial: T, ordering: ResponseOrdering) -> Self {
        Self {
            cell: Observable::new(initial),
            tracker: Tracker::new(ordering),
        }
    }

    pub(crate) fn begin(&self) -> InFlight<'_> {
        self.tracker.begin()
    }

    pub(crate) fn get(&self) -> Arc<T> {
        self.cell.get()
    }

    /// Install `value` if `request` still counts, then publish it.
    ///
    /// The swap happens under the tracker lock; publication follows outside
    /// it so callbacks may read `status()`.
    pub(crate) fn commit(&self, request: InFlight<'_>, value: T) -> bool {
        let applied = request.succeed_with(|| self.cell.set_silently(value));
        if applied {
            self.cell.publish();
        }
        applied
    }

    pub(crate) fn modify_silently<R>(&self, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Clone,
    {
        self.cell.modify_silently(f)
    }

    pub(crate) fn publish(&self) {
        self.cell.publish()
    }

    pub(crate) fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.cell.subscribe(callback)
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Arc<T>> {
        self.cell.watch()
    }

    pub(crate) fn status(&self) -> StoreStatus {
        self.tracker.status(self.cell.publications())
    }

    pub(crate) fn ordering(&self) -> ResponseOrdering {
        self.tracker.ordering()
    }
}
