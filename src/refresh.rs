//! Per-entity status polling across a registry.
//!
//! The service has no bulk status endpoint, so a refresh issues one request
//! per entity. Requests go out in listed order, one at a time unless
//! [`RefreshOptions::concurrency`] allows a wider window; results are applied
//! in listed order either way.

use std::pin::pin;

use futures_util::stream::{self, StreamExt};
use linkwatch_client::{decode, CancelSignal, FetchError, RemoteClient};
use linkwatch_types::{Registry, StatusSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::Store;

/// Status written for an entity whose status request failed under
/// [`StatusFailurePolicy::MarkUnknown`].
pub const UNKNOWN_STATUS: &str = "unknown";

/// What happens to an entity whose status request fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFailurePolicy {
    /// Keep the previous status.
    #[default]
    KeepStale,
    /// Overwrite the status with [`UNKNOWN_STATUS`].
    MarkUnknown,
}

/// Tuning for status refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Maximum status requests outstanding at once. `1` (the default) polls
    /// strictly sequentially; `0` is treated as `1`.
    pub concurrency: usize,
    pub on_failure: StatusFailurePolicy,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            on_failure: StatusFailurePolicy::default(),
        }
    }
}

/// Outcome of one status refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Status requests that completed (successfully or not).
    pub attempted: usize,
    /// Keys whose status was written from a response.
    pub updated: Vec<String>,
    /// Subset of `updated` whose status differs from what was held before.
    pub changed: Vec<String>,
    /// Keys whose request failed, with the error.
    pub failed: Vec<(String, FetchError)>,
    /// Keys that answered but had left the registry in the meantime.
    pub skipped: Vec<String>,
}

/// Errors from a status refresh as a whole.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Every entity's status request failed.
    #[error("all {attempted} status requests failed; last error: {last}")]
    AllFailed {
        attempted: usize,
        #[source]
        last: FetchError,
        report: RefreshReport,
    },

    /// The caller cancelled before every entity was polled.
    #[error("status refresh cancelled after {completed} of {total} entities")]
    Cancelled {
        completed: usize,
        total: usize,
        report: RefreshReport,
    },
}

async fn fetch_status<E: StatusSource>(
    client: &dyn RemoteClient,
    key: &str,
) -> Result<String, FetchError> {
    let value = client.get_json(&E::status_path(key)).await?;
    let response: E::StatusResponse = decode(value)?;
    Ok(E::into_status(response))
}

enum Applied {
    Unchanged,
    Changed,
    Missing,
}

/// Write `status` into the entity `key` of the current registry, if present.
fn apply<E: StatusSource>(store: &Store<Registry<E>>, key: &str, status: String) -> Applied {
    store.modify_silently(|registry| match registry.get_mut(key) {
        Some(entity) if entity.status() == Some(status.as_str()) => Applied::Unchanged,
        Some(entity) => {
            entity.set_status(status);
            Applied::Changed
        }
        None => Applied::Missing,
    })
}

/// Refresh every entity's status and republish the registry once.
pub(crate) async fn run<E: StatusSource>(
    client: &dyn RemoteClient,
    store: &Store<Registry<E>>,
    options: &RefreshOptions,
    cancel: &CancelSignal,
) -> Result<RefreshReport, RefreshError> {
    // The key list is captured once; entities added later wait for the next refresh.
    let keys = store.get().keys();
    let total = keys.len();
    let concurrency = options.concurrency.max(1);
    debug!(kind = E::KIND, total, concurrency, "status refresh starting");

    let mut responses = pin!(stream::iter(keys)
        .map(move |key| async move {
            let result = cancel.race(fetch_status::<E>(client, &key)).await;
            (key, result)
        })
        .buffered(concurrency));

    let mut report = RefreshReport::default();
    let mut cancelled = false;

    while let Some((key, result)) = responses.next().await {
        match result {
            Ok(status) => {
                report.attempted += 1;
                match apply(store, &key, status) {
                    Applied::Changed => {
                        report.changed.push(key.clone());
                        report.updated.push(key);
                    }
                    Applied::Unchanged => report.updated.push(key),
                    Applied::Missing => {
                        debug!(kind = E::KIND, key = %key, "entity left the registry during refresh");
                        report.skipped.push(key);
                    }
                }
            }
            // Only the caller's signal stops the loop; a client-side
            // cancellation counts as one entity's failure.
            Err(FetchError::Cancelled) if cancel.is_cancelled() => {
                cancelled = true;
                break;
            }
            Err(err) => {
                report.attempted += 1;
                warn!(kind = E::KIND, key = %key, error = %err, "status request failed");
                if options.on_failure == StatusFailurePolicy::MarkUnknown {
                    apply(store, &key, UNKNOWN_STATUS.to_string());
                }
                report.failed.push((key, err));
            }
        }
    }

    store.publish();

    if cancelled {
        info!(kind = E::KIND, completed = report.attempted, total, "status refresh cancelled");
        return Err(RefreshError::Cancelled {
            completed: report.attempted,
            total,
            report,
        });
    }

    info!(
        kind = E::KIND,
        attempted = report.attempted,
        updated = report.updated.len(),
        changed = report.changed.len(),
        failed = report.failed.len(),
        "status refresh complete"
    );

    if total > 0 && report.failed.len() == total {
        if let Some(last) = report.failed.last().map(|(_, err)| err.clone()) {
            return Err(RefreshError::AllFailed {
                attempted: report.attempted,
                last,
                report,
            });
        }
    }

    Ok(report)
}
