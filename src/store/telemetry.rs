//! Telemetry store - the latest snapshot for one selected entity.

use std::marker::PhantomData;
use std::sync::Arc;

use linkwatch_client::{decode, CancelSignal, FetchError, RemoteClient};
use linkwatch_types::{TelemetrySnapshot, TelemetrySource};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{ResponseOrdering, Store, StoreStatus, Subscription};

/// A telemetry snapshot tagged with the entity it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTelemetry {
    /// Key of the entity the snapshot was fetched for.
    pub key: String,
    #[serde(flatten)]
    pub snapshot: TelemetrySnapshot,
}

/// Holds the most recent telemetry snapshot for one entity of kind `E`.
///
/// The entity is named on every fetch; the store keeps no selection state
/// of its own. The value is `None` until the first successful fetch.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use linkwatch::TelemetryStore;
/// use linkwatch_client::HttpClient;
/// use linkwatch_types::Pair;
///
/// # tokio_test::block_on(async {
/// let client = Arc::new(HttpClient::builder().build().unwrap());
/// let telemetry = TelemetryStore::<Pair>::new(client);
///
/// let _sub = telemetry.subscribe(|value| {
///     if let Some(t) = value {
///         println!("{}: snr {:?}", t.key, t.snapshot.snr_est);
///     }
/// });
///
/// telemetry.fetch("p1").await.unwrap();
/// # });
/// ```
pub struct TelemetryStore<E> {
    client: Arc<dyn RemoteClient>,
    store: Store<Option<EntityTelemetry>>,
    _kind: PhantomData<fn() -> E>,
}

impl<E: TelemetrySource> TelemetryStore<E> {
    /// Create an empty store that keeps the last-arriving response.
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self::with_ordering(client, ResponseOrdering::default())
    }

    /// Create an empty store with an explicit overlap policy.
    pub fn with_ordering(client: Arc<dyn RemoteClient>, ordering: ResponseOrdering) -> Self {
        Self {
            client,
            store: Store::new(None, ordering),
            _kind: PhantomData,
        }
    }

    /// Fetch telemetry for the entity `key` and replace the held snapshot.
    ///
    /// On failure the previous snapshot is kept and the error returned.
    pub async fn fetch(&self, key: &str) -> Result<Arc<Option<EntityTelemetry>>, FetchError> {
        self.fetch_with(key, &CancelSignal::never()).await
    }

    /// Like [`fetch`](Self::fetch), abandoning the request if `cancel` fires.
    pub async fn fetch_with(
        &self,
        key: &str,
        cancel: &CancelSignal,
    ) -> Result<Arc<Option<EntityTelemetry>>, FetchError> {
        let path = E::telemetry_path(key);
        let request = self.store.begin();

        let result = cancel
            .race(async {
                let value = self.client.get_json(&path).await?;
                decode::<TelemetrySnapshot>(value)
            })
            .await;

        match result {
            Ok(snapshot) => {
                let value = Some(EntityTelemetry {
                    key: key.to_string(),
                    snapshot,
                });
                if self.store.commit(request, value) {
                    debug!(kind = E::KIND, key, "telemetry updated");
                } else {
                    info!(kind = E::KIND, key, "discarding superseded telemetry response");
                }
                Ok(self.store.get())
            }
            Err(err) => {
                warn!(kind = E::KIND, key, error = %err, "telemetry fetch failed");
                request.fail(&err);
                Err(err)
            }
        }
    }

    /// The held snapshot.
    pub fn current(&self) -> Arc<Option<EntityTelemetry>> {
        self.store.get()
    }

    /// Key of the entity the held snapshot belongs to.
    pub fn key(&self) -> Option<String> {
        self.store.get().as_ref().as_ref().map(|t| t.key.clone())
    }

    /// Register a callback; see [`Observable::subscribe`](super::Observable::subscribe).
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Option<EntityTelemetry>) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn watch(&self) -> watch::Receiver<Arc<Option<EntityTelemetry>>> {
        self.store.watch()
    }

    pub fn status(&self) -> StoreStatus {
        self.store.status()
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.store.ordering()
    }
}

impl<E: TelemetrySource> std::fmt::Debug for TelemetryStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryStore")
            .field("kind", &E::KIND)
            .field("client", &self.client.description())
            .field("store", &self.store)
            .finish()
    }
}
