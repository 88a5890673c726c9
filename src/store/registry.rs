//! Entity registry store - the current list of monitored entities.

use std::sync::Arc;

use linkwatch_client::{decode, CancelSignal, FetchError, RemoteClient};
use linkwatch_types::{Entity, JsonList, Registry, StatusSource};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{ResponseOrdering, Store, StoreStatus, Subscription};
use crate::refresh::{self, RefreshError, RefreshOptions, RefreshReport};

/// Holds the registry of entities of kind `E` and their last-known status.
///
/// The whole registry is replaced by [`fetch_all`](Self::fetch_all). For
/// kinds with a status endpoint, [`refresh_status`](Self::refresh_status)
/// updates each entity's status in place between full-list fetches.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use linkwatch::{RefreshOptions, RegistryStore};
/// use linkwatch_client::HttpClient;
/// use linkwatch_types::Collector;
///
/// # tokio_test::block_on(async {
/// let client = Arc::new(HttpClient::builder().build().unwrap());
/// let collectors = RegistryStore::<Collector>::new(client, RefreshOptions::default());
///
/// collectors.fetch_all().await.unwrap();
/// let report = collectors.refresh_status().await.unwrap();
/// println!("{} collectors updated", report.updated.len());
/// # });
/// ```
pub struct RegistryStore<E: Entity> {
    client: Arc<dyn RemoteClient>,
    store: Store<Registry<E>>,
    refresh: RefreshOptions,
}

impl<E: Entity> RegistryStore<E> {
    /// Create an empty store that keeps the last-arriving list response.
    pub fn new(client: Arc<dyn RemoteClient>, refresh: RefreshOptions) -> Self {
        Self::with_ordering(client, refresh, ResponseOrdering::default())
    }

    /// Create an empty store with an explicit overlap policy.
    pub fn with_ordering(
        client: Arc<dyn RemoteClient>,
        refresh: RefreshOptions,
        ordering: ResponseOrdering,
    ) -> Self {
        Self {
            client,
            store: Store::new(Registry::new(), ordering),
            refresh,
        }
    }

    /// Fetch the full entity list and replace the registry with it.
    ///
    /// On failure the prior registry is retained and the error returned.
    pub async fn fetch_all(&self) -> Result<Arc<Registry<E>>, FetchError> {
        self.fetch_all_with(&CancelSignal::never()).await
    }

    /// Like [`fetch_all`](Self::fetch_all), abandoning the request if
    /// `cancel` fires.
    pub async fn fetch_all_with(&self, cancel: &CancelSignal) -> Result<Arc<Registry<E>>, FetchError> {
        let request = self.store.begin();

        let result = cancel
            .race(async {
                let value = self.client.get_json(E::LIST_PATH).await?;
                let list: JsonList<E> = decode(value)?;
                Registry::try_from(list.into_inner())
                    .map_err(|dup| FetchError::Decode(dup.to_string()))
            })
            .await;

        match result {
            Ok(registry) => {
                let count = registry.len();
                if self.store.commit(request, registry) {
                    info!(kind = E::KIND, count, "registry updated");
                } else {
                    debug!(kind = E::KIND, "discarding superseded registry response");
                }
                Ok(self.store.get())
            }
            Err(err) => {
                warn!(kind = E::KIND, error = %err, "registry fetch failed");
                request.fail(&err);
                Err(err)
            }
        }
    }

    /// The held registry.
    pub fn current(&self) -> Arc<Registry<E>> {
        self.store.get()
    }

    /// A copy of the entity with this key, if present.
    pub fn get(&self, key: &str) -> Option<E> {
        self.store.get().get(key).cloned()
    }

    /// Register a callback; see [`Observable::subscribe`](super::Observable::subscribe).
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Registry<E>) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn watch(&self) -> watch::Receiver<Arc<Registry<E>>> {
        self.store.watch()
    }

    pub fn status(&self) -> StoreStatus {
        self.store.status()
    }

    pub fn refresh_options(&self) -> &RefreshOptions {
        &self.refresh
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.store.ordering()
    }
}

impl<E: StatusSource> RegistryStore<E> {
    /// Poll the status endpoint once for every entity in the registry as it
    /// stands now, then republish the registry once.
    ///
    /// Entities are polled in listed order. A failed entity keeps its status
    /// (or is marked unknown, per [`RefreshOptions::on_failure`]) and does not
    /// stop the others; the call only fails if every request failed.
    pub async fn refresh_status(&self) -> Result<RefreshReport, RefreshError> {
        self.refresh_status_with(&CancelSignal::never()).await
    }

    /// Like [`refresh_status`](Self::refresh_status); cancelling stops
    /// issuing further requests and republishes what was already applied.
    pub async fn refresh_status_with(
        &self,
        cancel: &CancelSignal,
    ) -> Result<RefreshReport, RefreshError> {
        refresh::run(self.client.as_ref(), &self.store, &self.refresh, cancel).await
    }
}

impl<E: Entity> std::fmt::Debug for RegistryStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryStore")
            .field("kind", &E::KIND)
            .field("client", &self.client.description())
            .field("store", &self.store)
            .field("refresh", &self.refresh)
            .finish()
    }
}
