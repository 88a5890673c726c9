//! The set of stores a dashboard session works with, built once and shared.

use std::sync::Arc;

use linkwatch_client::{FetchError, RemoteClient};
use linkwatch_types::{Collector, Pair};
use tracing::debug;

use crate::config::Settings;
use crate::refresh::{RefreshError, RefreshReport};
use crate::store::{RegistryStore, TelemetryStore};

/// Pair and collector registries plus pair telemetry, all talking to one
/// remote.
#[derive(Debug)]
pub struct Dashboard {
    client: Arc<dyn RemoteClient>,
    pairs: RegistryStore<Pair>,
    collectors: RegistryStore<Collector>,
    telemetry: TelemetryStore<Pair>,
}

/// What one [`Dashboard::poll`] tick did. Each part fails independently.
#[derive(Debug)]
pub struct PollOutcome {
    /// Number of pairs held after the fetch.
    pub pairs: Result<usize, FetchError>,
    /// Number of collectors held after the fetch.
    pub collectors: Result<usize, FetchError>,
    pub status: Result<RefreshReport, RefreshError>,
    /// `None` when no pair was selected.
    pub telemetry: Option<Result<(), FetchError>>,
}

impl PollOutcome {
    /// True if every part of the tick succeeded.
    pub fn is_ok(&self) -> bool {
        self.pairs.is_ok()
            && self.collectors.is_ok()
            && self.status.is_ok()
            && self.telemetry.as_ref().map_or(true, Result::is_ok)
    }
}

impl Dashboard {
    pub fn new(client: Arc<dyn RemoteClient>, settings: &Settings) -> Self {
        let ordering = settings.response_ordering;
        Self {
            pairs: RegistryStore::with_ordering(client.clone(), settings.refresh_options(), ordering),
            collectors: RegistryStore::with_ordering(
                client.clone(),
                settings.refresh_options(),
                ordering,
            ),
            telemetry: TelemetryStore::with_ordering(client.clone(), ordering),
            client,
        }
    }

    /// Build a dashboard backed by an [`HttpClient`](linkwatch_client::HttpClient).
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let client = Arc::new(settings.http_client()?);
        Ok(Self::new(client, settings))
    }

    pub fn client(&self) -> &Arc<dyn RemoteClient> {
        &self.client
    }

    pub fn pairs(&self) -> &RegistryStore<Pair> {
        &self.pairs
    }

    pub fn collectors(&self) -> &RegistryStore<Collector> {
        &self.collectors
    }

    pub fn telemetry(&self) -> &TelemetryStore<Pair> {
        &self.telemetry
    }

    /// Run one polling tick: refetch both registries, refresh collector
    /// status, and fetch telemetry for `selected` if given.
    ///
    /// The pair, collector and telemetry requests run concurrently; the
    /// collector status refresh follows its list fetch and runs even if that
    /// fetch failed, against the registry already held.
    pub async fn poll(&self, selected: Option<&str>) -> PollOutcome {
        let pairs = async { self.pairs.fetch_all().await.map(|r| r.len()) };
        let collectors = async {
            let fetched = self.collectors.fetch_all().await.map(|r| r.len());
            let status = self.collectors.refresh_status().await;
            (fetched, status)
        };
        let telemetry = async {
            match selected {
                Some(key) => Some(self.telemetry.fetch(key).await.map(|_| ())),
                None => None,
            }
        };

        let (pairs, (collectors, status), telemetry) = tokio::join!(pairs, collectors, telemetry);
        let outcome = PollOutcome {
            pairs,
            collectors,
            status,
            telemetry,
        };
        debug!(ok = outcome.is_ok(), "poll tick complete");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedClient;
    use serde_json::json;

    fn scripted() -> Arc<ScriptedClient> {
        let client = Arc::new(ScriptedClient::new());
        client
            .json("/pair", json!({"json_list": [{"pair_id": "p1", "is_active": true}]}))
            .json(
                "/collector/all",
                json!({"json_list": [{
                    "collection_name": "c1",
                    "collector_id": "t1",
                    "probe_url": "tcp://127.0.0.1:5555",
                    "last_state": "stopped"
                }]}),
            )
            .json("/collector/c1/status", json!({"collector_state": "running"}));
        client
    }

    #[tokio::test]
    async fn poll_updates_every_store() {
        let client = scripted();
        client.json("/pair/p1/monitor_data", json!({"tx_frame_count": 10, "snr_est": 8.5}));
        let dashboard = Dashboard::new(client.clone(), &Settings::default());

        let outcome = dashboard.poll(Some("p1")).await;

        assert!(outcome.is_ok());
        assert_eq!(outcome.pairs.unwrap(), 1);
        assert_eq!(outcome.collectors.unwrap(), 1);
        assert_eq!(outcome.status.unwrap().updated, vec!["c1"]);
        assert_eq!(
            dashboard.collectors().get("c1").unwrap().last_state.as_deref(),
            Some("running")
        );
        let telemetry = (*dashboard.telemetry().current()).clone().unwrap();
        assert_eq!(telemetry.key, "p1");
        assert_eq!(telemetry.snapshot.tx_frame_count, Some(10));
    }

    #[tokio::test]
    async fn poll_without_selection_skips_telemetry() {
        let client = scripted();
        let dashboard = Dashboard::new(client.clone(), &Settings::default());

        let outcome = dashboard.poll(None).await;

        assert!(outcome.telemetry.is_none());
        assert!(!client
            .requests()
            .iter()
            .any(|path| path.ends_with("/monitor_data")));
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let client = Arc::new(ScriptedClient::new());
        client
            .fail("/pair", FetchError::Connection("refused".into()))
            .json("/collector/all", json!({"json_list": []}));
        let dashboard = Dashboard::new(client.clone(), &Settings::default());

        let outcome = dashboard.poll(Some("p1")).await;

        assert!(!outcome.is_ok());
        assert!(outcome.pairs.unwrap_err().is_transport());
        assert_eq!(outcome.collectors.unwrap(), 0);
        assert_eq!(outcome.status.unwrap().attempted, 0);
        // Unscripted telemetry path answers 404
        assert!(matches!(
            outcome.telemetry,
            Some(Err(FetchError::Status { status: 404, .. }))
        ));
    }

    #[test]
    fn from_settings_builds_http_backed_stores() {
        let settings = Settings {
            base_url: "http://radio-host:5000".to_string(),
            ..Default::default()
        };
        let dashboard = Dashboard::from_settings(&settings).unwrap();
        assert_eq!(dashboard.client().description(), "http: http://radio-host:5000");
        assert_eq!(dashboard.pairs().refresh_options(), &settings.refresh_options());
    }
}
