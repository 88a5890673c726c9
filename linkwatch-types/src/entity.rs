//! Monitored entities and the kind descriptors that address them.
//!
//! A kind descriptor is a set of traits implemented on the entity type
//! itself. [`Entity`] names the list endpoint and the identifier;
//! [`TelemetrySource`] and [`StatusSource`] are only implemented by kinds the
//! service actually exposes those endpoints for, so a store for a kind
//! without a status endpoint has no status refresh at all.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A kind of monitored entity.
pub trait Entity: DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Human-readable kind name, used in logs.
    const KIND: &'static str;

    /// Path of the full-list endpoint, answering `{ "json_list": [...] }`.
    const LIST_PATH: &'static str;

    /// Name of the identifier field in the service's JSON.
    const KEY_FIELD: &'static str;

    /// The identifier, unique within a registry.
    fn key(&self) -> &str;
}

/// An entity kind with a per-entity telemetry endpoint.
pub trait TelemetrySource: Entity {
    /// Path of the telemetry endpoint for the entity with this key.
    fn telemetry_path(key: &str) -> String;
}

/// An entity kind with a per-entity status endpoint.
///
/// The status field is the only field a status refresh may change.
pub trait StatusSource: Entity {
    /// Body returned by the status endpoint.
    type StatusResponse: DeserializeOwned + Send;

    /// Path of the status endpoint for the entity with this key.
    fn status_path(key: &str) -> String;

    /// Extract the status string from a status response.
    fn into_status(response: Self::StatusResponse) -> String;

    /// The last known status, if any.
    fn status(&self) -> Option<&str>;

    /// Overwrite the status field.
    fn set_status(&mut self, status: String);
}

/// A monitored pair of subscriptions (one receive side, one transmit side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    /// Pair identifier.
    pub pair_id: String,

    /// Id of the receive-side subscription, if one was started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_sub_id: Option<String>,

    /// Id of the transmit-side subscription, if one was started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_sub_id: Option<String>,

    /// Whether the pair is being monitored.
    #[serde(default)]
    pub is_active: bool,

    /// Free-form description given when the pair was subscribed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Pair {
    const KIND: &'static str = "pair";
    const LIST_PATH: &'static str = "/pair";
    const KEY_FIELD: &'static str = "pair_id";

    fn key(&self) -> &str {
        &self.pair_id
    }
}

impl TelemetrySource for Pair {
    fn telemetry_path(key: &str) -> String {
        format!("/pair/{}/monitor_data", encode_segment(key))
    }
}

/// A named data collector feeding one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collector {
    /// Name of the collection this collector writes to. Unique per registry.
    pub collection_name: String,

    /// Id of the collector task.
    #[serde(default)]
    pub collector_id: String,

    /// URL of the probe the collector subscribes to.
    #[serde(default)]
    pub probe_url: String,

    /// Last known state, e.g. "running", "stopped", "error".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_state: Option<String>,

    /// Time of the last data insertion, as formatted by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_insert: Option<String>,
}

impl Entity for Collector {
    const KIND: &'static str = "collector";
    const LIST_PATH: &'static str = "/collector/all";
    const KEY_FIELD: &'static str = "collection_name";

    fn key(&self) -> &str {
        &self.collection_name
    }
}

/// Body of `GET /collector/{collection_name}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorStatus {
    pub collector_state: String,
}

impl StatusSource for Collector {
    type StatusResponse = CollectorStatus;

    fn status_path(key: &str) -> String {
        format!("/collector/{}/status", encode_segment(key))
    }

    fn into_status(response: CollectorStatus) -> String {
        response.collector_state
    }

    fn status(&self) -> Option<&str> {
        self.last_state.as_deref()
    }

    fn set_status(&mut self, status: String) {
        self.last_state = Some(status);
    }
}

/// Percent-encode a string for use as a single path segment.
pub fn encode_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_pair() {
        let json = r#"{"pair_id": "p1", "is_active": true}"#;
        let pair: Pair = serde_json::from_str(json).unwrap();

        assert_eq!(pair.key(), "p1");
        assert!(pair.is_active);
        assert!(pair.rx_sub_id.is_none());
        assert!(pair.tx_sub_id.is_none());
    }

    #[test]
    fn test_deserialize_pair_service_row() {
        let json = r#"{
            "pair_id": "lab-a",
            "date_created": "Sat, 17 Oct 2026 09:00:00 GMT",
            "date_updated": "Sat, 17 Oct 2026 09:00:00 GMT",
            "is_active": true,
            "rx_sub_id": "4f1c",
            "tx_sub_id": null,
            "description": "bench link"
        }"#;
        let pair: Pair = serde_json::from_str(json).unwrap();

        assert_eq!(pair.rx_sub_id.as_deref(), Some("4f1c"));
        assert!(pair.tx_sub_id.is_none());
        assert_eq!(pair.description.as_deref(), Some("bench link"));
    }

    #[test]
    fn test_deserialize_collector() {
        let json = r#"{
            "collection_name": "c1",
            "collector_id": "task-1",
            "probe_url": "tcp://127.0.0.1:5555",
            "last_state": "PENDING",
            "last_insert": null
        }"#;
        let collector: Collector = serde_json::from_str(json).unwrap();

        assert_eq!(collector.key(), "c1");
        assert_eq!(collector.status(), Some("PENDING"));
        assert!(collector.last_insert.is_none());
    }

    #[test]
    fn collector_set_status_only_touches_last_state() {
        let mut collector = Collector {
            collection_name: "c1".to_string(),
            collector_id: "task-1".to_string(),
            probe_url: "tcp://127.0.0.1:5555".to_string(),
            last_state: None,
            last_insert: Some("yesterday".to_string()),
        };
        let before = collector.clone();

        collector.set_status("running".to_string());

        assert_eq!(collector.last_state.as_deref(), Some("running"));
        assert_eq!(collector.collection_name, before.collection_name);
        assert_eq!(collector.collector_id, before.collector_id);
        assert_eq!(collector.probe_url, before.probe_url);
        assert_eq!(collector.last_insert, before.last_insert);
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Pair::telemetry_path("p1"), "/pair/p1/monitor_data");
        assert_eq!(Collector::status_path("c1"), "/collector/c1/status");
        assert_eq!(Pair::LIST_PATH, "/pair");
        assert_eq!(Collector::LIST_PATH, "/collector/all");
    }

    #[test]
    fn test_status_response() {
        let response: CollectorStatus =
            serde_json::from_str(r#"{"collector_state": "running"}"#).unwrap();
        assert_eq!(Collector::into_status(response), "running");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("simple"), "simple");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("lab pair"), "lab%20pair");
        assert_eq!(encode_segment("x?y#z"), "x%3Fy%23z");
        assert_eq!(encode_segment("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_segment("café"), "caf%C3%A9");
        assert_eq!(Pair::telemetry_path("a/b"), "/pair/a%2Fb/monitor_data");
    }
}
