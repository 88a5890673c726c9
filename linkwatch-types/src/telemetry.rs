//! Telemetry snapshot - the link-quality state of one monitored entity.

use serde::{Deserialize, Serialize};

/// The most recent link statistics reported for one entity.
///
/// Every field is optional: absence means the service has not reported that
/// value yet. A snapshot is replaced wholesale on refresh, never merged.
///
/// Fields the service emits but this model does not track (row ids,
/// creation dates) are ignored on decode.
///
/// # Example
///
/// ```rust
/// use linkwatch_types::TelemetrySnapshot;
///
/// let snapshot: TelemetrySnapshot =
///     serde_json::from_str(r#"{"tx_frame_count": 10, "snr_est": 12.5}"#).unwrap();
///
/// assert_eq!(snapshot.tx_frame_count, Some(10));
/// assert_eq!(snapshot.snr_est, Some(12.5));
/// assert!(snapshot.rx_frame_count.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Frames transmitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_frame_count: Option<u64>,

    /// Frames received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_frame_count: Option<u64>,

    /// Payloads that passed CRC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_crc_success: Option<u64>,

    /// Payloads that failed CRC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_crc_failed: Option<u64>,

    /// Headers that passed CRC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_crc_success: Option<u64>,

    /// Headers that failed CRC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_crc_failed: Option<u64>,

    /// Estimated signal-to-noise ratio in dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr_est: Option<f64>,

    /// Current bitrate in bits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_bps: Option<f64>,

    /// Time of the last update, as formatted by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
}

impl TelemetrySnapshot {
    /// True if the service has not reported any field yet.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Total payload CRC checks (success + failed).
    pub fn payload_crc_total(&self) -> Option<u64> {
        crc_total(self.payload_crc_success, self.payload_crc_failed)
    }

    /// Total header CRC checks (success + failed).
    pub fn header_crc_total(&self) -> Option<u64> {
        crc_total(self.header_crc_success, self.header_crc_failed)
    }

    /// Fraction of payload CRC checks that failed, in `[0, 1]`.
    ///
    /// `None` if either counter is missing or no checks were made.
    pub fn payload_error_rate(&self) -> Option<f64> {
        error_rate(self.payload_crc_success, self.payload_crc_failed)
    }

    /// Fraction of header CRC checks that failed, in `[0, 1]`.
    pub fn header_error_rate(&self) -> Option<f64> {
        error_rate(self.header_crc_success, self.header_crc_failed)
    }
}

fn crc_total(success: Option<u64>, failed: Option<u64>) -> Option<u64> {
    Some(success?.saturating_add(failed?))
}

fn error_rate(success: Option<u64>, failed: Option<u64>) -> Option<f64> {
    let total = crc_total(success, failed)?;
    if total == 0 {
        return None;
    }
    Some(failed? as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_snapshot() {
        let json = r#"{"tx_frame_count": 10, "snr_est": 12.5}"#;
        let snapshot: TelemetrySnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.tx_frame_count, Some(10));
        assert_eq!(snapshot.snr_est, Some(12.5));
        assert_eq!(
            snapshot,
            TelemetrySnapshot {
                tx_frame_count: Some(10),
                snr_est: Some(12.5),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_deserialize_service_row() {
        // The service serializes its whole row, including bookkeeping columns.
        let json = r#"{
            "id": "7c1e",
            "pair_id": "p1",
            "date_created": "Sat, 17 Oct 2026 09:00:00 GMT",
            "date_updated": "Sat, 17 Oct 2026 09:05:00 GMT",
            "tx_frame_count": 1200,
            "rx_frame_count": 1180,
            "payload_crc_success": 1170,
            "payload_crc_failed": 10,
            "header_crc_success": 1178,
            "header_crc_failed": 2,
            "snr_est": 18.25,
            "current_bps": 96000,
            "last_update": "Sat, 17 Oct 2026 09:05:00 GMT"
        }"#;

        let snapshot: TelemetrySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.rx_frame_count, Some(1180));
        assert_eq!(snapshot.current_bps, Some(96000.0));
        assert_eq!(
            snapshot.last_update.as_deref(),
            Some("Sat, 17 Oct 2026 09:05:00 GMT")
        );
    }

    #[test]
    fn test_null_fields_are_absent() {
        let json = r#"{"tx_frame_count": null, "snr_est": null}"#;
        let snapshot: TelemetrySnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let snapshot = TelemetrySnapshot {
            rx_frame_count: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"rx_frame_count":3}"#);
    }

    #[test]
    fn error_rates() {
        let snapshot = TelemetrySnapshot {
            payload_crc_success: Some(90),
            payload_crc_failed: Some(10),
            header_crc_success: Some(0),
            header_crc_failed: Some(0),
            ..Default::default()
        };

        assert_eq!(snapshot.payload_crc_total(), Some(100));
        assert_eq!(snapshot.payload_error_rate(), Some(0.1));
        // No header checks yet
        assert_eq!(snapshot.header_crc_total(), Some(0));
        assert_eq!(snapshot.header_error_rate(), None);
    }

    #[test]
    fn error_rate_needs_both_counters() {
        let snapshot = TelemetrySnapshot {
            payload_crc_success: Some(90),
            ..Default::default()
        };
        assert_eq!(snapshot.payload_crc_total(), None);
        assert_eq!(snapshot.payload_error_rate(), None);
    }
}
