//! # linkwatch-client
//!
//! Thin client for the link monitoring service's REST API.
//!
//! The [`RemoteClient`] trait is the seam the stores are written against:
//! one GET, one JSON value back, or a [`FetchError`]. [`HttpClient`] is the
//! reqwest implementation used in production; tests substitute scripted
//! implementations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linkwatch_client::{decode, HttpClient, RemoteClient};
//! use linkwatch_types::{JsonList, Pair};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::builder()
//!         .base_url("http://127.0.0.1:5000")
//!         .build()?;
//!
//!     let pairs: JsonList<Pair> = decode(client.get_json("/pair").await?)?;
//!     println!("{} pairs", pairs.json_list.len());
//!     Ok(())
//! }
//! ```

mod cancel;
pub mod error;
mod http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use cancel::{CancelHandle, CancelSignal};
pub use error::{FailureKind, FetchError};
pub use http::{HttpClient, HttpClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Capability to GET a resource path and return its JSON body.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait RemoteClient: Send + Sync + std::fmt::Debug {
    /// GET `path` (relative to the service base URL) and parse the body as JSON.
    async fn get_json(&self, path: &str) -> Result<Value, FetchError>;

    /// Returns a human-readable description of the remote, used in logs.
    fn description(&self) -> &str;
}

/// Decode a JSON value into `T`, mapping shape mismatches to
/// [`FetchError::Decode`].
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(FetchError::from)
}
