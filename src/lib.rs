//! # linkwatch
//!
//! Client-side synchronization layer for a radio-link monitoring dashboard.
//!
//! This crate keeps the dashboard's view of a remote monitoring service
//! current: the registry of monitored entities (communication pairs and data
//! collectors), each collector's last-known state, and the latest telemetry
//! snapshot for a selected pair. Each piece of state lives in an observable
//! store that consumers read, subscribe to, or watch asynchronously.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Dashboard                           │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────┐  │
//! │  │ RegistryStore    │ │ RegistryStore    │ │TelemetryStore│  │
//! │  │   <Pair>         │ │   <Collector>    │ │   <Pair>     │  │
//! │  └────────┬─────────┘ └───┬──────────┬───┘ └──────┬───────┘  │
//! │           │               │          ▼            │          │
//! │           │               │   ┌─────────────┐     │          │
//! │           │               │   │   refresh   │     │          │
//! │           │               │   │(per-entity  │     │          │
//! │           │               │   │  status)    │     │          │
//! │           │               │   └──────┬──────┘     │          │
//! │           ▼               ▼          ▼            ▼          │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │      RemoteClient  (HttpClient ── reqwest ── REST)      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`store`]**: [`Observable`] cells and the generic [`RegistryStore`] and
//!   [`TelemetryStore`] built on them
//! - **[`refresh`]**: status polling across a registry, sequential by default
//! - **[`config`]**: [`Settings`] layered from defaults, a TOML file and
//!   `LINKWATCH_*` environment variables
//! - **[`dashboard`]**: the [`Dashboard`] context that owns one store per
//!   concern and runs polling ticks
//!
//! The wire model lives in [`linkwatch_types`] and the HTTP transport in
//! [`linkwatch_client`].
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! linkwatch pairs
//! linkwatch collectors --refresh-status
//! linkwatch telemetry p1
//! linkwatch --base-url http://radio-host:5000 watch --pair p1
//! ```
//!
//! ### As a library
//!
//! ```rust,no_run
//! use linkwatch::{Dashboard, Settings};
//!
//! # tokio_test::block_on(async {
//! let dashboard = Dashboard::from_settings(&Settings::default()).unwrap();
//!
//! let _sub = dashboard.collectors().subscribe(|registry| {
//!     for collector in registry {
//!         println!("{}: {:?}", collector.collection_name, collector.last_state);
//!     }
//! });
//!
//! let outcome = dashboard.poll(Some("p1")).await;
//! assert!(outcome.is_ok());
//! # });
//! ```

pub mod config;
pub mod dashboard;
pub mod refresh;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{Settings, SettingsError};
pub use dashboard::{Dashboard, PollOutcome};
pub use refresh::{
    RefreshError, RefreshOptions, RefreshReport, StatusFailurePolicy, UNKNOWN_STATUS,
};
pub use store::{
    EntityTelemetry, LoadState, Observable, RegistryStore, ResponseOrdering, StoreStatus,
    Subscription, TelemetryStore,
};
