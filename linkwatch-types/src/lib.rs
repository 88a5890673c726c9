//! # linkwatch-types
//!
//! Data model shared by the linkwatch client and stores. This crate defines
//! the shapes returned by the link monitoring service and the entity-kind
//! descriptors that let one generic store serve both communication pairs and
//! data collectors.
//!
//! ## Contents
//!
//! - [`TelemetrySnapshot`]: instantaneous link-quality counters for one entity
//! - [`Pair`] and [`Collector`]: the two kinds of monitored entity
//! - [`Entity`], [`TelemetrySource`], [`StatusSource`]: kind descriptors
//!   (list endpoint, identifier, telemetry and status endpoints)
//! - [`Registry`]: ordered, key-unique list of entities
//! - [`JsonList`]: the `{ "json_list": [...] }` envelope used by list endpoints
//!
//! ## Example
//!
//! ```rust
//! use linkwatch_types::{Entity, JsonList, Pair, Registry};
//!
//! let body = r#"{"json_list": [{"pair_id": "p1", "is_active": true}]}"#;
//! let list: JsonList<Pair> = serde_json::from_str(body).unwrap();
//! let registry = Registry::try_from(list.json_list).unwrap();
//!
//! assert_eq!(registry.len(), 1);
//! assert_eq!(registry.get("p1").map(|p| p.key()), Some("p1"));
//! ```

mod entity;
mod envelope;
mod registry;
mod telemetry;

pub use entity::*;
pub use envelope::*;
pub use registry::*;
pub use telemetry::*;
