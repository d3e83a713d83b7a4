//! nodeweight-core — shared types for the node weight pipeline.
//!
//! Defines the node resource model delivered by the cluster event source,
//! the closed [`Payload`] sum type handlers dispatch on, the
//! `nodeweight.toml` configuration, and the JSON-lines event codec used to
//! replay recorded event streams.

pub mod config;
pub mod error;
pub mod event;
pub mod types;

pub use config::{WeightConfig, DEFAULT_ANNOTATION, DEFAULT_NODE_WEIGHT, MAX_NODE_WEIGHT};
pub use error::{ConfigError, ConfigResult, EventError, EventResult};
pub use event::WatchEvent;
pub use types::*;
