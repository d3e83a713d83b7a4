//! nodeweight-cache — per-node load-balancing weights derived from annotations.
//!
//! Sits in a chain of cluster event handlers, keeps a table of resolved
//! node weights, and forwards every event to the next handler untouched.
//!
//! # Architecture
//!
//! ```text
//! event source ──► NodeWeightCache ──► next EventHandler (optional)
//!                    │
//!                    ├── resolve_node_weight() (pure)
//!                    └── Mutex<HashMap<node, weight>>
//!                           ▲
//!   endpoint builders ──────┘ weight_of_node() / weight_func()
//! ```
//!
//! Weights live in `[0, 128]`. Absent, unparsable, or out-of-range
//! annotations resolve to the configured default, and a stored weight of
//! zero reads back as the default too.

pub mod cache;
pub mod endpoint;
pub mod handler;
pub mod resolver;

pub use cache::{NodeWeightCache, NodeWeightFunc, MAX_TOMBSTONE_DEPTH};
pub use endpoint::{Address, ClusterLoadAssignment, LbEndpoint, LocalityLbEndpoints, NodeEndpoints};
pub use handler::{EventHandler, Recorder};
pub use resolver::{normalize_weight, resolve_node_weight};
