//! Configuration synchronization client for a gateway node.
//!
//! Keeps local routing/policy caches (plugins, selectors, rules, app-auth
//! entries, metadata) consistent with a remote admin server over HTTP long
//! polling, without the server holding persistent per-client connections.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod subscriber;
pub mod sync;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use model::{ConfigGroup, ConfigSnapshot, DigestCache, GroupDigest};
pub use subscriber::{Subscriber, SubscriberError, SubscriberRegistry};
pub use sync::SyncEngine;
