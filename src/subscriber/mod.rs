//! Subscriber capability interface and fan-out registry.
//!
//! # Responsibilities
//! - Define the callback surface the gateway implements per config group
//! - Dispatch refresh/update notifications in registration order
//! - Isolate subscriber failures from each other and from the poll loop
//!
//! # Design Decisions
//! - The registration table is built once and immutable afterwards, so
//!   dispatch needs no synchronization
//! - A failing subscriber is logged and skipped; delivered data remains the
//!   source of truth and re-delivery is not retried

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::model::{ConfigGroup, ConfigSnapshot};

/// A registered subscriber failed to apply a notification.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SubscriberError(String);

impl SubscriberError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Callback target for one configuration group.
///
/// Implementations own the storage of the delivered data; this crate only
/// hands over the full item list.
pub trait Subscriber: Send + Sync {
    /// Name used in logs when this subscriber fails.
    fn name(&self) -> &str;

    /// The bootstrap data set for the group, delivered once after `start()`.
    fn on_full_refresh(&self, items: &[Value]) -> Result<(), SubscriberError>;

    /// A replacement data set for the group, delivered whenever the admin
    /// server reports the group changed.
    fn on_incremental_update(&self, items: &[Value]) -> Result<(), SubscriberError>;
}

/// Fixed per-group subscriber table, built once at construction time.
pub struct SubscriberRegistry {
    by_group: HashMap<ConfigGroup, Vec<Arc<dyn Subscriber>>>,
}

impl SubscriberRegistry {
    pub fn builder() -> SubscriberRegistryBuilder {
        SubscriberRegistryBuilder {
            by_group: HashMap::new(),
        }
    }

    /// Notify every subscriber registered for the snapshot's group, in
    /// registration order.
    ///
    /// Each call is independent: a failing subscriber is logged and does not
    /// block the remaining ones. Returns the number of failed deliveries.
    pub fn notify(&self, snapshot: &ConfigSnapshot, is_full_refresh: bool) -> usize {
        let Some(subscribers) = self.by_group.get(&snapshot.group) else {
            return 0;
        };

        let mut failed = 0;
        for subscriber in subscribers {
            let result = if is_full_refresh {
                subscriber.on_full_refresh(&snapshot.items)
            } else {
                subscriber.on_incremental_update(&snapshot.items)
            };
            if let Err(error) = result {
                failed += 1;
                tracing::warn!(
                    group = %snapshot.group,
                    subscriber = subscriber.name(),
                    %error,
                    "subscriber failed to apply notification"
                );
            }
        }
        failed
    }

    /// Number of subscribers registered for a group.
    pub fn count_for(&self, group: ConfigGroup) -> usize {
        self.by_group.get(&group).map_or(0, Vec::len)
    }
}

/// Builder for the fixed registration table.
pub struct SubscriberRegistryBuilder {
    by_group: HashMap<ConfigGroup, Vec<Arc<dyn Subscriber>>>,
}

impl SubscriberRegistryBuilder {
    /// Register a subscriber for a group. Order of calls per group is the
    /// notification order.
    pub fn subscribe(mut self, group: ConfigGroup, subscriber: Arc<dyn Subscriber>) -> Self {
        self.by_group.entry(group).or_default().push(subscriber);
        self
    }

    pub fn build(self) -> SubscriberRegistry {
        SubscriberRegistry {
            by_group: self.by_group,
        }
    }
}
