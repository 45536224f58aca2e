//! Configuration data model.
//!
//! # Responsibilities
//! - Identify the closed set of configuration groups
//! - Represent a fetched group data set (snapshot) and its digest
//! - Track the last-applied digest per group

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named category of gateway configuration, synchronized independently.
///
/// The set is closed: the admin server tracks exactly these five groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigGroup {
    Plugin,
    Selector,
    Rule,
    AppAuth,
    MetaData,
}

impl ConfigGroup {
    /// Every known group, in the order used for bootstrap fetches.
    pub const ALL: [ConfigGroup; 5] = [
        ConfigGroup::Plugin,
        ConfigGroup::Selector,
        ConfigGroup::Rule,
        ConfigGroup::AppAuth,
        ConfigGroup::MetaData,
    ];

    /// Group name as it appears on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ConfigGroup::Plugin => "PLUGIN",
            ConfigGroup::Selector => "SELECTOR",
            ConfigGroup::Rule => "RULE",
            ConfigGroup::AppAuth => "APP_AUTH",
            ConfigGroup::MetaData => "META_DATA",
        }
    }

    /// Parse a wire group name. Returns `None` for unknown names.
    pub fn from_wire(name: &str) -> Option<ConfigGroup> {
        match name {
            "PLUGIN" => Some(ConfigGroup::Plugin),
            "SELECTOR" => Some(ConfigGroup::Selector),
            "RULE" => Some(ConfigGroup::Rule),
            "APP_AUTH" => Some(ConfigGroup::AppAuth),
            "META_DATA" => Some(ConfigGroup::MetaData),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Digest and modification timestamp of the last-applied snapshot for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDigest {
    /// Content hash computed by the admin server.
    pub md5: String,

    /// Server-side modification timestamp (milliseconds since epoch).
    pub last_modify_time: i64,
}

impl GroupDigest {
    /// Placeholder digest for a group that has never been fetched.
    ///
    /// Sent on the first listener call so the server reports the group as
    /// changed if it holds any data at all.
    pub fn empty() -> Self {
        Self {
            md5: String::new(),
            last_modify_time: 0,
        }
    }
}

/// One configuration group's full data set as fetched from the admin server.
///
/// Immutable once constructed; a new snapshot replaces, never mutates, the
/// cached one for its group. Items are opaque to this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    /// Group this snapshot belongs to.
    pub group: ConfigGroup,

    /// Opaque configuration records, in server order.
    pub items: Vec<Value>,

    /// Server-side modification timestamp (milliseconds since epoch).
    pub last_modify_time: i64,

    /// Content digest the server computed over this data set.
    pub digest: String,
}

impl ConfigSnapshot {
    /// The digest entry recorded after this snapshot is delivered.
    pub fn digest_entry(&self) -> GroupDigest {
        GroupDigest {
            md5: self.digest.clone(),
            last_modify_time: self.last_modify_time,
        }
    }
}

/// Per-group digest cache shared between the poll worker and diagnostics.
///
/// Written only by the engine, and only after a fetched snapshot has been
/// delivered to subscribers; readers always see the digest of the data that
/// was actually applied.
#[derive(Clone)]
pub struct DigestCache {
    inner: Arc<DashMap<ConfigGroup, GroupDigest>>,
}

impl DigestCache {
    /// Create a cache seeded with an empty digest for every known group,
    /// so the first listener request carries an entry for each of them.
    pub fn seeded() -> Self {
        let inner = DashMap::new();
        for group in ConfigGroup::ALL {
            inner.insert(group, GroupDigest::empty());
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Record the digest of a delivered snapshot.
    pub fn record(&self, snapshot: &ConfigSnapshot) {
        self.inner.insert(snapshot.group, snapshot.digest_entry());
    }

    /// Digest currently held for a group.
    pub fn get(&self, group: ConfigGroup) -> Option<GroupDigest> {
        self.inner.get(&group).map(|r| r.value().clone())
    }

    /// A point-in-time copy of every tracked digest, keyed by group.
    pub fn snapshot(&self) -> HashMap<ConfigGroup, GroupDigest> {
        self.inner
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect()
    }

    /// Number of tracked groups.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache tracks no groups.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for DigestCache {
    fn default() -> Self {
        Self::seeded()
    }
}
