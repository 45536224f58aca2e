//! Fixed-capacity token cache with least-recently-used eviction.
//!
//! Gateway auth plugins resolve opaque tokens (API keys, signed credentials)
//! against the APP_AUTH entries on every request; this cache bounds that
//! work. Recency is tracked explicitly alongside an ordinary map rather than
//! by subclassing an access-ordered collection.

use std::collections::{HashMap, VecDeque};

/// A bounded map from opaque token strings to resolved values.
///
/// `get` refreshes the token's recency; inserting into a full cache evicts
/// the least recently used token. Not synchronized: wrap in a lock when
/// shared across tasks.
#[derive(Debug)]
pub struct TokenCache<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    // Front is least recently used; tokens appear exactly once.
    recency: VecDeque<String>,
}

impl<V> TokenCache<V> {
    /// Create a cache holding at most `capacity` tokens.
    ///
    /// A zero capacity is rounded up to one so `insert` always stores.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: VecDeque::with_capacity(capacity),
        }
    }

    /// Look up a token, marking it most recently used on a hit.
    pub fn get(&mut self, token: &str) -> Option<&V> {
        if !self.entries.contains_key(token) {
            return None;
        }
        self.touch(token);
        self.entries.get(token)
    }

    /// Insert or replace a token's value, evicting the least recently used
    /// entry if the cache is full. Returns the evicted token, if any.
    pub fn insert(&mut self, token: impl Into<String>, value: V) -> Option<String> {
        let token = token.into();
        if self.entries.insert(token.clone(), value).is_some() {
            self.touch(&token);
            return None;
        }

        self.recency.push_back(token);
        if self.entries.len() <= self.capacity {
            return None;
        }

        let evicted = self.recency.pop_front()?;
        self.entries.remove(&evicted);
        tracing::debug!(token = %evicted, "token cache full, evicted least recently used entry");
        Some(evicted)
    }

    /// Remove a token outright (e.g., when its auth entry is revoked).
    pub fn remove(&mut self, token: &str) -> Option<V> {
        let value = self.entries.remove(token)?;
        self.recency.retain(|t| t != token);
        Some(value)
    }

    /// Number of cached tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn touch(&mut self, token: &str) {
        if let Some(position) = self.recency.iter().position(|t| t == token) {
            self.recency.remove(position);
            self.recency.push_back(token.to_string());
        }
    }
}
