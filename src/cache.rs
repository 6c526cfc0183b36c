//! TTL cache for resolved DID Documents.
//!
//! Entries are keyed by the full DID string. Expiry is evaluated lazily on
//! read against the injected [`Clock`]. Expired entries are swept by
//! [`DocumentCache::purge_expired`] and by `insert` whenever the map has
//! doubled since the last sweep, so it stays proportional to the live set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::trace;

use crate::clock::Clock;
use crate::types::DidDocument;

/// A cached document and when it stops being valid
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub document: DidDocument,
    pub inserted_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    /// An entry is expired once `now > inserted_at + ttl`. A TTL too large to
    /// represent never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(self.ttl) else {
            return false;
        };
        match self.inserted_at.checked_add_signed(ttl) {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}

/// Smallest map size at which `insert` sweeps expired entries
const SWEEP_THRESHOLD: usize = 64;

#[derive(Debug)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    /// `insert` sweeps once `map` reaches this size
    sweep_at: usize,
}

impl Entries {
    fn purge(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_expired(now));
        self.sweep_at = (self.map.len() * 2).max(SWEEP_THRESHOLD);
        before - self.map.len()
    }
}

/// Concurrent map of DID to [`CacheEntry`]
pub struct DocumentCache {
    entries: RwLock<Entries>,
    clock: Arc<dyn Clock>,
}

impl DocumentCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                sweep_at: SWEEP_THRESHOLD,
            }),
            clock,
        }
    }

    /// Returns the document for `did` if present and not expired.
    pub fn get(&self, did: &str) -> Option<DidDocument> {
        let now = self.clock.now();
        self.entries
            .read()
            .map
            .get(did)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.document.clone())
    }

    /// Stores `document`, replacing any previous entry for `did`.
    pub fn insert(&self, did: impl Into<String>, document: DidDocument, ttl: Duration) {
        let now = self.clock.now();
        let entry = CacheEntry {
            document,
            inserted_at: now,
            ttl,
        };

        let mut entries = self.entries.write();
        if entries.map.len() >= entries.sweep_at {
            let purged = entries.purge(now);
            trace!(purged, remaining = entries.map.len(), "swept expired cache entries");
        }
        entries.map.insert(did.into(), entry);
    }

    pub fn remove(&self, did: &str) -> Option<DidDocument> {
        self.entries.write().map.remove(did).map(|entry| entry.document)
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.map.clear();
        entries.sweep_at = SWEEP_THRESHOLD;
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.entries.write().purge(now)
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().map.is_empty()
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
