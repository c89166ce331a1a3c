//! Content-hash deduplication with TTL eviction.
//!
//! Webhook infrastructure retries aggressively; a renewal notification
//! delivered twice within seconds must not stack two extensions. Keyed
//! by blake3 hash of (event kind + entity id). Durable order markers
//! live in storage; this cache covers the subscription-side events
//! that have no marker.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// In-memory deduplication cache with TTL eviction.
pub struct EventDeduplicator {
    /// Map of content hash → insertion time.
    seen: HashMap<String, Instant>,
    ttl: Duration,
    /// Maximum capacity before forced eviction.
    max_capacity: usize,
}

impl EventDeduplicator {
    /// 10k capacity fits well past any realistic webhook burst.
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: HashMap::new(),
            ttl,
            max_capacity: 10_000,
        }
    }

    pub fn with_capacity(ttl: Duration, max_capacity: usize) -> Self {
        Self {
            seen: HashMap::new(),
            ttl,
            max_capacity,
        }
    }

    /// Check whether this (kind, entity) pair fired within the TTL.
    /// Records the hash when it did not, so the first caller proceeds
    /// and retries are skipped.
    pub fn is_duplicate(&mut self, kind: &str, entity_id: i64) -> bool {
        let hash = dedup_hash(kind, entity_id);
        let now = Instant::now();

        if self.seen.len() >= self.max_capacity {
            self.evict_expired(now);
        }
        if self.seen.len() >= self.max_capacity {
            self.evict_oldest(self.max_capacity / 4);
        }

        if let Some(inserted) = self.seen.get(&hash) {
            if now.duration_since(*inserted) < self.ttl {
                return true;
            }
            // Expired — treat as new
        }

        self.seen.insert(hash, now);
        false
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    fn evict_expired(&mut self, now: Instant) {
        self.seen
            .retain(|_, inserted| now.duration_since(*inserted) < self.ttl);
    }

    fn evict_oldest(&mut self, count: usize) {
        if count == 0 || self.seen.is_empty() {
            return;
        }
        let mut entries: Vec<(String, Instant)> = self.seen.drain().collect();
        entries.sort_by_key(|(_, t)| *t);
        for (hash, time) in entries.into_iter().skip(count) {
            self.seen.insert(hash, time);
        }
    }
}

fn dedup_hash(kind: &str, entity_id: i64) -> String {
    let input = format!("{}:{}", kind, entity_id);
    blake3::hash(input.as_bytes()).to_hex().to_string()
}
