//! Time-windowed event deduplication.
//!
//! Upstream messaging platforms redeliver events on timeout without waiting
//! for application-level acknowledgment; without this cache a retry would
//! run the handler twice (and, say, reply twice in-channel). The cache keeps
//! a fingerprint of every accepted event for a fixed window and rejects any
//! repeat sighting inside it. It is soft admission control only: never a
//! source of hard failure.

mod fingerprint;

pub use fingerprint::fingerprint;

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use {
    dashmap::{DashMap, mapref::entry::Entry},
    serde_json::Value,
    tracing::debug,
};

/// Default rejection window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

const SWEEP_EVERY_OPS: u64 = 256;

/// Windowed set of previously seen event fingerprints.
///
/// Expired entries never cause a rejection and are swept lazily every
/// [`SWEEP_EVERY_OPS`] operations, so the map cannot grow unboundedly over
/// the process lifetime. Safe for concurrent use; an entry is inserted
/// fully-formed or not at all.
pub struct EventCache {
    window: Duration,
    entries: DashMap<String, Instant>,
    ops: AtomicU64,
}

impl EventCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    /// The window is fixed at construction.
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            entries: DashMap::new(),
            ops: AtomicU64::new(0),
        }
    }

    /// Record an event sighting. Returns `false` when a live entry with the
    /// same fingerprint exists (treat as duplicate), `true` otherwise.
    pub fn add(&self, event: &Value) -> bool {
        self.add_at(event, Instant::now())
    }

    fn add_at(&self, event: &Value, now: Instant) -> bool {
        let fp = fingerprint(event);
        let fresh = match self.entries.entry(fp) {
            Entry::Occupied(mut occupied) => {
                let inserted_at = *occupied.get();
                if now.saturating_duration_since(inserted_at) < self.window {
                    false
                } else {
                    // Expired sighting: re-arm the window.
                    occupied.insert(now);
                    true
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            },
        };
        self.sweep_if_due(now);
        if !fresh {
            debug!("rejecting duplicate event inside dedup window");
        }
        fresh
    }

    fn sweep_if_due(&self, now: Instant) {
        let ops = self.ops.fetch_add(1, Ordering::Relaxed) + 1;
        if ops % SWEEP_EVERY_OPS != 0 {
            return;
        }
        self.entries
            .retain(|_, inserted_at| now.saturating_duration_since(*inserted_at) < self.window);
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_event() -> Value {
        json!({
            "type": "message",
            "subtype": "",
            "channel": "C1",
            "user": "U1",
            "text": "hello"
        })
    }

    #[test]
    fn second_sighting_inside_window_rejects() {
        let cache = EventCache::new();
        let now = Instant::now();
        assert!(cache.add_at(&sample_event(), now));
        assert!(!cache.add_at(&sample_event(), now));
    }

    #[test]
    fn sighting_after_window_accepts_again() {
        let cache = EventCache::with_window(Duration::from_secs(60));
        let now = Instant::now();
        assert!(cache.add_at(&sample_event(), now));
        assert!(!cache.add_at(&sample_event(), now + Duration::from_secs(59)));
        assert!(cache.add_at(&sample_event(), now + Duration::from_secs(61)));
    }

    #[test]
    fn field_order_does_not_matter() {
        let cache = EventCache::new();
        let now = Instant::now();
        let reordered: Value = serde_json::from_str(
            r#"{"text":"hello","user":"U1","channel":"C1","subtype":"","type":"message"}"#,
        )
        .unwrap();
        assert!(cache.add_at(&sample_event(), now));
        assert!(!cache.add_at(&reordered, now));
    }

    #[test]
    fn distinct_events_are_independent() {
        let cache = EventCache::new();
        let now = Instant::now();
        assert!(cache.add_at(&json!({ "type": "message", "text": "a" }), now));
        assert!(cache.add_at(&json!({ "type": "message", "text": "b" }), now));
    }

    #[test]
    fn sweep_evicts_expired_entries() {
        let cache = EventCache::with_window(Duration::from_secs(60));
        let now = Instant::now();
        assert!(cache.add_at(&sample_event(), now));

        // Push enough distinct events past the window to trigger a sweep.
        let later = now + Duration::from_secs(120);
        for i in 0..SWEEP_EVERY_OPS {
            let event = json!({ "type": "message", "text": format!("n{i}") });
            cache.add_at(&event, later);
        }
        assert!(!cache.entries.contains_key(&fingerprint(&sample_event())));
        // The original fingerprint no longer rejects.
        assert!(cache.add_at(&sample_event(), later));
    }
}
