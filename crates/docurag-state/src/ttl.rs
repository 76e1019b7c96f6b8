//! Shared TTL-sweeper mechanics for both keyed stores in this crate.
//!
//! Generalizes the reference architecture's `DashMap`-based storage-handle
//! cache (keyed by namespace, populated on demand, never evicted) with an
//! expiry timestamp per entry and a background sweep loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

pub struct Entry<T> {
    pub value: T,
    pub last_written: Instant,
}

impl<T> Entry<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            last_written: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_written = Instant::now();
    }
}

/// Spawn a background task that periodically drops entries whose
/// `last_written` is older than `ttl`. Returns a handle the owner can abort
/// on shutdown.
pub fn spawn_sweeper<T: Send + Sync + 'static>(
    map: Arc<DashMap<String, Entry<T>>>,
    ttl: Duration,
    sweep_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let now = Instant::now();
            let before = map.len();
            map.retain(|_, entry| now.duration_since(entry.last_written) < ttl);
            let evicted = before - map.len();
            if evicted > 0 {
                tracing::debug!(evicted, remaining = map.len(), "swept expired state entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweeper_evicts_entries_past_ttl() {
        let map: Arc<DashMap<String, Entry<i32>>> = Arc::new(DashMap::new());
        map.insert("a".to_string(), Entry::new(1));

        let handle = spawn_sweeper(Arc::clone(&map), Duration::from_millis(20), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.abort();

        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn sweeper_keeps_fresh_entries() {
        let map: Arc<DashMap<String, Entry<i32>>> = Arc::new(DashMap::new());
        map.insert("a".to_string(), Entry::new(1));

        let handle = spawn_sweeper(Arc::clone(&map), Duration::from_secs(60), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();

        assert_eq!(map.len(), 1);
    }
}
