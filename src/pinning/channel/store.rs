use crate::core::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::fmt::Debug;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Shared key-value store with per-entry expiry
///
/// Backends may be remote; callers await each operation before moving on.
#[async_trait]
pub trait PinStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite `key`, expiring `ttl` from now
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Default number of entries kept by [`MemoryStore`]
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process [`PinStore`]
///
/// Backed by an LRU whose capacity is a soft bound. Expired entries read as
/// absent and are evicted when touched or when the store is full; live
/// entries are never evicted, so a full store of live entries doubles its
/// capacity instead. Clones share the same entries.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<LruCache<String, StoredValue>>>,
}

impl MemoryStore {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Live entries, keyed as stored
    pub fn snapshot(&self) -> Result<HashMap<String, String>> {
        let now = Instant::now();
        let entries = self.entries.lock()?;
        Ok(entries
            .iter()
            .filter(|(_, stored)| !stored.is_expired(now))
            .map(|(key, stored)| (key.clone(), stored.value.clone()))
            .collect())
    }

    /// Current capacity; grows when live entries outnumber it
    pub fn capacity(&self) -> Result<usize> {
        Ok(self.entries.lock()?.cap().get())
    }

    /// Remaining lifetime of `key`, if it is live
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        let entries = self.entries.lock()?;
        Ok(entries
            .peek(key)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.expires_at - now))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl PinStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock()?;

        let expired = match entries.peek(key) {
            None => return Ok(None),
            Some(stored) => stored.is_expired(now),
        };
        if expired {
            entries.pop(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|stored| stored.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock()?;

        if entries.len() == entries.cap().get() && !entries.contains(key) {
            purge_expired(&mut entries, now);
        }
        if entries.len() == entries.cap().get() && !entries.contains(key) {
            let grown = NonZeroUsize::new(entries.cap().get().saturating_mul(2)).unwrap_or(entries.cap());
            warn!(
                capacity = entries.cap().get(),
                grown = grown.get(),
                "pin store full of live entries, growing"
            );
            entries.resize(grown);
        }

        entries.put(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}

fn purge_expired(entries: &mut LruCache<String, StoredValue>, now: Instant) {
    let expired: Vec<String> = entries
        .iter()
        .filter(|(_, stored)| stored.is_expired(now))
        .map(|(key, _)| key.clone())
        .collect();
    for key in expired {
        entries.pop(&key);
    }
}
