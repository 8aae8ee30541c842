use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

/// Transient entry with expiration time
#[derive(Debug, Clone)]
struct TransientEntry {
    value: String,
    expires_at: Instant,
}

impl TransientEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Short-lived key-value markers with per-key expiry.
///
/// Expired entries read as absent; they are dropped lazily on access or in
/// bulk by [`TransientStore::evict_expired`].
#[derive(Clone, Default)]
pub struct TransientStore {
    store: Arc<RwLock<HashMap<String, TransientEntry>>>,
}

impl TransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;
        let entry = store.get(key)?;

        if entry.is_expired() {
            trace!("Transient expired for key: {}", key);
            drop(store);
            let mut store = self.store.write().await;
            if store.get(key).is_some_and(TransientEntry::is_expired) {
                store.remove(key);
            }
            return None;
        }

        Some(entry.value.clone())
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>, ttl: Duration) {
        let mut store = self.store.write().await;
        store.insert(key.to_string(), TransientEntry::new(value.into(), ttl));
        debug!("Set transient {} with TTL {:?}", key, ttl);
    }

    /// Set `key` only when it is absent or expired. Check and insert happen
    /// under one write lock. The returned token is what [`release`] needs.
    ///
    /// [`release`]: TransientStore::release
    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> Option<String> {
        let mut store = self.store.write().await;
        if let Some(entry) = store.get(key) {
            if !entry.is_expired() {
                trace!("Transient {} already held", key);
                return None;
            }
        }

        let token = Uuid::new_v4().to_string();
        store.insert(key.to_string(), TransientEntry::new(token.clone(), ttl));
        debug!("Acquired transient {} for {:?}", key, ttl);
        Some(token)
    }

    /// Delete `key` only if it still holds `token`. An entry that expired and
    /// was taken by someone else is left alone.
    pub async fn release(&self, key: &str, token: &str) -> bool {
        let mut store = self.store.write().await;
        match store.get(key) {
            Some(entry) if entry.value == token => {
                store.remove(key);
                debug!("Released transient {}", key);
                true
            }
            Some(_) => {
                debug!("Transient {} was taken over, not releasing", key);
                false
            }
            None => false,
        }
    }

    /// Remove expired entries
    pub async fn evict_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let initial_len = store.len();

        store.retain(|_, entry| !entry.is_expired());

        let removed = initial_len - store.len();
        if removed > 0 {
            debug!("Evicted {} expired transients", removed);
        }
        removed
    }

    pub async fn size(&self) -> usize {
        self.store.read().await.len()
    }
}
