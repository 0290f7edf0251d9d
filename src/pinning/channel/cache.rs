use super::{PIN_VALUE, PinStore, PropagationChannel};
use async_trait::async_trait;
use http::{request, response};
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix of every store key; the session key is appended
pub const CACHE_KEY_PREFIX: &str = "multidb.middleware.PinUsingCacheRouterMiddleware.";

/// Session identifier placed in request extensions by the host's session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keeps pinning evidence in a shared store keyed by session
///
/// Requests without a session are never pinned by evidence and their writes
/// are not propagated.
#[derive(Debug, Clone)]
pub struct CacheChannel<S> {
    store: S,
}

impl<S: PinStore> CacheChannel<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store key for this request's session, if it has one
    pub fn cache_key(request: &request::Parts) -> Option<String> {
        request
            .extensions
            .get::<SessionKey>()
            .filter(|session| !session.0.is_empty())
            .map(|session| format!("{CACHE_KEY_PREFIX}{}", session.0))
    }
}

#[async_trait]
impl<S: PinStore> PropagationChannel for CacheChannel<S> {
    async fn lookup(&self, request: &request::Parts) -> bool {
        let Some(key) = Self::cache_key(request) else {
            return false;
        };

        match self.store.get(&key).await {
            Ok(value) => value.is_some_and(|v| !v.is_empty()),
            Err(err) => {
                warn!(%key, %err, "pin store lookup failed, treating as unpinned");
                false
            }
        }
    }

    async fn record(&self, request: &request::Parts, _response: &mut response::Parts, ttl: Duration) {
        let Some(key) = Self::cache_key(request) else {
            debug!("no session key, write not propagated");
            return;
        };

        if let Err(err) = self.store.set(&key, PIN_VALUE, ttl).await {
            warn!(%key, %err, "pin store write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PinError, Result};
    use crate::pinning::channel::MemoryStore;
    use http::{Request, Response};

    fn request(session: Option<&str>) -> request::Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(key) = session {
            parts.extensions.insert(SessionKey::new(key));
        }
        parts
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(
            CacheChannel::<MemoryStore>::cache_key(&request(Some("abc123"))).as_deref(),
            Some("multidb.middleware.PinUsingCacheRouterMiddleware.abc123")
        );
        assert_eq!(CacheChannel::<MemoryStore>::cache_key(&request(Some(""))), None);
        assert_eq!(CacheChannel::<MemoryStore>::cache_key(&request(None)), None);
    }

    #[tokio::test]
    async fn test_record_then_lookup() {
        let channel = CacheChannel::new(MemoryStore::default());
        let req = request(Some("abc123"));
        let (mut resp, _) = Response::new(()).into_parts();

        assert!(!channel.lookup(&req).await);
        channel.record(&req, &mut resp, Duration::from_secs(15)).await;
        assert!(channel.lookup(&req).await);

        let other = request(Some("zzz"));
        assert!(!channel.lookup(&other).await);
    }

    #[tokio::test]
    async fn test_empty_value_is_not_evidence() {
        let store = MemoryStore::default();
        store
            .set(
                "multidb.middleware.PinUsingCacheRouterMiddleware.abc123",
                "",
                Duration::from_secs(15),
            )
            .await
            .unwrap();
        let channel = CacheChannel::new(store);
        assert!(!channel.lookup(&request(Some("abc123"))).await);
    }

    #[tokio::test]
    async fn test_no_session_leaves_store_unchanged() {
        let store = MemoryStore::default();
        store.set("unrelated", "y", Duration::from_secs(15)).await.unwrap();
        let channel = CacheChannel::new(store.clone());
        let before = store.snapshot().unwrap();

        let req = request(None);
        let (mut resp, _) = Response::new(()).into_parts();
        assert!(!channel.lookup(&req).await);
        channel.record(&req, &mut resp, Duration::from_secs(15)).await;

        assert_eq!(store.snapshot().unwrap(), before);
        assert!(resp.headers.is_empty());
    }

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl PinStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(PinError::Store("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            Err(PinError::Store("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let channel = CacheChannel::new(BrokenStore);
        let req = request(Some("abc123"));
        let (mut resp, _) = Response::new(()).into_parts();

        assert!(!channel.lookup(&req).await);
        channel.record(&req, &mut resp, Duration::from_secs(15)).await;
    }
}
