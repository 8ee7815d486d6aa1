//! Per-visitor session data

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;

/// Backing store for session values, keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Visits recorded so far; 0 for an unknown or expired session
    async fn visits(&self, session_id: &str) -> AppResult<u64>;

    /// Stores the count and restarts the session's expiry
    async fn set_visits(&self, session_id: &str, visits: u64) -> AppResult<()>;
}

/// Process-local store. Entries expire `ttl` after their last write and are
/// pruned on every write.
pub struct MemorySessionStore {
    ttl: Duration,
    visits: RwLock<HashMap<String, (u64, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            visits: RwLock::new(HashMap::new()),
        }
    }

    fn is_live(&self, written: Instant, now: Instant) -> bool {
        now.duration_since(written) < self.ttl
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.visits.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn visits(&self, session_id: &str) -> AppResult<u64> {
        let now = Instant::now();
        let visits = self
            .visits
            .read()
            .await
            .get(session_id)
            .filter(|(_, written)| self.is_live(*written, now))
            .map(|(visits, _)| *visits)
            .unwrap_or(0);
        Ok(visits)
    }

    async fn set_visits(&self, session_id: &str, visits: u64) -> AppResult<()> {
        let now = Instant::now();
        let mut map = self.visits.write().await;
        map.retain(|_, (_, written)| self.is_live(*written, now));
        map.insert(session_id.to_string(), (visits, now));
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Fresh opaque session identifier
    pub fn new_session_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Normalized id from a client-supplied cookie; `None` unless it is a UUID
    pub fn parse_session_id(raw: &str) -> Option<String> {
        Uuid::parse_str(raw.trim())
            .ok()
            .map(|id| id.simple().to_string())
    }

    /// Returns the visit count before this visit and stores count + 1.
    ///
    /// Read then write, not atomic: concurrent requests from one visitor can
    /// collapse into a single increment. The counter is display-only.
    pub async fn record_visit(&self, session_id: &str) -> AppResult<u64> {
        let visits = self.store.visits(session_id).await?;
        self.store.set_visits(session_id, visits + 1).await?;
        Ok(visits)
    }
}
