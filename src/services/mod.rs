//! Business logic services

pub mod catalog;
pub mod redis;
pub mod renewals;
pub mod sessions;
pub mod stats;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{SessionBackend, SessionConfig},
    error::AppResult,
    repository::{BookInstanceStore, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub renewals: renewals::RenewalService,
    pub sessions: sessions::SessionService,
    pub stats: Arc<dyn stats::CatalogStats>,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository, connecting the
    /// configured session backend
    pub async fn new(repository: Repository, session_config: &SessionConfig) -> AppResult<Self> {
        let session_store: Arc<dyn sessions::SessionStore> = match session_config.backend {
            SessionBackend::Redis => {
                let store =
                    redis::RedisSessionStore::new(&session_config.redis_url, session_config.ttl_seconds)
                        .await?;
                tracing::info!("Connected to Redis session store");
                Arc::new(store)
            }
            SessionBackend::Memory => {
                tracing::info!("Using in-memory session store");
                Arc::new(sessions::MemorySessionStore::new(Duration::from_secs(
                    session_config.ttl_seconds,
                )))
            }
        };

        let book_instances: Arc<dyn BookInstanceStore> =
            Arc::new(repository.book_instances.clone());
        let stats: Arc<dyn stats::CatalogStats> =
            Arc::new(stats::StatsService::new(repository.clone()));

        Ok(Self::with_stores(repository, book_instances, session_store, stats))
    }

    /// Assemble services over explicit renewal, session and count sources
    pub fn with_stores(
        repository: Repository,
        book_instances: Arc<dyn BookInstanceStore>,
        session_store: Arc<dyn sessions::SessionStore>,
        stats: Arc<dyn stats::CatalogStats>,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            renewals: renewals::RenewalService::new(book_instances),
            sessions: sessions::SessionService::new(session_store),
            stats,
            repository,
        }
    }

    /// Database readiness
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
