//! Catalog-wide counts shown on the home page

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book_instance::{BookInstanceFilter, LoanStatus},
    repository::Repository,
};

/// Aggregate record counts
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status available
    pub num_instances_available: i64,
    pub num_author: i64,
    pub num_genre: i64,
}

/// Source of the home page counts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStats: Send + Sync {
    async fn catalog_counts(&self) -> AppResult<CatalogCounts>;
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CatalogStats for StatsService {
    async fn catalog_counts(&self) -> AppResult<CatalogCounts> {
        let all = BookInstanceFilter::default();
        let available = BookInstanceFilter {
            status: Some(LoanStatus::Available),
            borrower_id: None,
        };

        let (num_books, num_instances, num_instances_available, num_author, num_genre) = tokio::try_join!(
            self.repository.books.count(),
            self.repository.book_instances.count(&all),
            self.repository.book_instances.count(&available),
            self.repository.authors.count(),
            self.repository.genres.count(),
        )?;

        Ok(CatalogCounts {
            num_books,
            num_instances,
            num_instances_available,
            num_author,
            num_genre,
        })
    }
}
