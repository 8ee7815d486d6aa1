//! Book instances repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceFilter, LoanRow},
};

/// Persistence the renewal workflow depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstanceStore: Send + Sync {
    /// Fails with `NotFound` when the copy does not exist
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance>;

    /// Writes the due-back date only; status and borrower are untouched
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn where_clause(filter: &BookInstanceFilter) -> String {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if filter.status.is_some() {
            conditions.push(format!("bi.status = ${}", idx));
            idx += 1;
        }
        if filter.borrower_id.is_some() {
            conditions.push(format!("bi.borrower_id = ${}", idx));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    /// Count copies matching a filter
    pub async fn count(&self, filter: &BookInstanceFilter) -> AppResult<i64> {
        let query = format!(
            "SELECT COUNT(*) FROM book_instances bi {}",
            Self::where_clause(filter)
        );

        let mut builder = sqlx::query_scalar::<_, i64>(&query);
        if let Some(status) = filter.status {
            builder = builder.bind(status);
        }
        if let Some(borrower_id) = filter.borrower_id {
            builder = builder.bind(borrower_id);
        }

        Ok(builder.fetch_one(&self.pool).await?)
    }

    /// One page of copies matching a filter, joined with their book title
    pub async fn list_loans(
        &self,
        filter: &BookInstanceFilter,
        ordering: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<LoanRow>> {
        let where_clause = Self::where_clause(filter);
        let mut idx = 1;
        if filter.status.is_some() {
            idx += 1;
        }
        if filter.borrower_id.is_some() {
            idx += 1;
        }

        let query = format!(
            r#"
            SELECT bi.id, bi.book_id, b.title as book_title, bi.imprint,
                   bi.due_back, bi.borrower_id
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            {}
            ORDER BY {}
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            ordering,
            idx,
            idx + 1
        );

        let mut builder = sqlx::query_as::<_, LoanRow>(&query);
        if let Some(status) = filter.status {
            builder = builder.bind(status);
        }
        if let Some(borrower_id) = filter.borrower_id {
            builder = builder.bind(borrower_id);
        }

        let rows = builder.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// All copies of one book
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let copies = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT id, book_id, imprint, due_back, status, borrower_id
            FROM book_instances
            WHERE book_id = $1
            ORDER BY due_back, id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(copies)
    }
}

#[async_trait]
impl BookInstanceStore for BookInstancesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, imprint, due_back, status, borrower_id FROM book_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanStatus;

    #[test]
    fn where_clause_numbers_placeholders_in_bind_order() {
        assert_eq!(BookInstancesRepository::where_clause(&BookInstanceFilter::default()), "");

        let filter = BookInstanceFilter {
            status: Some(LoanStatus::OnLoan),
            borrower_id: Some(7),
        };
        assert_eq!(
            BookInstancesRepository::where_clause(&filter),
            "WHERE bi.status = $1 AND bi.borrower_id = $2"
        );

        let by_borrower = BookInstanceFilter {
            status: None,
            borrower_id: Some(7),
        };
        assert_eq!(
            BookInstancesRepository::where_clause(&by_borrower),
            "WHERE bi.borrower_id = $1"
        );
    }
}
