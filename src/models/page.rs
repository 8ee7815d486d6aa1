//! Page-number pagination for list views

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Declarative description of a list view
#[derive(Debug, Clone, Copy)]
pub struct ListConfig {
    pub name: &'static str,
    pub page_size: i64,
    /// SQL ORDER BY clause, static per view
    pub ordering: &'static str,
}

/// `?page=` query parameter: a 1-based number, `last`, or empty
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Resolved slice of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: i64,
    count: i64,
}

impl Paginator {
    pub fn new(page_size: i64, count: i64) -> Self {
        Self {
            page_size: page_size.max(1),
            count: count.max(0),
        }
    }

    /// An empty result set still has one (empty) page
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.page_size - 1) / self.page_size
        }
    }

    pub fn window(&self, query: &PageQuery) -> AppResult<PageWindow> {
        let num_pages = self.num_pages();
        let raw = query.page.as_deref().map(str::trim).unwrap_or("");

        let number = match raw {
            "" => 1,
            "last" => num_pages,
            other => other.parse::<i64>().map_err(|_| {
                AppError::NotFound(format!(
                    "Page '{}' is not 'last', nor can it be converted to an int",
                    other
                ))
            })?,
        };

        if number < 1 {
            return Err(AppError::NotFound(
                "That page number is less than 1".to_string(),
            ));
        }
        if number > num_pages {
            return Err(AppError::NotFound("That page contains no results".to_string()));
        }

        Ok(PageWindow {
            number,
            num_pages,
            limit: self.page_size,
            offset: (number - 1) * self.page_size,
        })
    }

    pub fn page<T>(&self, window: PageWindow, items: Vec<T>) -> Page<T>
    where
        T: for<'a> ToSchema<'a>,
    {
        Page {
            items,
            count: self.count,
            page: window.number,
            num_pages: window.num_pages,
            page_size: self.page_size,
            has_next: window.number < window.num_pages,
            has_previous: window.number > 1,
        }
    }
}

/// One page of a list view
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    BookPage = Page<crate::models::book::BookSummary>,
    AuthorPage = Page<crate::models::author::Author>,
    LoanPage = Page<crate::models::book_instance::LoanSummary>
)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub items: Vec<T>,
    /// Total number of records across all pages
    pub count: i64,
    pub page: i64,
    pub num_pages: i64,
    pub page_size: i64,
    pub has_next: bool,
    pub has_previous: bool,
}
