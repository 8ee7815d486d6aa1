//! Catalog browsing and record management service

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetail, AuthorForm},
        book::{Book, BookDetail, BookForm, BookSummary},
        book_instance::{BookInstanceFilter, LoanSummary},
        form::{FormDescription, FormErrors, INVALID_CHOICE},
        page::{ListConfig, Page, PageQuery, Paginator},
    },
    repository::Repository,
    views::EditConfig,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // BROWSE
    // =========================================================================

    pub async fn list_books(&self, view: &ListConfig, query: &PageQuery) -> AppResult<Page<BookSummary>> {
        let paginator = Paginator::new(view.page_size, self.repository.books.count().await?);
        let window = paginator.window(query)?;

        let books = self
            .repository
            .books
            .list(view.ordering, window.limit, window.offset)
            .await?;
        Ok(paginator.page(window, books))
    }

    /// Book with its author, genres, language and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => self.repository.authors.find_by_id(author_id).await?,
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => self.repository.languages.find_by_id(language_id).await?,
            None => None,
        };
        let genres = self.repository.books.genres(id).await?;
        let copies = self.repository.book_instances.list_for_book(id).await?;

        Ok(BookDetail {
            book,
            author,
            genres,
            language,
            copies,
        })
    }

    pub async fn list_authors(&self, view: &ListConfig, query: &PageQuery) -> AppResult<Page<Author>> {
        let paginator = Paginator::new(view.page_size, self.repository.authors.count().await?);
        let window = paginator.window(query)?;

        let authors = self
            .repository
            .authors
            .list(view.ordering, window.limit, window.offset)
            .await?;
        Ok(paginator.page(window, authors))
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;

        Ok(AuthorDetail {
            name: author.display_name(),
            author,
            books,
        })
    }

    /// Copies matching `filter`, overdue flags computed against `today`
    pub async fn list_loans(
        &self,
        view: &ListConfig,
        filter: &BookInstanceFilter,
        query: &PageQuery,
        today: NaiveDate,
    ) -> AppResult<Page<LoanSummary>> {
        let paginator = Paginator::new(view.page_size, self.repository.book_instances.count(filter).await?);
        let window = paginator.window(query)?;

        let loans = self
            .repository
            .book_instances
            .list_loans(filter, view.ordering, window.limit, window.offset)
            .await?
            .into_iter()
            .map(|row| row.into_summary(today))
            .collect();
        Ok(paginator.page(window, loans))
    }

    // =========================================================================
    // FORMS
    // =========================================================================

    fn describe(view: &EditConfig) -> FormDescription {
        let initial = view
            .initial
            .iter()
            .map(|(field, value)| (field.to_string(), Value::String(value.to_string())))
            .collect();

        FormDescription {
            name: view.name.to_string(),
            fields: view.permitted_fields().into_iter().map(String::from).collect(),
            initial,
        }
    }

    pub fn author_form(&self, view: &EditConfig) -> FormDescription {
        Self::describe(view)
    }

    /// Language initials are given by name and resolved to an id; null if
    /// no such language exists
    pub async fn book_form(&self, view: &EditConfig) -> AppResult<FormDescription> {
        let mut form = Self::describe(view);

        if let Some(Value::String(name)) = form.initial.get("language").cloned() {
            let language = self.repository.languages.find_by_name(&name).await?;
            form.initial.insert(
                "language".to_string(),
                language.map(|l| Value::from(l.id)).unwrap_or(Value::Null),
            );
        }
        Ok(form)
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn create_author(&self, view: &EditConfig, payload: Map<String, Value>) -> AppResult<Author> {
        let payload = view.fields.filter(payload, view.editable);
        let form = AuthorForm::bind(&payload, None).map_err(AppError::Form)?;

        let author = self.repository.authors.create(&form).await?;
        tracing::info!(author_id = author.id, "author created");
        Ok(author)
    }

    /// Fields outside the view's allow-list keep their stored value
    pub async fn update_author(
        &self,
        view: &EditConfig,
        id: i32,
        payload: Map<String, Value>,
    ) -> AppResult<Author> {
        let current = self.repository.authors.get_by_id(id).await?;
        let payload = view.fields.filter(payload, view.editable);
        let form = AuthorForm::bind(&payload, Some(&current)).map_err(AppError::Form)?;

        let author = self.repository.authors.update(id, &form).await?;
        tracing::info!(author_id = id, "author updated");
        Ok(author)
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "author deleted");
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// Every referenced author, language and genre must exist
    async fn check_references(&self, form: &BookForm) -> AppResult<()> {
        let mut errors = FormErrors::default();

        if let Some(author_id) = form.author_id {
            if !self.repository.authors.exists(author_id).await? {
                errors.add("author", INVALID_CHOICE);
            }
        }

        for missing in self.repository.genres.missing(&form.genre_ids).await? {
            errors.add(
                "genre",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    missing
                ),
            );
        }

        if let Some(language_id) = form.language_id {
            if self.repository.languages.find_by_id(language_id).await?.is_none() {
                errors.add("language", INVALID_CHOICE);
            }
        }

        errors.into_result().map_err(AppError::Form)
    }

    pub async fn create_book(&self, view: &EditConfig, payload: Map<String, Value>) -> AppResult<Book> {
        let payload = view.fields.filter(payload, view.editable);
        let form = BookForm::bind(&payload, None).map_err(AppError::Form)?;
        self.check_references(&form).await?;

        let book = self.repository.books.create(&form).await?;
        tracing::info!(book_id = book.id, "book created");
        Ok(book)
    }

    /// Fields outside the view's allow-list keep their stored value
    pub async fn update_book(
        &self,
        view: &EditConfig,
        id: i32,
        payload: Map<String, Value>,
    ) -> AppResult<Book> {
        let stored = self.repository.books.get_by_id(id).await?;
        let current = BookForm::from_stored(&stored, self.repository.books.genre_ids(id).await?);

        let payload = view.fields.filter(payload, view.editable);
        let form = BookForm::bind(&payload, Some(&current)).map_err(AppError::Form)?;
        self.check_references(&form).await?;

        let book = self.repository.books.update(id, &form).await?;
        tracing::info!(book_id = id, "book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{AUTHOR_CREATE, BOOK_UPDATE};

    #[test]
    fn create_form_lists_fields_and_initials() {
        let form = CatalogService::describe(&AUTHOR_CREATE);
        assert_eq!(form.name, "author_form");
        assert_eq!(
            form.fields,
            vec!["first_name", "last_name", "date_of_birth", "date_of_death"]
        );
        assert_eq!(form.initial.get("date_of_birth"), Some(&Value::from("2020-11-06")));
    }

    #[test]
    fn update_form_has_no_initials() {
        let form = CatalogService::describe(&BOOK_UPDATE);
        assert!(form.initial.is_empty());
        assert_eq!(form.fields.len(), 6);
    }
}
