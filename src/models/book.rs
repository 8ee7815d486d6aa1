//! Book (bibliographic record) model and related types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::author::Author;
use super::book_instance::BookInstance;
use super::form::{bind_field, require_text, FormErrors, REQUIRED};
use super::genre::{Genre, Language};

/// Fields a client may ever write on a book
pub const EDITABLE_FIELDS: &[&str] = &["title", "author", "summary", "isbn", "genre", "language"];

/// Book row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub language_id: Option<i32>,
}

/// Book as shown in lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author, if any
    pub author_name: Option<String>,
}

/// Book detail page: the record with its relations and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<Author>,
    pub genres: Vec<Genre>,
    pub language: Option<Language>,
    pub copies: Vec<BookInstance>,
}

/// Validated book fields ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct BookForm {
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(max = 1000, message = "Ensure this value has at most 1000 characters."))]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters."))]
    pub isbn: String,
    pub genre_ids: Vec<i32>,
    pub language_id: Option<i32>,
}

impl BookForm {
    /// Current values of a stored book, used as the base of an update
    pub fn from_stored(book: &Book, genre_ids: Vec<i32>) -> Self {
        Self {
            title: book.title.clone(),
            author_id: book.author_id,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre_ids,
            language_id: book.language_id,
        }
    }

    /// Binds an allow-list-filtered payload on top of `current`
    pub fn bind(payload: &Map<String, Value>, current: Option<&BookForm>) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::default();

        let title = bind_field::<String>(payload, "title", &mut errors)
            .or_keep(current.map(|b| b.title.clone()));
        let author_id = bind_field::<i32>(payload, "author", &mut errors)
            .or_keep(current.and_then(|b| b.author_id));
        let summary = bind_field::<String>(payload, "summary", &mut errors)
            .or_keep(current.map(|b| b.summary.clone()));
        let isbn = bind_field::<String>(payload, "isbn", &mut errors)
            .or_keep(current.map(|b| b.isbn.clone()));
        let genre_ids = bind_field::<Vec<i32>>(payload, "genre", &mut errors)
            .or_keep(current.map(|b| b.genre_ids.clone()))
            .unwrap_or_default();
        let language_id = bind_field::<i32>(payload, "language", &mut errors)
            .or_keep(current.and_then(|b| b.language_id));

        if genre_ids.is_empty() && errors.get("genre").is_none() {
            errors.add("genre", REQUIRED);
        }

        let mut genre_ids = genre_ids;
        genre_ids.sort_unstable();
        genre_ids.dedup();

        let form = Self {
            title: require_text(title, "title", &mut errors),
            author_id,
            summary: require_text(summary, "summary", &mut errors),
            isbn: require_text(isbn, "isbn", &mut errors),
            genre_ids,
            language_id,
        };

        if let Err(e) = form.validate() {
            // a required-field error already covers an empty value
            errors.extend_missing_from(&e);
        }
        errors.into_result().map(|_| form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn valid() -> Value {
        json!({
            "title": "The Left Hand of Darkness",
            "author": 4,
            "summary": "An envoy visits the planet Gethen.",
            "isbn": "9780441478125",
            "genre": [2, 1, 2],
            "language": 1
        })
    }

    #[test]
    fn binds_a_complete_payload() {
        let form = BookForm::bind(&map(valid()), None).unwrap();
        assert_eq!(form.author_id, Some(4));
        assert_eq!(form.genre_ids, vec![1, 2]);
        assert_eq!(form.language_id, Some(1));
    }

    #[test]
    fn genre_is_required() {
        let mut payload = map(valid());
        payload.insert("genre".into(), json!([]));
        let errors = BookForm::bind(&payload, None).unwrap_err();
        assert_eq!(errors.get("genre"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn isbn_must_have_thirteen_characters() {
        let mut payload = map(valid());
        payload.insert("isbn".into(), json!("12345"));
        let errors = BookForm::bind(&payload, None).unwrap_err();
        assert_eq!(
            errors.get("isbn"),
            Some(&["ISBN must be exactly 13 characters.".to_string()][..])
        );
    }

    #[test]
    fn empty_isbn_reports_only_required() {
        let mut payload = map(valid());
        payload.insert("isbn".into(), json!(""));
        let errors = BookForm::bind(&payload, None).unwrap_err();
        assert_eq!(errors.get("isbn"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn update_merges_with_stored_values() {
        let stored = Book {
            id: 1,
            title: "Old".into(),
            author_id: Some(4),
            summary: "Summary".into(),
            isbn: "9780441478125".into(),
            language_id: None,
        };
        let current = BookForm::from_stored(&stored, vec![3]);
        let form = BookForm::bind(&map(json!({"title": "New"})), Some(&current)).unwrap();

        assert_eq!(form.title, "New");
        assert_eq!(form.genre_ids, vec![3]);
        assert_eq!(form.isbn, stored.isbn);
    }
}
