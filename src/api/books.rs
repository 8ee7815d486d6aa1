//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookDetail},
        form::FormDescription,
        page::{BookPage, PageQuery},
    },
    views::{BOOK_CREATE, BOOK_DELETE, BOOK_LIST, BOOK_UPDATE},
};

use super::{AuthenticatedUser, API_PREFIX};

/// Writable book fields; updates may send any subset
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
pub struct BookPayload {
    pub title: Option<String>,
    /// Author id
    pub author: Option<i32>,
    pub summary: Option<String>,
    /// 13-character ISBN
    pub isbn: Option<String>,
    /// Genre ids, at least one
    pub genre: Option<Vec<i32>>,
    /// Language id
    pub language: Option<i32>,
}

/// List books, five per page ordered by title
#[utoipa::path(
    get,
    path = "/catalog/books",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of books", body = BookPage),
        (status = 404, description = "No such page")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.catalog.list_books(&BOOK_LIST, &query).await?;
    Ok(Json(page))
}

/// Get book details with its copies
#[utoipa::path(
    get,
    path = "/catalog/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Blank book form with its initial values
#[utoipa::path(
    get,
    path = "/catalog/books/create",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Create form", body = FormDescription),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn create_book_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FormDescription>> {
    claims.require(BOOK_CREATE.permission)?;

    let form = state.services.catalog.book_form(&BOOK_CREATE).await?;
    Ok(Json(form))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/catalog/books/create",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 422, description = "Invalid form", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<Map<String, Value>>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<Book>)> {
    claims.require(BOOK_CREATE.permission)?;

    let book = state.services.catalog.create_book(&BOOK_CREATE, payload).await?;
    let location = format!("{}/catalog/books/{}", API_PREFIX, book.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

/// Update a book; omitted fields keep their stored value
#[utoipa::path(
    put,
    path = "/catalog/books/{id}/update",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid form", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<Map<String, Value>>,
) -> AppResult<Json<Book>> {
    claims.require(BOOK_UPDATE.permission)?;

    let book = state.services.catalog.update_book(&BOOK_UPDATE, id, payload).await?;
    Ok(Json(book))
}

/// Delete a book and redirect to the book list
#[utoipa::path(
    delete,
    path = "/catalog/books/{id}/delete",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 303, description = "Book deleted, redirect to list"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still has copies")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    claims.require(BOOK_DELETE.permission)?;

    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to(BOOK_DELETE.success_url))
}
