//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Redirect,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetail},
        form::FormDescription,
        page::{AuthorPage, PageQuery},
    },
    views::{AUTHOR_CREATE, AUTHOR_DELETE, AUTHOR_LIST, AUTHOR_UPDATE},
};

use super::{AuthenticatedUser, API_PREFIX};

/// Writable author fields; updates may send any subset
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
pub struct AuthorPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    /// Null or empty clears the date
    pub date_of_death: Option<NaiveDate>,
}

/// List authors, ten per page ordered by last then first name
#[utoipa::path(
    get,
    path = "/catalog/authors",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of authors", body = AuthorPage),
        (status = 404, description = "No such page")
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AuthorPage>> {
    let page = state.services.catalog.list_authors(&AUTHOR_LIST, &query).await?;
    Ok(Json(page))
}

/// Get author details with their books
#[utoipa::path(
    get,
    path = "/catalog/authors/{id}",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

#[utoipa::path(
    get,
    path = "/catalog/authors/create",
    tag = "authors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Create form", body = FormDescription),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn create_author_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FormDescription>> {
    claims.require(AUTHOR_CREATE.permission)?;

    Ok(Json(state.services.catalog.author_form(&AUTHOR_CREATE)))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/catalog/authors/create",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorPayload,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 422, description = "Invalid form", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<Map<String, Value>>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<Author>)> {
    claims.require(AUTHOR_CREATE.permission)?;

    let author = state.services.catalog.create_author(&AUTHOR_CREATE, payload).await?;
    let location = format!("{}/catalog/authors/{}", API_PREFIX, author.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(author)))
}

/// Update an author; omitted fields keep their stored value
#[utoipa::path(
    put,
    path = "/catalog/authors/{id}/update",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorPayload,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Author not found"),
        (status = 422, description = "Invalid form", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<Map<String, Value>>,
) -> AppResult<Json<Author>> {
    claims.require(AUTHOR_UPDATE.permission)?;

    let author = state
        .services
        .catalog
        .update_author(&AUTHOR_UPDATE, id, payload)
        .await?;
    Ok(Json(author))
}

/// Delete an author and redirect to the author list
#[utoipa::path(
    delete,
    path = "/catalog/authors/{id}/delete",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 303, description = "Author deleted, redirect to list"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Author not found"),
        (status = 409, description = "Author still referenced where the schema does not clear it")
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    claims.require(AUTHOR_DELETE.permission)?;

    state.services.catalog.delete_author(id).await?;
    Ok(Redirect::to(AUTHOR_DELETE.success_url))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::{
        api::{create_router, test_support},
        repository::book_instances::MockBookInstanceStore,
    };

    fn app() -> axum::Router {
        create_router(test_support::state(Arc::new(MockBookInstanceStore::new())))
    }

    #[tokio::test]
    async fn create_form_shows_allowed_fields_and_initial_birth_date() {
        let auth = test_support::bearer(&["catalog.can_mark_returned"]);
        let response = app()
            .oneshot(test_support::get("/api/v1/catalog/authors/create", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = test_support::json_body(response).await;
        assert_eq!(
            body["fields"],
            json!(["first_name", "last_name", "date_of_birth", "date_of_death"])
        );
        assert_eq!(body["initial"]["date_of_birth"], "2020-11-06");
    }

    #[tokio::test]
    async fn invalid_token_is_unauthenticated() {
        let response = app()
            .oneshot(test_support::post_json(
                "/api/v1/catalog/authors/create",
                Some("Bearer not-a-token"),
                json!({"first_name": "Ada", "last_name": "Lovelace"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
