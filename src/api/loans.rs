//! Loan listing and renewal endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstanceFilter, LoanStatus},
        page::{LoanPage, PageQuery},
        renewal::{RenewBookRequest, RenewalForm},
    },
    services::renewals::RenewalOutcome,
    views::{ALL_BORROWED, LOANED_BY_USER, STAFF},
};

use super::{today, AuthenticatedUser};

/// Where a successful renewal sends the librarian
pub const RENEWAL_SUCCESS_URL: &str = "/api/v1/catalog/borrowed";

/// Copies on loan to the caller, soonest due first
#[utoipa::path(
    get,
    path = "/catalog/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's loans", body = LoanPage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such page")
    )
)]
pub async fn loaned_by_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<LoanPage>> {
    let filter = BookInstanceFilter {
        status: Some(LoanStatus::OnLoan),
        borrower_id: Some(claims.user_id),
    };

    let page = state
        .services
        .catalog
        .list_loans(&LOANED_BY_USER, &filter, &query, today())
        .await?;
    Ok(Json(page))
}

/// Every copy on loan, for staff
#[utoipa::path(
    get,
    path = "/catalog/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All loans", body = LoanPage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "No such page")
    )
)]
pub async fn all_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<LoanPage>> {
    claims.require(STAFF)?;

    let filter = BookInstanceFilter {
        status: Some(LoanStatus::OnLoan),
        borrower_id: None,
    };

    let page = state
        .services
        .catalog
        .list_loans(&ALL_BORROWED, &filter, &query, today())
        .await?;
    Ok(Json(page))
}

/// Renewal form pre-filled with a date three weeks out
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewalForm),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_book_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalForm>> {
    claims.require(STAFF)?;

    let form = state.services.renewals.present(id, today()).await?;
    Ok(Json(form))
}

/// Submit a new due date for a copy
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewBookRequest,
    responses(
        (status = 303, description = "Renewed, redirect to all borrowed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Book instance not found"),
        (status = 415, description = "Body is not JSON"),
        (status = 422, description = "Date rejected, form redisplayed", body = RenewalForm)
    )
)]
pub async fn renew_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    claims.require(STAFF)?;

    // Body is only looked at once the caller may renew
    let request = match body {
        Ok(Json(body)) => RenewBookRequest::from_json(&body),
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let outcome = state.services.renewals.submit(id, &request, today()).await?;

    Ok(match outcome {
        RenewalOutcome::Renewed(_) => Redirect::to(RENEWAL_SUCCESS_URL).into_response(),
        RenewalOutcome::Rejected(form) => (StatusCode::UNPROCESSABLE_ENTITY, Json(form)).into_response(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::Duration;
    use mockall::predicate::eq;
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        api::{create_router, test_support},
        error::AppError,
        models::book_instance::BookInstance,
        repository::book_instances::MockBookInstanceStore,
    };

    const STAFF_PERMISSION: &str = "catalog.can_mark_returned";

    fn copy(id: Uuid) -> BookInstance {
        BookInstance {
            id,
            book_id: 1,
            imprint: "Ace, 1965".to_string(),
            due_back: Some(today() + Duration::days(2)),
            status: LoanStatus::OnLoan,
            borrower_id: Some(3),
        }
    }

    fn renew_uri(id: Uuid) -> String {
        format!("/api/v1/catalog/book/{}/renew", id)
    }

    fn store_with(id: Uuid) -> MockBookInstanceStore {
        let mut store = MockBookInstanceStore::new();
        store
            .expect_get_by_id()
            .with(eq(id))
            .returning(|id| Ok(copy(id)));
        store
    }

    #[tokio::test]
    async fn form_proposes_three_weeks_from_today() {
        let id = Uuid::new_v4();
        let app = create_router(test_support::state(Arc::new(store_with(id))));
        let auth = test_support::bearer(&[STAFF_PERMISSION]);

        let response = app
            .oneshot(test_support::get(&renew_uri(id), Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = test_support::json_body(response).await;
        let expected = (today() + Duration::days(21)).format("%Y-%m-%d").to_string();
        assert_eq!(body["renewal_date"], expected);
        assert_eq!(body["book_instance"]["id"], id.to_string());
    }

    #[tokio::test]
    async fn valid_date_is_saved_and_redirects_to_borrowed() {
        let id = Uuid::new_v4();
        let due = today() + Duration::days(7);

        let mut store = store_with(id);
        store
            .expect_set_due_back()
            .with(eq(id), eq(due))
            .times(1)
            .returning(|_, _| Ok(()));

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&[STAFF_PERMISSION]);

        let response = app
            .oneshot(test_support::post_json(
                &renew_uri(id),
                Some(&auth),
                json!({"renewal_date": due.format("%Y-%m-%d").to_string()}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            RENEWAL_SUCCESS_URL
        );
    }

    #[tokio::test]
    async fn past_date_redisplays_form_without_writing() {
        let id = Uuid::new_v4();
        let mut store = store_with(id);
        store.expect_set_due_back().never();

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&[STAFF_PERMISSION]);
        let yesterday = (today() - Duration::days(1)).format("%Y-%m-%d").to_string();

        let response = app
            .oneshot(test_support::post_json(
                &renew_uri(id),
                Some(&auth),
                json!({ "renewal_date": yesterday }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = test_support::json_body(response).await;
        assert_eq!(body["renewal_date"], yesterday);
        assert_eq!(
            body["errors"]["renewal_date"],
            json!(["Invalid date - renewal in past."])
        );
    }

    #[tokio::test]
    async fn missing_permission_is_forbidden_and_writes_nothing() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store.expect_get_by_id().never();
        store.expect_set_due_back().never();

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&["catalog.view_book"]);

        let response = app
            .oneshot(test_support::post_json(
                &renew_uri(id),
                Some(&auth),
                json!({"renewal_date": today().format("%Y-%m-%d").to_string()}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn wrongly_typed_body_from_uncapable_caller_is_forbidden() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store.expect_get_by_id().never();
        store.expect_set_due_back().never();

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&["catalog.view_book"]);

        let response = app
            .oneshot(test_support::post_json(
                &renew_uri(id),
                Some(&auth),
                json!({ "renewal_date": 20240120 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn form_encoded_body_from_uncapable_caller_is_forbidden() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store.expect_get_by_id().never();
        store.expect_set_due_back().never();

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&[]);
        let request = Request::post(renew_uri(id))
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("renewal_date=2024-01-20"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn non_string_date_redisplays_form_as_invalid() {
        let id = Uuid::new_v4();
        let mut store = store_with(id);
        store.expect_set_due_back().never();

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&[STAFF_PERMISSION]);

        let response = app
            .oneshot(test_support::post_json(
                &renew_uri(id),
                Some(&auth),
                json!({ "renewal_date": 20240120 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = test_support::json_body(response).await;
        assert_eq!(body["renewal_date"], "20240120");
        assert_eq!(body["errors"]["renewal_date"], json!(["Enter a valid date."]));
    }

    #[tokio::test]
    async fn missing_date_redisplays_form_as_required() {
        let id = Uuid::new_v4();
        let mut store = store_with(id);
        store.expect_set_due_back().never();

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&[STAFF_PERMISSION]);

        let response = app
            .oneshot(test_support::post_json(
                &renew_uri(id),
                Some(&auth),
                json!({ "renewal_date": null }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = test_support::json_body(response).await;
        assert_eq!(body["errors"]["renewal_date"], json!(["This field is required."]));
    }

    #[tokio::test]
    async fn anonymous_caller_is_unauthenticated() {
        let app = create_router(test_support::state(Arc::new(MockBookInstanceStore::new())));

        let response = app
            .oneshot(test_support::get(&renew_uri(Uuid::new_v4()), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_copy_is_not_found() {
        let mut store = MockBookInstanceStore::new();
        store
            .expect_get_by_id()
            .returning(|_| Err(AppError::NotFound("Book instance not found".to_string())));

        let app = create_router(test_support::state(Arc::new(store)));
        let auth = test_support::bearer(&[STAFF_PERMISSION]);

        let response = app
            .oneshot(test_support::get(&renew_uri(Uuid::new_v4()), Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn borrowed_list_requires_staff() {
        let app = create_router(test_support::state(Arc::new(MockBookInstanceStore::new())));
        let auth = test_support::bearer(&[]);

        let response = app
            .oneshot(test_support::get("/api/v1/catalog/borrowed", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
