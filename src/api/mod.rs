//! API handlers for the catalog REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod index;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{delete, get, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Local, NaiveDate};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Prefix every route is nested under
pub const API_PREFIX: &str = "/api/v1";

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::Authentication("Missing or malformed bearer token".to_string())
                })?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Server-local calendar date, read once per request
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Home
        .route("/catalog", get(index::index))
        // Books
        .route("/catalog/books", get(books::list_books))
        .route(
            "/catalog/books/create",
            get(books::create_book_form).post(books::create_book),
        )
        .route("/catalog/books/:id", get(books::get_book))
        .route("/catalog/books/:id/update", put(books::update_book))
        .route("/catalog/books/:id/delete", delete(books::delete_book))
        // Authors
        .route("/catalog/authors", get(authors::list_authors))
        .route(
            "/catalog/authors/create",
            get(authors::create_author_form).post(authors::create_author),
        )
        .route("/catalog/authors/:id", get(authors::get_author))
        .route("/catalog/authors/:id/update", put(authors::update_author))
        .route("/catalog/authors/:id/delete", delete(authors::delete_author))
        // Loans
        .route("/catalog/mybooks", get(loans::loaned_by_user))
        .route("/catalog/borrowed", get(loans::all_borrowed))
        .route(
            "/catalog/book/:id/renew",
            get(loans::renew_book_form).post(loans::renew_book),
        )
        .with_state(state);

    Router::new()
        .nest(API_PREFIX, api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response},
    };
    use sqlx::postgres::PgPoolOptions;

    use crate::{
        config::AppConfig,
        models::user::tests::claims,
        repository::{BookInstanceStore, Repository},
        services::{
            sessions::MemorySessionStore,
            stats::{CatalogStats, MockCatalogStats},
            Services,
        },
        AppState,
    };

    pub const SECRET: &str = "test-secret";

    /// State over a pool that never connects; routes under test must not
    /// reach the database
    pub fn state(book_instances: Arc<dyn BookInstanceStore>) -> AppState {
        state_with(book_instances, Arc::new(MockCatalogStats::new()))
    }

    pub fn state_with(
        book_instances: Arc<dyn BookInstanceStore>,
        stats: Arc<dyn CatalogStats>,
    ) -> AppState {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = SECRET.to_string();
        let ttl = Duration::from_secs(config.session.ttl_seconds);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");

        AppState {
            config: Arc::new(config),
            services: Arc::new(Services::with_stores(
                Repository::new(pool),
                book_instances,
                Arc::new(MemorySessionStore::new(ttl)),
                stats,
            )),
        }
    }

    pub fn bearer(permissions: &[&str]) -> String {
        let token = claims(permissions).create_token(SECRET).expect("token");
        format!("Bearer {}", token)
    }

    pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).expect("request")
    }

    pub fn post_json(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    pub async fn json_body(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }
}
