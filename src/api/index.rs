//! Catalog home page

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    services::{sessions::SessionService, stats::CatalogCounts},
};

/// Home page payload
#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits from this session before the current one
    pub num_visits: u64,
}

/// Record counts and the caller's visit counter
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counts", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexResponse>)> {
    let session = &state.config.session;
    let counts = state.services.stats.catalog_counts().await?;

    // Unknown cookie values are replaced, never used as store keys
    let session_id = jar
        .get(&session.cookie_name)
        .and_then(|c| SessionService::parse_session_id(c.value()))
        .unwrap_or_else(SessionService::new_session_id);

    let num_visits = state.services.sessions.record_visit(&session_id).await?;

    let cookie = Cookie::build((session.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Json(IndexResponse { counts, num_visits })))
}
