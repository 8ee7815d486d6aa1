//! API integration tests against a running server and seeded database

use chrono::{Duration, Local, Utc};
use locallibrary_server::models::UserClaims;
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const STAFF: &str = "catalog.can_mark_returned";

/// Bearer token signed with the server's secret
fn token(user_id: i32, permissions: &[&str]) -> String {
    let secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = Utc::now();

    UserClaims {
        sub: user_id.to_string(),
        user_id,
        username: format!("user{}", user_id),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

/// Client that reports redirects instead of following them
fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// First copy listed as on loan, if the seed data has one
async fn first_loan(client: &Client, auth: &str) -> Option<String> {
    let body: Value = client
        .get(format!("{}/catalog/borrowed", BASE_URL))
        .header("Authorization", auth)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    body["items"][0]["id"].as_str().map(str::to_string)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_index_counts_visits_per_session() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    let first: Value = client
        .get(format!("{}/catalog", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(first["num_visits"], 0);
    assert!(first["num_books"].is_number());

    let second: Value = client
        .get(format!("{}/catalog", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(second["num_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_list_books_paginates_by_five() {
    let response = client()
        .get(format!("{}/catalog/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].as_array().expect("items").len() <= 5);
    assert_eq!(body["page_size"], 5);
}

#[tokio::test]
#[ignore]
async fn test_page_out_of_range_is_not_found() {
    let response = client()
        .get(format!("{}/catalog/authors?page=9999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_renewal_requires_authentication() {
    let response = client()
        .post(format!("{}/catalog/book/{}/renew", BASE_URL, uuid::Uuid::new_v4()))
        .json(&json!({ "renewal_date": "2030-01-01" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_renewal_of_unknown_copy_is_not_found() {
    let auth = format!("Bearer {}", token(1, &[STAFF]));

    let response = client()
        .get(format!("{}/catalog/book/{}/renew", BASE_URL, uuid::Uuid::new_v4()))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_renew_loan() {
    let client = client();
    let auth = format!("Bearer {}", token(1, &[STAFF]));
    let Some(id) = first_loan(&client, &auth).await else {
        return;
    };
    let today = Local::now().date_naive();

    // Too far ahead: rejected, nothing written
    let response = client
        .post(format!("{}/catalog/book/{}/renew", BASE_URL, id))
        .header("Authorization", &auth)
        .json(&json!({ "renewal_date": (today + Duration::weeks(5)).to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["errors"]["renewal_date"][0],
        "Invalid date - renewal more than 4 weeks ahead."
    );

    // Exactly four weeks: accepted
    let due = today + Duration::weeks(4);
    let response = client
        .post(format!("{}/catalog/book/{}/renew", BASE_URL, id))
        .header("Authorization", &auth)
        .json(&json!({ "renewal_date": due.to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/api/v1/catalog/borrowed");

    let form: Value = client
        .get(format!("{}/catalog/book/{}/renew", BASE_URL, id))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(form["book_instance"]["due_back"], due.to_string());
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_author() {
    let client = client();
    let auth = format!("Bearer {}", token(1, &[STAFF]));

    let response = client
        .post(format!("{}/catalog/authors/create", BASE_URL))
        .header("Authorization", &auth)
        .json(&json!({
            "first_name": "Test",
            "last_name": "Author",
            "date_of_birth": "1950-01-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key("location"));

    let body: Value = response.json().await.expect("Failed to parse response");
    let author_id = body["id"].as_i64().expect("No author ID");

    let response = client
        .delete(format!("{}/catalog/authors/{}/delete", BASE_URL, author_id))
        .header("Authorization", &auth)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/api/v1/catalog/authors");
}

#[tokio::test]
#[ignore]
async fn test_create_book_reports_field_errors() {
    let auth = format!("Bearer {}", token(1, &[STAFF]));

    let response = client()
        .post(format!("{}/catalog/books/create", BASE_URL))
        .header("Authorization", &auth)
        .json(&json!({ "title": "No ISBN", "isbn": "123" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["fields"]["isbn"].is_array());
    assert!(body["fields"]["genre"].is_array());
}
