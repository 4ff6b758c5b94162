//! End-to-end tests for the REST surface and its real-time notifications

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use finance_tracker::{create_router, AppState, Settings, Store};

const SECRET: &str = "test-secret-with-at-least-32-characters!";

fn test_state(store: Store) -> Arc<AppState> {
    let settings = Settings {
        jwt_secret: SECRET.to_string(),
        ..Settings::default()
    };
    Arc::new(AppState::new(settings, Arc::new(store)))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Register and log in; returns (token, user id)
async fn sign_up(app: &Router, email: &str) -> (String, String) {
    let (status, profile) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": email, "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", profile);

    let (status, login) = call(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": email, "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["token_type"], "bearer");

    (
        login["access_token"].as_str().unwrap().to_string(),
        profile["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = create_router(test_state(Store::in_memory()));
    let (token, user_id) = sign_up(&app, "alice@example.com").await;

    let (status, me) = call(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id.as_str());
    assert_eq!(me["email"], "alice@example.com");
    assert_eq!(me["username"], "alice");
    assert!(me.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = create_router(test_state(Store::in_memory()));
    sign_up(&app, "bob@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": "bob@example.com", "password": "another1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already registered");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = create_router(test_state(Store::in_memory()));
    sign_up(&app, "carol@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "carol@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect email or password");
}

#[tokio::test]
async fn test_entry_crud_flow() {
    let app = create_router(test_state(Store::in_memory()));
    let (token, user_id) = sign_up(&app, "dave@example.com").await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/expenses",
        Some(&token),
        Some(json!({
            "title": "Groceries",
            "amount": 42.5,
            "category": "Food",
            "type": "expense",
            "date": "2024-03-01T12:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user_id"], user_id.as_str());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = call(&app, Method::GET, &format!("/expenses/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Groceries");

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/expenses/{}", id),
        Some(&token),
        Some(json!({"amount": 50.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], 50.0);
    assert_eq!(updated["title"], "Groceries");

    let (status, list) = call(&app, Method::GET, "/expenses?category=foo", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["expenses"].as_array().unwrap().len(), 1);
    assert_eq!(list["total"], 1);

    let (status, _) = call(&app, Method::DELETE, &format!("/expenses/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &format!("/expenses/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_entries_are_private_to_their_owner() {
    let app = create_router(test_state(Store::in_memory()));
    let (owner, _) = sign_up(&app, "erin@example.com").await;
    let (intruder, _) = sign_up(&app, "frank@example.com").await;

    let (_, created) = call(
        &app,
        Method::POST,
        "/expenses",
        Some(&owner),
        Some(json!({"title": "Rent", "amount": 900.0, "category": "Housing"})),
    )
    .await;
    let uri = format!("/expenses/{}", created["id"].as_str().unwrap());

    let (status, _) = call(&app, Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_entry_is_rejected() {
    let app = create_router(test_state(Store::in_memory()));
    let (token, _) = sign_up(&app, "gina@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/expenses",
        Some(&token),
        Some(json!({"title": "Refund", "amount": -5.0, "category": "Misc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_stats_endpoints() {
    let app = create_router(test_state(Store::in_memory()));
    let (token, _) = sign_up(&app, "hank@example.com").await;

    for body in [
        json!({"title": "Salary", "amount": 1000.0, "category": "Work", "type": "income"}),
        json!({"title": "Lunch", "amount": 15.0, "category": "Food"}),
        json!({"title": "Dinner", "amount": 35.0, "category": "Food"}),
        json!({"title": "Bus", "amount": 3.0, "category": "Transport"}),
    ] {
        let (status, _) = call(&app, Method::POST, "/expenses", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) = call(&app, Method::GET, "/expenses/stats/summary", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        summary,
        json!({"income_total": 1000.0, "expense_total": 53.0, "balance": 947.0})
    );

    let (status, by_category) =
        call(&app, Method::GET, "/expenses/stats/by-category", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        by_category,
        json!([
            {"category": "Food", "total_amount": 50.0, "count": 2},
            {"category": "Transport", "total_amount": 3.0, "count": 1}
        ])
    );
}

#[tokio::test]
async fn test_writes_notify_owner_connections() {
    let state = test_state(Store::in_memory());
    let app = create_router(state.clone());
    let (token, user_id) = sign_up(&app, "ivy@example.com").await;

    let (handle, mut queue) = state.registry.open_connection(8);
    state.registry.register(&user_id, handle);

    let (_, created) = call(
        &app,
        Method::POST,
        "/expenses",
        Some(&token),
        Some(json!({"title": "Coffee", "amount": 4.0, "category": "Food"})),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let next = |text: Option<String>| -> Value { serde_json::from_str(&text.unwrap()).unwrap() };

    let event = next(tokio::time::timeout(Duration::from_secs(2), queue.recv()).await.unwrap());
    assert_eq!(event["type"], "new_expense");
    assert_eq!(event["payload"]["id"], id.as_str());

    call(
        &app,
        Method::PUT,
        &format!("/expenses/{}", id),
        Some(&token),
        Some(json!({"title": "Espresso"})),
    )
    .await;
    let event = next(tokio::time::timeout(Duration::from_secs(2), queue.recv()).await.unwrap());
    assert_eq!(event["type"], "expense_updated");
    assert_eq!(event["payload"]["title"], "Espresso");

    call(&app, Method::DELETE, &format!("/expenses/{}", id), Some(&token), None).await;
    let event = next(tokio::time::timeout(Duration::from_secs(2), queue.recv()).await.unwrap());
    assert_eq!(
        event,
        json!({"type": "expense_deleted", "payload": {"expense_id": id}})
    );
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("finance.jsonl");

    {
        let app = create_router(test_state(Store::open(&path).unwrap()));
        let (token, _) = sign_up(&app, "jack@example.com").await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/expenses",
            Some(&token),
            Some(json!({"title": "Book", "amount": 12.0, "category": "Education"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let app = create_router(test_state(Store::open(&path).unwrap()));
    let (status, login) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "jack@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["access_token"].as_str().unwrap();

    let (_, list) = call(&app, Method::GET, "/expenses", Some(token), None).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["expenses"][0]["title"], "Book");
}
