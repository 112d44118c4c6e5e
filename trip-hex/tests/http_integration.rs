//! Integration tests for the HTTP adapter.
//!
//! Requests go through the full router stack against a JSON file store in a
//! temporary directory and a fixed rate table.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use trip_hex::{CurrencyConverter, TripService, fx::DEFAULT_MAX_AGE, inbound::HttpServer};
use trip_repo::{FixedRateSource, JsonFileRepo};
use trip_types::{CurrencyCode, RateTable};

/// Helper to create a test server backed by a temporary directory.
async fn create_test_server(dir: &tempfile::TempDir) -> HttpServer<JsonFileRepo, FixedRateSource> {
    let repo = JsonFileRepo::new(dir.path()).await.unwrap();
    let rates = FixedRateSource::with_table(RateTable::from_rates(
        CurrencyCode::USD,
        [(CurrencyCode::USD, 1.0), (CurrencyCode::EUR, 0.5)],
    ));
    let fx = CurrencyConverter::new(rates, CurrencyCode::USD, DEFAULT_MAX_AGE);
    HttpServer::new(TripService::new(repo, fx))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Sends a request and returns status plus decoded JSON body.
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Creates a trip with two travelers and returns its id.
async fn create_trip(app: &Router) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/trips",
            json!({
                "name": "Lisbon",
                "destination": "Portugal",
                "start_date": "2024-05-01",
                "end_date": "2024-05-07"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["saved"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    for name in ["A", "B"] {
        let (status, _) = send(
            app,
            post_json(&format!("/api/trips/{id}/travelers"), json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    id
}

async fn add_expense(app: &Router, id: &str, body: Value) -> Value {
    let (status, body) = send(app, post_json(&format!("/api/trips/{id}/expenses"), body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_trip_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();
    let id = create_trip(&app).await;

    let (status, trip) = send(&app, get(&format!("/api/trips/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["currency"], "USD");
    assert_eq!(trip["travelers"].as_array().unwrap().len(), 2);

    let (_, listing) = send(&app, get("/api/trips")).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert!(dir.path().join(format!("{id}.json")).exists());

    let (status, deleted) = send(&app, delete(&format!("/api/trips/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["closed"], true);
    assert_eq!(deleted["deleted"], true);

    let (status, body) = send(&app, get(&format!("/api/trips/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn test_invalid_trip_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();

    let (status, body) = send(
        &app,
        post_json(
            "/api/trips",
            json!({
                "name": "Backwards",
                "start_date": "2024-05-07",
                "end_date": "2024-05-01"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_expenses_and_filters() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();
    let id = create_trip(&app).await;

    let expense = add_expense(
        &app,
        &id,
        json!({
            "description": "Dinner",
            "amount": 100.0,
            "category": "food",
            "paid_by": "A",
            "date": "2024-05-02 20:00:00"
        }),
    )
    .await;
    assert_eq!(expense["currency"], "USD");
    add_expense(
        &app,
        &id,
        json!({ "amount": 50.0, "category": "transport", "paid_by": "B" }),
    )
    .await;

    let (_, all) = send(&app, get(&format!("/api/trips/{id}/expenses"))).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, food) = send(&app, get(&format!("/api/trips/{id}/expenses?category=food"))).await;
    assert_eq!(food.as_array().unwrap().len(), 1);
    assert_eq!(food[0]["description"], "Dinner");

    let expense_id = expense["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        delete(&format!("/api/trips/{id}/expenses/{expense_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        delete(&format!("/api/trips/{id}/expenses/{expense_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_negative_amount_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();
    let id = create_trip(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/trips/{id}/expenses"),
            json!({ "amount": -5.0, "category": "food", "paid_by": "A" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_split_report() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();
    let id = create_trip(&app).await;

    add_expense(&app, &id, json!({ "amount": 100.0, "category": "food", "paid_by": "A" })).await;
    add_expense(&app, &id, json!({ "amount": 50.0, "category": "food", "paid_by": "B" })).await;

    let (status, ledger) = send(&app, get(&format!("/api/trips/{id}/reports/split"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["total"], 150.0);
    assert_eq!(ledger["fair_share"], 75.0);
    assert_eq!(ledger["balances"][0]["person"], "A");
    assert_eq!(ledger["balances"][0]["status"], "owed");
    assert_eq!(ledger["balances"][1]["status"], "owes");
    assert_eq!(ledger["transfers"][0]["from"], "B");
    assert_eq!(ledger["transfers"][0]["to"], "A");
    assert_eq!(ledger["transfers"][0]["amount"], 25.0);
}

#[tokio::test]
async fn test_split_without_travelers() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();
    let id = create_trip(&app).await;

    for name in ["A", "B"] {
        let (status, _) = send(&app, delete(&format!("/api/trips/{id}/travelers/{name}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get(&format!("/api/trips/{id}/reports/split"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No travelers to split expenses with");
}

#[tokio::test]
async fn test_summary_and_breakdowns() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();
    let id = create_trip(&app).await;

    add_expense(&app, &id, json!({ "amount": 30.0, "category": "food", "paid_by": "A", "date": "2024-05-01" })).await;
    add_expense(&app, &id, json!({ "amount": 10.0, "currency": "EUR", "category": "taxi", "paid_by": "B", "date": "2024-05-02" })).await;

    let (status, summary) = send(
        &app,
        get(&format!("/api/trips/{id}/reports/summary?convert=true")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_expenses"], 40.0);
    assert_eq!(summary["num_expenses"], 2);
    assert_eq!(summary["converted_total"]["amount"], 50.0);
    assert_eq!(summary["converted_total"]["approximated"], false);

    let (_, categories) = send(&app, get(&format!("/api/trips/{id}/reports/categories"))).await;
    assert_eq!(categories[0]["category"], "food");
    assert_eq!(categories[0]["percentage"], 75.0);

    let (_, people) = send(&app, get(&format!("/api/trips/{id}/reports/people"))).await;
    assert_eq!(people[0]["person"], "A");

    let (_, daily) = send(&app, get(&format!("/api/trips/{id}/reports/daily"))).await;
    assert_eq!(daily[0]["date"], "2024-05-01");
    assert_eq!(daily[1]["total"], 10.0);
}

#[tokio::test]
async fn test_convert() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();

    let (status, body) = send(
        &app,
        post_json(
            "/api/convert",
            json!({ "amount": 100.0, "from_currency": "USD", "to_currency": "EUR" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["converted_amount"], 50.0);
    assert_eq!(body["rate"], 0.5);
    assert_eq!(body["approximated"], false);
}

#[tokio::test]
async fn test_status_reports_backend_and_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_server(&dir).await.router();
    create_trip(&app).await;

    let (status, body) = send(&app, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage_backend"], "file");
    assert_eq!(body["open_sessions"], 1);
    assert_eq!(body["rates"]["source"], "fixed");
    assert_eq!(body["rates"]["base"], "USD");
}

#[tokio::test]
async fn test_load_restores_stored_copy() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let app = create_test_server(&dir).await.router();
        create_trip(&app).await
    };

    // a fresh server over the same directory opens the trip from disk
    let app = create_test_server(&dir).await.router();
    let (status, record) = send(&app, post_json(&format!("/api/trips/{id}/load"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["trip"]["name"], "Lisbon");
    assert_eq!(record["expenses"].as_array().unwrap().len(), 0);

    let (status, saved) = send(&app, post_json(&format!("/api/trips/{id}/save"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["saved"], true);
}
