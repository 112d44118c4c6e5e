//! End-to-end flows: a real server on a local port driven through the client SDK.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use trip_client::{ClientError, TripClient};
use trip_hex::{CurrencyConverter, TripService, fx::DEFAULT_MAX_AGE, inbound::HttpServer};
use trip_repo::{FixedRateSource, build_repo};
use trip_types::{
    AddExpenseRequest, BalanceStatus, CreateTripRequest, CurrencyCode, ExpenseFilter,
};

/// Starts a server over `storage_url` and returns a client pointed at it.
async fn start_server(storage_url: &str) -> TripClient {
    let repo = build_repo(storage_url).await.unwrap();
    let fx = CurrencyConverter::new(FixedRateSource::reference(), CurrencyCode::USD, DEFAULT_MAX_AGE);
    let router = HttpServer::new(TripService::new(repo, fx)).router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TripClient::new(format!("http://{addr}"))
}

fn expense(amount: f64, category: &str, paid_by: &str) -> AddExpenseRequest {
    AddExpenseRequest {
        description: String::new(),
        amount,
        currency: None,
        category: category.into(),
        paid_by: paid_by.into(),
        date: None,
        split_with: Vec::new(),
    }
}

async fn settle_a_trip(client: &TripClient) {
    assert!(client.health().await.unwrap());

    let trip = client
        .create_trip(&CreateTripRequest {
            name: "Kyoto".into(),
            destination: "Japan".into(),
            start_date: "2024-04-01".parse().unwrap(),
            end_date: "2024-04-10".parse().unwrap(),
            currency: CurrencyCode::USD,
        })
        .await
        .unwrap();
    assert!(trip.saved);
    let id = trip.data.id;

    for name in ["Ana María", "Bo"] {
        client.add_traveler(&id, name, None).await.unwrap();
    }
    client.add_expense(&id, &expense(90.0, "lodging", "Ana María")).await.unwrap();
    client.add_expense(&id, &expense(30.0, "food", "Bo")).await.unwrap();

    let food = ExpenseFilter {
        category: Some("food".into()),
        ..Default::default()
    };
    assert_eq!(client.list_expenses(&id, &food).await.unwrap().len(), 1);

    let ledger = client.split(&id).await.unwrap();
    assert_eq!(ledger.fair_share, 60.0);
    assert_eq!(ledger.balances[0].person, "Ana María");
    assert_eq!(ledger.balances[0].status, BalanceStatus::Owed);
    assert_eq!(ledger.transfers.len(), 1);
    assert_eq!(ledger.transfers[0].amount, 30.0);

    let listing = client.list_trips().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].expense_count, 2);

    let removed = client.remove_traveler(&id, "Ana María").await.unwrap();
    assert_eq!(removed.data.travelers.len(), 1);

    client.delete_trip(&id).await.unwrap();
    match client.get_trip(&id).await {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {other:?}"),
    }
}

#[tokio::test]
async fn test_file_store_flow() {
    let dir = tempfile::tempdir().unwrap();
    let client = start_server(&format!("file://{}", dir.path().display())).await;
    settle_a_trip(&client).await;
    assert_eq!(client.status().await.unwrap().storage_backend, "file");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_flow() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("trips.db").display());
    let client = start_server(&url).await;
    settle_a_trip(&client).await;
    assert_eq!(client.status().await.unwrap().storage_backend, "sqlite");
}

#[tokio::test]
async fn test_convert_with_reference_rates() {
    let dir = tempfile::tempdir().unwrap();
    let client = start_server(&dir.path().display().to_string()).await;

    let same = client
        .convert(25.0, CurrencyCode::EUR, CurrencyCode::EUR)
        .await
        .unwrap();
    assert_eq!(same.converted_amount, 25.0);
    assert_eq!(same.rate, 1.0);

    let converted = client
        .convert(100.0, CurrencyCode::USD, CurrencyCode::EUR)
        .await
        .unwrap();
    assert!(!converted.approximated);
    assert!(converted.converted_amount > 0.0);

    let status = client.status().await.unwrap();
    assert_eq!(status.rates.source, "fixed");
    assert!(!status.rates.stale);
}
