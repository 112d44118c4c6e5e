//! # Trip Client SDK
//!
//! A typed Rust client for the trip ledger API.

use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use trip_types::report::{CategoryLine, DailyLine, PersonLine, SummaryReport};
use trip_types::{
    AddExpenseRequest, AddTravelerRequest, ConvertRequest, ConvertResponse, CreateTripRequest,
    CurrencyCode, DeleteExpenseResponse, DeleteTripResponse, Expense, ExpenseFilter, ExpenseId,
    Ledger, Persisted, SaveResponse, StatusResponse, Traveler, Trip, TripId, TripListing,
    TripRecord,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid API URL: {0}")]
    Url(String),
}

/// Trip ledger API client.
pub struct TripClient {
    base_url: String,
    http: Client,
}

impl TripClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http.get(self.url(&["health"])?).send().await?;
        Ok(resp.status().is_success())
    }

    /// Storage backend, rate cache and session counts.
    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        self.get(&["api", "status"]).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Trips
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_trip(&self, req: &CreateTripRequest) -> Result<Persisted<Trip>, ClientError> {
        self.send(Method::POST, &["api", "trips"], Some(req)).await
    }

    pub async fn get_trip(&self, id: &TripId) -> Result<Trip, ClientError> {
        self.get(&["api", "trips", id.as_str()]).await
    }

    /// Lists saved trips, newest first.
    pub async fn list_trips(&self) -> Result<Vec<TripListing>, ClientError> {
        self.get(&["api", "trips"]).await
    }

    pub async fn delete_trip(&self, id: &TripId) -> Result<DeleteTripResponse, ClientError> {
        self.send(Method::DELETE, &["api", "trips", id.as_str()], None::<&()>)
            .await
    }

    pub async fn save_trip(&self, id: &TripId) -> Result<SaveResponse, ClientError> {
        self.send(Method::POST, &["api", "trips", id.as_str(), "save"], None::<&()>)
            .await
    }

    /// Discards unsaved changes and reopens the stored copy.
    pub async fn load_trip(&self, id: &TripId) -> Result<TripRecord, ClientError> {
        self.send(Method::POST, &["api", "trips", id.as_str(), "load"], None::<&()>)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Travelers
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_traveler(
        &self,
        id: &TripId,
        name: &str,
        email: Option<&str>,
    ) -> Result<Persisted<Traveler>, ClientError> {
        let req = AddTravelerRequest {
            name: name.to_string(),
            email: email.unwrap_or_default().to_string(),
        };
        self.send(
            Method::POST,
            &["api", "trips", id.as_str(), "travelers"],
            Some(&req),
        )
        .await
    }

    pub async fn list_travelers(&self, id: &TripId) -> Result<Vec<Traveler>, ClientError> {
        self.get(&["api", "trips", id.as_str(), "travelers"]).await
    }

    pub async fn remove_traveler(
        &self,
        id: &TripId,
        name: &str,
    ) -> Result<Persisted<Trip>, ClientError> {
        self.send(
            Method::DELETE,
            &["api", "trips", id.as_str(), "travelers", name],
            None::<&()>,
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expenses
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_expense(
        &self,
        id: &TripId,
        req: &AddExpenseRequest,
    ) -> Result<Persisted<Expense>, ClientError> {
        self.send(
            Method::POST,
            &["api", "trips", id.as_str(), "expenses"],
            Some(req),
        )
        .await
    }

    pub async fn list_expenses(
        &self,
        id: &TripId,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, ClientError> {
        let mut url = self.url(&["api", "trips", id.as_str(), "expenses"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(category) = &filter.category {
                query.append_pair("category", category);
            }
            if let Some(paid_by) = &filter.paid_by {
                query.append_pair("paid_by", paid_by);
            }
        }
        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    pub async fn delete_expense(
        &self,
        id: &TripId,
        expense_id: &ExpenseId,
    ) -> Result<DeleteExpenseResponse, ClientError> {
        self.send(
            Method::DELETE,
            &["api", "trips", id.as_str(), "expenses", expense_id.as_str()],
            None::<&()>,
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────

    /// Trip summary; `convert` adds a total in the trip currency.
    pub async fn summary(&self, id: &TripId, convert: bool) -> Result<SummaryReport, ClientError> {
        let mut url = self.url(&["api", "trips", id.as_str(), "reports", "summary"])?;
        if convert {
            url.query_pairs_mut().append_pair("convert", "true");
        }
        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    pub async fn categories(&self, id: &TripId) -> Result<Vec<CategoryLine>, ClientError> {
        self.get(&["api", "trips", id.as_str(), "reports", "categories"])
            .await
    }

    pub async fn people(&self, id: &TripId) -> Result<Vec<PersonLine>, ClientError> {
        self.get(&["api", "trips", id.as_str(), "reports", "people"])
            .await
    }

    pub async fn daily(&self, id: &TripId) -> Result<Vec<DailyLine>, ClientError> {
        self.get(&["api", "trips", id.as_str(), "reports", "daily"])
            .await
    }

    pub async fn split(&self, id: &TripId) -> Result<Ledger, ClientError> {
        self.get(&["api", "trips", id.as_str(), "reports", "split"])
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Conversion
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn convert(
        &self,
        amount: f64,
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
    ) -> Result<ConvertResponse, ClientError> {
        let req = ConvertRequest {
            amount,
            from_currency,
            to_currency,
        };
        self.send(Method::POST, &["api", "convert"], Some(&req)).await
    }

    /// Joins percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ClientError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let resp = self.http.get(self.url(segments)?).send().await?;
        self.handle_response(resp).await
    }

    async fn send<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let mut req = self.http.request(method, self.url(segments)?);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }
        Err(api_error(status.as_u16(), body))
    }
}

/// Error body returned by the API: `{"error": "...", "code": 404}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Prefers the API's own message, falling back to the raw body.
fn api_error(status: u16, body: String) -> ClientError {
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) => body,
    };
    ClientError::Api { status, message }
}
