//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use trip_types::{
    AddExpenseRequest, AddTravelerRequest, AppError, ConvertRequest, CreateTripRequest,
    ExpenseFilter, ExpenseId, RateSource, SummaryQuery, TripId, TripRepository,
};

use crate::TripService;

/// Application state shared across handlers.
pub struct AppState<R: TripRepository, S: RateSource> {
    pub service: TripService<R, S>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::BadRequest(_) | AppError::NoParticipants => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Degraded(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let message = match &self.0 {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn trip_id(raw: &str) -> Result<TripId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(AppError::BadRequest("Invalid trip ID".into())))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub async fn status<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
) -> impl IntoResponse {
    Json(state.service.status())
}

// ─────────────────────────────────────────────────────────────────────────────
// Trips
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state))]
pub async fn create_trip<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Json(req): Json<CreateTripRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.service.create_trip(req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List saved trips, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_trips<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let trips = state.service.list_trips().await?;
    Ok(Json(trips))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn get_trip<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let trip = state.service.get_trip(&trip_id(&id)?).await?;
    Ok(Json(trip))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn delete_trip<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.service.delete_trip(&trip_id(&id)?).await?;
    Ok(Json(deleted))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn save_trip<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = state.service.save_trip(&trip_id(&id)?).await?;
    Ok(Json(saved))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn load_trip<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.service.load_trip(&trip_id(&id)?).await?;
    Ok(Json(record))
}

// ─────────────────────────────────────────────────────────────────────────────
// Travelers
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn add_traveler<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
    Json(req): Json<AddTravelerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let added = state.service.add_traveler(&trip_id(&id)?, req).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn list_travelers<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let travelers = state.service.list_travelers(&trip_id(&id)?).await?;
    Ok(Json(travelers))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn remove_traveler<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path((id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let trip = state.service.remove_traveler(&trip_id(&id)?, &name).await?;
    Ok(Json(trip))
}

// ─────────────────────────────────────────────────────────────────────────────
// Expenses
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn add_expense<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let added = state.service.add_expense(&trip_id(&id)?, req).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn list_expenses<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let expenses = state.service.list_expenses(&trip_id(&id)?, &filter).await?;
    Ok(Json(expenses))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn delete_expense<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path((id, expense_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let expense_id: ExpenseId = expense_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid expense ID".into()))?;
    let deleted = state
        .service
        .delete_expense(&trip_id(&id)?, &expense_id)
        .await?;
    Ok(Json(deleted))
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn summary_report<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.service.summary(&trip_id(&id)?, query.convert).await?;
    Ok(Json(report))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn category_report<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state.service.categories(&trip_id(&id)?).await?;
    Ok(Json(lines))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn people_report<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state.service.people(&trip_id(&id)?).await?;
    Ok(Json(lines))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn daily_report<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state.service.daily(&trip_id(&id)?).await?;
    Ok(Json(lines))
}

#[tracing::instrument(skip(state), fields(trip_id = %id))]
pub async fn split_report<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ledger = state.service.split(&trip_id(&id)?).await?;
    Ok(Json(ledger))
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state))]
pub async fn convert<R: TripRepository, S: RateSource>(
    State(state): State<Arc<AppState<R, S>>>,
    Json(req): Json<ConvertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let converted = state.service.convert(req).await?;
    Ok(Json(converted))
}
