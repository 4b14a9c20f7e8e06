// src/server.rs
//
// The HTTP surface. The dashboard shell keeps every rendering concern to
// itself and talks JSON to these handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::aggregate::{aggregate, planning_view, ranked_by_category, SpendSummary};
use crate::config::Config;
use crate::ingest::{
    cell_text, compose_order, ingest_csv_text, ingest_grid, ingest_text, IngestOutcome,
};
use crate::parser::{parse_flexible_date, ParsedRecord};
use crate::schedule::{date_window, month_jump, shift_pivot};
use crate::store::{MergeMode, WorkOrderStore};
use crate::work_order::{
    detect_work_type, normalize_category, OrderId, Shift, WorkOrder, CATEGORY_API, CATEGORY_OPEX,
    WORK_TYPE_PREVENTIVO,
};

/// The schedule endpoint never hands out more than a month at once.
const MAX_WINDOW_DAYS: u32 = 31;

// --- Application State ---

#[derive(Clone)]
pub struct AppState {
    pub store: WorkOrderStore,
    pub config: Arc<Config>,
}

// --- Error Handling ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Empty payload")]
    EmptyPayload,
    #[error("No rows could be read from the payload")]
    NothingImported { skipped: usize },
    #[error("Work order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Activity must not be empty")]
    MissingActivity,
    #[error("Invalid date '{0}', expected DD/MM/YYYY or YYYY-MM-DD")]
    InvalidDate(String),
    #[error("CSV payload could not be decoded: {0}")]
    CsvDecode(#[from] csv::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::EmptyPayload
            | AppError::MissingActivity
            | AppError::InvalidDate(_)
            | AppError::CsvDecode(_) => StatusCode::BAD_REQUEST,
            AppError::NothingImported { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        };
        warn!("Request failed: {}", self);
        let body = match &self {
            AppError::NothingImported { skipped } => json!({
                "error": self.to_string(),
                "accepted": 0,
                "skipped": skipped,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

// --- Router ---

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/orders",
            get(list_orders).post(add_order).delete(clear_orders),
        )
        .route("/orders/{id}", delete(delete_order))
        .route("/orders/paste", post(paste_orders))
        .route("/orders/import", post(import_grid))
        .route("/orders/import-csv", post(import_csv))
        .route("/metrics", get(metrics))
        .route("/schedule", get(schedule_board));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Handlers ---

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "orders": state.store.count() }))
}

async fn list_orders(State(state): State<AppState>) -> Json<Vec<WorkOrder>> {
    Json(state.store.snapshot())
}

/// Body of the manual add form. Only the activity and the amount are
/// mandatory; everything else takes the form's defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub activity: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_shift: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub end_shift: Option<String>,
}

/// The manual form posts explicit dates, so unlike the tolerant bulk paths a
/// non-empty date that does not parse is rejected instead of dropped.
fn parse_date_field(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_flexible_date(text)
            .map(Some)
            .ok_or_else(|| AppError::InvalidDate(text.to_string())),
    }
}

async fn add_order(
    State(state): State<AppState>,
    Json(body): Json<NewOrder>,
) -> Result<(StatusCode, Json<WorkOrder>), AppError> {
    let activity = body.activity.trim().to_string();
    if activity.is_empty() {
        return Err(AppError::MissingActivity);
    }
    let record = ParsedRecord {
        activity,
        amount: body.amount,
        category: normalize_category(body.category.as_deref().unwrap_or_default()),
        // The form leaves the owner blank rather than assuming a crew; blank
        // owners fold into the aggregation sentinel.
        owner: body.owner.as_deref().unwrap_or_default().trim().to_uppercase(),
        work_type: body
            .work_type
            .as_deref()
            .map(detect_work_type)
            .unwrap_or_else(|| WORK_TYPE_PREVENTIVO.to_string()),
        start_date: parse_date_field(body.start_date.as_deref())?,
        start_shift: Shift::parse_token(body.start_shift.as_deref().unwrap_or_default()),
        end_date: parse_date_field(body.end_date.as_deref())?,
        end_shift: Shift::parse_token(body.end_shift.as_deref().unwrap_or_default()),
    };
    let order = compose_order(record, state.store.ids().next());
    state.store.add(order.clone());
    Ok((StatusCode::CREATED, Json(order)))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, AppError> {
    if state.store.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::OrderNotFound(id))
    }
}

async fn clear_orders(State(state): State<AppState>) -> Json<Value> {
    let removed = state.store.clear();
    Json(json!({ "removed": removed }))
}

// --- Bulk Ingestion ---

#[derive(Debug, Deserialize)]
pub struct TextPayload {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GridPayload {
    /// Rectangular cell grid as decoded client-side; cells may arrive as
    /// numbers or blanks, not only strings.
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub accepted: usize,
    pub skipped: usize,
    pub total: usize,
}

fn finish_ingest(
    state: &AppState,
    outcome: IngestOutcome,
    mode: MergeMode,
) -> Result<Json<IngestResponse>, AppError> {
    if outcome.accepted.is_empty() {
        return Err(AppError::NothingImported {
            skipped: outcome.skipped,
        });
    }
    let accepted = outcome.accepted_count();
    let skipped = outcome.skipped;
    state.store.merge_batch(outcome.accepted, mode);
    Ok(Json(IngestResponse {
        accepted,
        skipped,
        total: state.store.count(),
    }))
}

async fn paste_orders(
    State(state): State<AppState>,
    Json(payload): Json<TextPayload>,
) -> Result<Json<IngestResponse>, AppError> {
    if payload.text.is_empty() {
        return Err(AppError::EmptyPayload);
    }
    let outcome = ingest_text(&payload.text, state.store.ids());
    finish_ingest(&state, outcome, MergeMode::Prepend)
}

async fn import_grid(
    State(state): State<AppState>,
    Json(payload): Json<GridPayload>,
) -> Result<Json<IngestResponse>, AppError> {
    if payload.rows.is_empty() {
        return Err(AppError::EmptyPayload);
    }
    let rows: Vec<Vec<String>> = payload
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    let outcome = ingest_grid(&rows, state.store.ids());
    finish_ingest(&state, outcome, MergeMode::Replace)
}

async fn import_csv(
    State(state): State<AppState>,
    Json(payload): Json<TextPayload>,
) -> Result<Json<IngestResponse>, AppError> {
    if payload.text.is_empty() {
        return Err(AppError::EmptyPayload);
    }
    let outcome = ingest_csv_text(&payload.text, state.store.ids())?;
    finish_ingest(&state, outcome, MergeMode::Replace)
}

// --- Metrics ---

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub summary: SpendSummary,
    pub ranked_api: Vec<WorkOrder>,
    pub ranked_opex: Vec<WorkOrder>,
}

fn normalize_filter(owner: &Option<String>) -> Option<String> {
    owner
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_uppercase)
}

async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Json<MetricsResponse> {
    let snapshot = state.store.snapshot();
    let filter = normalize_filter(&query.owner);
    Json(MetricsResponse {
        summary: aggregate(&snapshot, filter.as_deref()),
        ranked_api: ranked_by_category(&snapshot, CATEGORY_API),
        ranked_opex: ranked_by_category(&snapshot, CATEGORY_OPEX),
    })
}

// --- Schedule Board ---

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    #[serde(default)]
    pub pivot: Option<String>,
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub owner: Option<String>,
    /// Week navigation relative to the pivot: `next` or `prev`.
    #[serde(default)]
    pub nav: Option<String>,
    /// Jump to the first day of this month in the pivot's year.
    #[serde(default)]
    pub month: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub window: Vec<NaiveDate>,
    pub rows: Vec<WorkOrder>,
}

async fn schedule_board(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let mut pivot = match query.pivot.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(text) => {
            parse_flexible_date(text).ok_or_else(|| AppError::InvalidDate(text.to_string()))?
        }
        None => chrono::Local::now().date_naive(),
    };
    if let Some(month) = query.month {
        pivot = month_jump(pivot, month);
    }
    match query.nav.as_deref() {
        Some("next") => pivot = shift_pivot(pivot, 7),
        Some("prev") => pivot = shift_pivot(pivot, -7),
        _ => {}
    }
    let days = query
        .days
        .unwrap_or(state.config.window_days)
        .clamp(1, MAX_WINDOW_DAYS);
    let filter = normalize_filter(&query.owner);
    let rows = planning_view(&state.store.snapshot(), filter.as_deref());
    info!(
        "Schedule board: pivot {}, {} days, {} rows",
        pivot,
        days,
        rows.len()
    );
    Ok(Json(ScheduleResponse {
        window: date_window(pivot, days),
        rows,
    }))
}
