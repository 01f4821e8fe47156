// 🌐 HTTP API - Axum routes over the ledger
//
// Handlers only orchestrate: extract input, call one ledger operation, map the
// classified error onto a status code.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::entities::{Contribution, Member, MemberContribution, MemberPatch, NewContribution, NewMember};
use crate::error::LedgerError;
use crate::ledger::{Ledger, DEFAULT_LIMIT, DEFAULT_SKIP};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }
}

// ============================================================================
// Error mapping
// ============================================================================

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub detail: String,
}

pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            LedgerError::Duplicate(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            detail: self.0.message().to_string(),
        });
        (status, body).into_response()
    }
}

// Extractor rejections (bad JSON, bad query string, bad path id) use the same
// `{"detail": ...}` body and 422 status as ledger validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(LedgerError::Invalid(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(LedgerError::Invalid(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(LedgerError::Invalid(rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// POST /members
async fn create_member(
    State(state): State<AppState>,
    input: Result<Json<NewMember>, JsonRejection>,
) -> ApiResult<Member> {
    let Json(input) = input?;
    Ok(Json(state.ledger.create_member(input)?))
}

/// GET /members?skip=&limit=
async fn list_members(
    State(state): State<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<Vec<Member>> {
    let Query(page) = page?;
    Ok(Json(state.ledger.list_members(page.skip, page.limit)?))
}

/// GET /members/:id
async fn get_member(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Member> {
    let Path(id) = id?;
    Ok(Json(state.ledger.get_member(id)?))
}

/// PUT|PATCH /members/:id
async fn update_member(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    patch: Result<Json<MemberPatch>, JsonRejection>,
) -> ApiResult<Member> {
    let Path(id) = id?;
    let Json(patch) = patch?;
    Ok(Json(state.ledger.update_member(id, patch)?))
}

/// DELETE /members/:id
async fn delete_member(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let Path(id) = id?;
    state.ledger.delete_member(id)?;
    Ok(Json(DeleteResponse { ok: true }))
}

/// GET /members/:id/contributions
async fn member_contributions(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<MemberContribution>> {
    let Path(id) = id?;
    Ok(Json(state.ledger.member_contributions(id)?))
}

/// POST /contributions/
async fn add_contribution(
    State(state): State<AppState>,
    input: Result<Json<NewContribution>, JsonRejection>,
) -> ApiResult<Contribution> {
    let Json(input) = input?;
    Ok(Json(state.ledger.add_contribution(input)?))
}

/// GET /contributions/:id
async fn get_contribution(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Contribution> {
    let Path(id) = id?;
    Ok(Json(state.ledger.get_contribution(id)?))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/members", get(list_members).post(create_member))
        .route("/members/", get(list_members).post(create_member))
        .route(
            "/members/:id",
            get(get_member)
                .put(update_member)
                .patch(update_member)
                .delete(delete_member),
        )
        .route("/members/:id/contributions", get(member_contributions))
        .route("/contributions", post(add_contribution))
        .route("/contributions/", post(add_contribution))
        .route("/contributions/:id", get(get_contribution))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
