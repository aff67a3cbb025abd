//! Axum server and routes.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use record_types::{
    Actor, ApproveRequest, BaseResponse, CreateRecordRequest, DeleteResponse, DeletedRecord,
    RecordChanges, RecordFilter, RecordListResponse, RecordResponse, RecordWorkflow,
    WorkflowError,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Header carrying the authenticated user id, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the user's role; absent means the default role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

pub struct AppState {
    pub workflow: Arc<dyn RecordWorkflow + Send + Sync>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/records", post(handle_create).get(handle_list))
        .route(
            "/api/records/:id",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .route("/api/records/:id/approve", post(handle_approve))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error response: maps workflow errors to HTTP status and the response envelope.
#[derive(Debug)]
pub enum ApiError {
    Workflow(WorkflowError),
    Unauthorized(String),
    /// Request body could not be read or deserialized.
    BadRequest(String),
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        ApiError::Workflow(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Workflow(WorkflowError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Workflow(WorkflowError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::Workflow(WorkflowError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Workflow(e @ WorkflowError::Persistence(_)) => {
                tracing::error!(error = %e, "record store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        let body = BaseResponse::<()> {
            code: i32::from(status.as_u16()),
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Authenticated caller taken from request headers.
pub struct RequestActor(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        let id = header(USER_ID_HEADER).ok_or_else(|| {
            ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER))
        })?;
        let role = header(USER_ROLE_HEADER).unwrap_or_default();
        Ok(RequestActor(Actor { id, role }))
    }
}

/// JSON body whose rejections use the error envelope.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordListQuery {
    #[serde(default)]
    pub regulation: Option<String>,
    /// Comma-separated; every tag must be present.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl From<RecordListQuery> for RecordFilter {
    fn from(q: RecordListQuery) -> Self {
        let tags = q.tags.and_then(|raw| {
            let tags: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            (!tags.is_empty()).then_some(tags)
        });
        RecordFilter {
            regulation: q.regulation.filter(|r| !r.is_empty()),
            tags,
            search: q.search.filter(|s| !s.is_empty()),
        }
    }
}

async fn handle_create(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    ApiJson(req): ApiJson<CreateRecordRequest>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let record = state.workflow.create_record(&req, &actor).await?;
    let mut res = RecordResponse::ok("Record created", record);
    res.code = 201;
    Ok((StatusCode::CREATED, Json(res)))
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    _actor: RequestActor,
    Query(q): Query<RecordListQuery>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let records = state.workflow.list_records(&q.into()).await?;
    Ok(Json(RecordListResponse::ok("Success", records)))
}

async fn handle_get(
    State(state): State<Arc<AppState>>,
    _actor: RequestActor,
    Path(id): Path<String>,
) -> Result<Json<RecordResponse>, ApiError> {
    let record = state.workflow.get_record(&id).await?;
    Ok(Json(RecordResponse::ok("Success", record)))
}

async fn handle_update(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<RecordChanges>,
) -> Result<Json<RecordResponse>, ApiError> {
    let record = state.workflow.submit_edit(&id, &actor, &changes).await?;
    Ok(Json(RecordResponse::ok("Record updated", record)))
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    _actor: RequestActor,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.workflow.delete_record(&id).await?;
    Ok(Json(DeleteResponse::ok(
        "Record deleted",
        DeletedRecord { id, deleted: true },
    )))
}

async fn handle_approve(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ApproveRequest>,
) -> Result<Json<RecordResponse>, ApiError> {
    let record = state
        .workflow
        .submit_approval(&id, &actor, &req.status)
        .await?;
    Ok(Json(RecordResponse::ok("Approval recorded", record)))
}

async fn handle_health() -> &'static str {
    "ok"
}
