//! Axum server and routes.

use crate::attachments::{DiskAttachmentStore, URL_PREFIX};
use crate::auth::{
    authenticate, require_token, AuthContext, IssuedToken, Permission, TokenAuthority, UserAccount,
};
use crate::config::ApiConfig;
use crate::error::ApiError;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use report_query::{project, ReportView};
use report_types::{
    AppendEntryRequest, Attachment, BaseResponse, CreateReportRequest, Entry, Report, ReportPatch,
    ReportQuery, ReportStore,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Multipart framing overhead allowed on top of the file size limit.
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

pub struct AppState {
    pub store: Arc<dyn ReportStore + Send + Sync>,
    pub tokens: TokenAuthority,
    pub users: Vec<UserAccount>,
    pub attachments: DiskAttachmentStore,
}

impl AppState {
    pub fn from_config(store: Arc<dyn ReportStore + Send + Sync>, config: &ApiConfig) -> Self {
        Self {
            store,
            tokens: TokenAuthority::new(config.token_secret.clone(), config.token_ttl_secs),
            users: config.users.clone(),
            attachments: DiskAttachmentStore::new(&config.upload_dir, config.max_upload_bytes),
        }
    }
}

type ApiResult<T> = Result<(StatusCode, Json<BaseResponse<T>>), ApiError>;

fn respond<T>(status: StatusCode, message: &str, data: T) -> ApiResult<T> {
    Ok((
        status,
        Json(BaseResponse::ok(status.as_u16() as i32, message, data)),
    ))
}

pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.attachments.max_bytes() + MULTIPART_SLACK_BYTES;
    let protected = Router::new()
        .route("/reports", post(handle_create))
        .route(
            "/reports/:id",
            get(handle_get).put(handle_update).patch(handle_update),
        )
        .route("/reports/:id/entries", post(handle_append_entry))
        .route(
            "/reports/:id/attachments",
            post(handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .nest_service(URL_PREFIX, ServeDir::new(state.attachments.dir()))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_token,
        ));

    Router::new()
        .route("/health", get(handle_health))
        .route("/auth/token", post(handle_issue_token))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

async fn handle_issue_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<IssuedToken> {
    let Json(req) = payload?;
    let user = authenticate(&state.users, &req.username, &req.password).map_err(|e| {
        tracing::warn!(username = %req.username, "token request rejected");
        ApiError::from(e)
    })?;
    let issued = state
        .tokens
        .issue(&user.username, user.role)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(username = %user.username, role = user.role.as_str(), "token issued");
    respond(StatusCode::OK, "Token issued", issued)
}

async fn handle_create(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateReportRequest>, JsonRejection>,
) -> ApiResult<Report> {
    auth.require(Permission::Write)?;
    let Json(req) = payload?;
    req.validate()?;
    let report = state
        .store
        .create(req.title, req.status, req.priority)
        .await?;
    respond(StatusCode::CREATED, "Report created", report)
}

async fn handle_get(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<ReportView> {
    auth.require(Permission::Read)?;
    let Query(pairs) = query?;
    let q = ReportQuery::from_pairs(pairs);
    let report = state.store.get(&id).await?;
    respond(StatusCode::OK, "Success", project(&report, &q))
}

async fn handle_update(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<ReportPatch>, JsonRejection>,
) -> ApiResult<Report> {
    auth.require(Permission::Write)?;
    let Json(patch) = payload?;
    patch.validate()?;
    let report = state.store.update(&id, &patch).await?;
    respond(StatusCode::OK, "Report updated", report)
}

async fn handle_append_entry(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<AppendEntryRequest>, JsonRejection>,
) -> ApiResult<Entry> {
    auth.require(Permission::Write)?;
    let Json(req) = payload?;
    req.validate()?;
    let entry = state.store.append_entry(&id, req.content, req.priority).await?;
    respond(StatusCode::CREATED, "Entry added", entry)
}

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Attachment> {
    auth.require(Permission::Write)?;
    let multipart = multipart?;
    // Reject unknown reports before anything is written to disk.
    state.store.get(&id).await?;
    let attachment = state.attachments.ingest(multipart).await?;
    let attachment = state.store.append_attachment(&id, attachment).await?;
    respond(StatusCode::CREATED, "Attachment uploaded", attachment)
}

async fn handle_health() -> &'static str {
    "ok"
}
