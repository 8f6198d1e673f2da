//! HTTP handlers for the front end.
//!
//! Implements:
//! - GET /, GET /health - Liveness
//! - POST /auth/login, GET /auth/status - Session
//! - GET /connections/info, GET /connections/resources - Connection browsing
//! - POST /knowledge-bases, POST /knowledge-bases/{kb_id}/sync,
//!   GET|DELETE /knowledge-bases/{kb_id}/resources - Knowledge bases

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use kb_bridge_core::{
    Bridge, ConnectionInfo, KnowledgeBase, ResourceEntry, DEFAULT_RESOURCE_PATH,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, Result};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<Bridge>,
}

/// Routes without middleware; `main` adds CORS and tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/status", get(auth_status_handler))
        .route("/connections/info", get(connection_info_handler))
        .route("/connections/resources", get(list_resources_handler))
        .route("/knowledge-bases", post(create_knowledge_base_handler))
        .route("/knowledge-bases/{kb_id}/sync", post(sync_knowledge_base_handler))
        .route(
            "/knowledge-bases/{kb_id}/resources",
            get(list_kb_resources_handler).delete(delete_kb_resource_handler),
        )
        .with_state(state)
}

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub authenticated: bool,
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
}

impl SuccessResponse {
    fn new(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

/// Listing wrapper; the web client expects `{"data": [...]}`.
#[derive(Serialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateKnowledgeBaseRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct ResourcesQuery {
    pub resource_id: Option<String>,
}

#[derive(Deserialize)]
pub struct KbResourcesQuery {
    pub resource_path: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteResourceQuery {
    pub resource_path: String,
}

/// GET / - Service banner.
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Knowledge base bridge API",
    })
}

/// GET /health - Health check endpoint.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        authenticated: state.bridge.session.is_authenticated().await,
    })
}

/// POST /auth/login - Establish the upstream session.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SuccessResponse>> {
    let email = body.email.filter(|e| !e.is_empty());
    let password = body.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::BadRequest("Email and password required"));
    };

    state
        .bridge
        .auth
        .login(&email, &password)
        .await?
        .ok_or(ApiError::LoginFailed)?;

    debug!("Upstream session established");
    Ok(SuccessResponse::new("Logged in successfully"))
}

/// GET /auth/status - Whether a session is active.
pub async fn auth_status_handler(State(state): State<AppState>) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        authenticated: state.bridge.session.is_authenticated().await,
    })
}

/// GET /connections/info - The configured connection.
pub async fn connection_info_handler(
    State(state): State<AppState>,
) -> Result<Json<ConnectionInfo>> {
    state
        .bridge
        .connections
        .connection_info()
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Connection not found"))
}

/// GET /connections/resources - Children of a connection node.
pub async fn list_resources_handler(
    State(state): State<AppState>,
    Query(query): Query<ResourcesQuery>,
) -> Result<Json<DataResponse<ResourceEntry>>> {
    state
        .bridge
        .connections
        .list_resources(query.resource_id.as_deref())
        .await?
        .map(|data| Json(DataResponse { data }))
        .ok_or(ApiError::Upstream("Failed to fetch resources"))
}

/// POST /knowledge-bases - Create a knowledge base over selected resources.
pub async fn create_knowledge_base_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateKnowledgeBaseRequest>,
) -> Result<Json<KnowledgeBase>> {
    let name = body.name.filter(|n| !n.is_empty());
    let Some(name) = name.filter(|_| !body.resource_ids.is_empty()) else {
        return Err(ApiError::BadRequest("Name and resource_ids required"));
    };

    state
        .bridge
        .knowledge_bases
        .create_knowledge_base(&name, &body.description, &body.resource_ids)
        .await?
        .map(Json)
        .ok_or(ApiError::Upstream("Failed to create knowledge base"))
}

/// POST /knowledge-bases/{kb_id}/sync - Trigger indexing.
pub async fn sync_knowledge_base_handler(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    if !state.bridge.knowledge_bases.sync_knowledge_base(&kb_id).await? {
        return Err(ApiError::Upstream("Failed to sync knowledge base"));
    }
    Ok(SuccessResponse::new("Sync initiated"))
}

/// GET /knowledge-bases/{kb_id}/resources - Indexed entries under a path.
pub async fn list_kb_resources_handler(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    Query(query): Query<KbResourcesQuery>,
) -> Result<Json<DataResponse<ResourceEntry>>> {
    let resource_path = query
        .resource_path
        .as_deref()
        .unwrap_or(DEFAULT_RESOURCE_PATH);

    state
        .bridge
        .knowledge_bases
        .list_knowledge_base_resources(&kb_id, resource_path)
        .await?
        .map(|data| Json(DataResponse { data }))
        .ok_or(ApiError::Upstream("Failed to fetch resources"))
}

/// DELETE /knowledge-bases/{kb_id}/resources - De-index one entry.
pub async fn delete_kb_resource_handler(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    Query(query): Query<DeleteResourceQuery>,
) -> Result<Json<SuccessResponse>> {
    let deleted = state
        .bridge
        .knowledge_bases
        .delete_resource_from_kb(&kb_id, &query.resource_path)
        .await?;

    if !deleted {
        return Err(ApiError::Upstream("Failed to delete resource"));
    }
    Ok(SuccessResponse::new("Resource deleted"))
}
