//! HTTP surface of the route-planning agent.

pub mod config;

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, info_span};
use uuid::Uuid;

use orchestrator_core::ports::{InterpreterPort, MapPort};
use orchestrator_core::OrchestratorCore;
use protocol::{CityConfirmation, ClearSessionResponse, RouteRequest, RouteResponse, SessionSnapshot};

pub const BANNER: &str = "路径规划智能体 API 服务运行中";
const CONFIRM_CITY_DEPRECATED: &str = "此接口已废弃，请直接在主聊天界面回复城市信息";

pub struct AppState<I: InterpreterPort, M: MapPort> {
    pub core: Arc<OrchestratorCore<I, M>>,
}

impl<I: InterpreterPort, M: MapPort> Clone for AppState<I, M> {
    fn clone(&self) -> Self {
        Self { core: self.core.clone() }
    }
}

impl<I: InterpreterPort, M: MapPort> AppState<I, M> {
    pub fn new(core: OrchestratorCore<I, M>) -> Self {
        Self { core: Arc::new(core) }
    }
}

pub fn app<I, M>(state: AppState<I, M>) -> Router
where
    I: InterpreterPort + 'static,
    M: MapPort + 'static,
{
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check::<I, M>))
        .route("/route", post(route::<I, M>))
        .route("/route/confirm-city", post(confirm_city))
        .route("/session/:id", get(session_snapshot::<I, M>).delete(clear_session::<I, M>))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                info_span!(
                    "http",
                    request_id = %Uuid::new_v4(),
                    method = %req.method(),
                    uri = %req.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

/// Unexpected orchestrator failure, reported as `500 {"detail": ...}`.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

async fn banner() -> impl IntoResponse {
    Json(json!({ "message": BANNER }))
}

async fn health_check<I: InterpreterPort + 'static, M: MapPort + 'static>(
    Extension(state): Extension<AppState<I, M>>,
) -> impl IntoResponse {
    Json(json!({ "ok": true, "sessions": state.core.sessions().len().await }))
}

async fn route<I: InterpreterPort + 'static, M: MapPort + 'static>(
    Extension(state): Extension<AppState<I, M>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    info!(session_id = %request.session_key(), input = %request.user_input, "route request");
    match state.core.handle(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(error = %e, "route request failed");
            Err(e.into())
        }
    }
}

async fn confirm_city(Json(request): Json<CityConfirmation>) -> impl IntoResponse {
    info!(session_id = %request.session_id, "deprecated confirm-city call");
    Json(RouteResponse::failure(CONFIRM_CITY_DEPRECATED, &request.session_id))
}

async fn session_snapshot<I: InterpreterPort + 'static, M: MapPort + 'static>(
    Path(id): Path<String>,
    Extension(state): Extension<AppState<I, M>>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    state.core.snapshot(&id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn clear_session<I: InterpreterPort + 'static, M: MapPort + 'static>(
    Path(id): Path<String>,
    Extension(state): Extension<AppState<I, M>>,
) -> impl IntoResponse {
    let existed = state.core.clear_session(&id).await;
    let message = if existed {
        format!("会话 {} 已清除", id)
    } else {
        format!("会话 {} 不存在", id)
    };
    Json(ClearSessionResponse { message, existed })
}
