use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::{self, AppConfig};
use crate::logger::Logger;
use crate::models::{
  ChatTurnRequest, ChatTurnResponse, ExplainNotesRequest, HistoryResponse, ModelsResponse,
  SolveImageRequest, StoreKeyRequest,
};
use crate::orchestrator::{PanelError, Tutor};
use crate::storage::SessionStore;
use crate::validate;

pub struct RouterState {
  pub started_at: Instant,
  pub config: AppConfig,
  pub tutor: Tutor,
  pub sessions: SessionStore,
  pub logger: Arc<Logger>,
}

type AppState = State<Arc<RouterState>>;

pub fn app(state: RouterState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/v1/models", get(models))
    .route("/v1/chat", post(chat))
    .route("/v1/chat/:session_id", get(history).delete(clear_history))
    .route("/v1/solve", post(solve))
    .route("/v1/explain", post(explain))
    .route("/v1/key", get(key_status).put(store_key))
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .with_state(Arc::new(state))
}

pub async fn run_router(listener: std::net::TcpListener, state: RouterState) -> anyhow::Result<()> {
  listener.set_nonblocking(true)?;
  let listener = tokio::net::TcpListener::from_std(listener)?;
  axum::serve(listener, app(state)).await?;
  Ok(())
}

async fn health(State(state): AppState) -> Json<serde_json::Value> {
  let uptime = state.started_at.elapsed().as_millis();
  Json(serde_json::json!({
    "status": "ok",
    "version": env!("CARGO_PKG_VERSION"),
    "uptime_ms": uptime
  }))
}

async fn models(State(state): AppState) -> Json<ModelsResponse> {
  Json(ModelsResponse {
    default_model: state.config.default_model.clone(),
    fallback_models: state.config.fallback_models.clone(),
  })
}

async fn chat(State(state): AppState, Json(req): Json<ChatTurnRequest>) -> Response {
  if let Err(msg) = validate::text_input(&req.message, "question or topic") {
    return error_response(StatusCode::BAD_REQUEST, "invalid_input", &msg);
  }

  let (session_id, handle) = state.sessions.open(req.session_id.as_deref()).await;
  if req.session_id.as_deref() != Some(session_id.as_str()) {
    let active = state.sessions.len().await;
    state.logger.info(&format!("opened session {session_id} ({active} active)"));
  }
  // Stored history is replaced only once the turn completes, so a dropped
  // request leaves it untouched.
  let mut guard = handle.lock().await;
  let history = state
    .tutor
    .handle_turn(guard.clone(), req.message.trim(), req.ui_options())
    .await;
  *guard = history;

  let reply = guard.last().cloned();
  let messages = guard.messages().to_vec();
  (
    StatusCode::OK,
    Json(ChatTurnResponse {
      session_id,
      reply,
      messages,
    }),
  )
    .into_response()
}

async fn history(State(state): AppState, Path(session_id): Path<String>) -> Response {
  match state.sessions.get(&session_id).await {
    Some(handle) => {
      let messages = handle.lock().await.messages().to_vec();
      (StatusCode::OK, Json(HistoryResponse { session_id, messages })).into_response()
    }
    None => error_response(StatusCode::NOT_FOUND, "session_missing", "Unknown session."),
  }
}

async fn clear_history(State(state): AppState, Path(session_id): Path<String>) -> Response {
  if !state.sessions.clear(&session_id).await {
    return error_response(StatusCode::NOT_FOUND, "session_missing", "Unknown session.");
  }
  state.logger.info(&format!("cleared session {session_id}"));
  (
    StatusCode::OK,
    Json(HistoryResponse {
      session_id,
      messages: Vec::new(),
    }),
  )
    .into_response()
}

async fn solve(State(state): AppState, Json(req): Json<SolveImageRequest>) -> Response {
  match state.tutor.solve_image(&req.image, req.is_question).await {
    Ok(res) => (StatusCode::OK, Json(res)).into_response(),
    Err(err) => panel_error(&err),
  }
}

async fn explain(State(state): AppState, Json(req): Json<ExplainNotesRequest>) -> Response {
  match state.tutor.explain_notes(&req).await {
    Ok(res) => (StatusCode::OK, Json(res)).into_response(),
    Err(err) => panel_error(&err),
  }
}

async fn key_status() -> Json<serde_json::Value> {
  Json(serde_json::json!({ "present": config::has_api_key() }))
}

async fn store_key(State(state): AppState, Json(req): Json<StoreKeyRequest>) -> Response {
  if !config::key_format_ok(&req.key) {
    return error_response(
      StatusCode::BAD_REQUEST,
      "key_invalid",
      "OpenRouter keys start with 'sk-or-v1-' or 'sk-'.",
    );
  }
  match config::store_api_key(&req.key) {
    Ok(()) => {
      state.logger.info("stored OpenRouter key in keyring");
      StatusCode::NO_CONTENT.into_response()
    }
    Err(err) => {
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "keyring_failed", &err.to_string())
    }
  }
}

fn panel_error(err: &PanelError) -> Response {
  let (status, code) = match err {
    PanelError::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
    PanelError::NoText => (StatusCode::UNPROCESSABLE_ENTITY, "no_text_found"),
    PanelError::Ocr(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ocr_failed"),
    PanelError::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_error"),
  };
  error_response(status, code, &err.to_string())
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
  let body = Json(serde_json::json!({ "error": message, "code": code }));
  (status, body).into_response()
}
