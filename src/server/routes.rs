//! HTTP route handlers for the assistant API.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationSummary, Turn};
use crate::ids::{SessionId, TurnId};
use crate::service::{DeleteResponse, FeedbackResponse, MessageResponse, StartResponse};

use super::error::ApiError;
use super::state::AppState;

/// Language assumed when `start` receives none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Create the API router with all routes.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/start", post(start_conversation))
        .route("/message", post(send_message))
        .route("/history/{session_id}", get(get_history))
        .route("/delete/{session_id}", delete(delete_conversation))
        .route("/feedback", post(send_feedback))
        .route("/conversations", get(list_conversations))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "wikikisan-assistant",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Query parameters for `POST /start`.
#[derive(Debug, Deserialize)]
pub struct StartParams {
    /// Language tag; accepted as-is.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Body of `POST /message`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    /// Session returned by `start`.
    pub session_id: String,
    /// User message.
    pub message: String,
    /// Language tag; accepted but unused.
    pub language: String,
}

/// Body of `POST /feedback`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    /// Session the rated answer belongs to.
    pub session_id: String,
    /// `messageId` returned with the answer.
    pub message_id: String,
    /// Rating from 1 to 5.
    pub rating: u8,
}

/// Response of `GET /conversations`.
#[derive(Debug, Serialize)]
pub struct ConversationList {
    /// Live conversations, most recent first.
    pub conversations: Vec<ConversationSummary>,
}

fn parse_session(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse().map_err(|_| ApiError::session_not_found(raw))
}

fn parse_turn(raw: &str) -> Result<TurnId, ApiError> {
    raw.parse().map_err(|_| ApiError::turn_not_found(raw))
}

/// Start a conversation.
async fn start_conversation(
    State(state): State<Arc<AppState>>,
    params: Result<Query<StartParams>, QueryRejection>,
) -> Result<Json<StartResponse>, ApiError> {
    let Query(params) = params?;
    let started = state.service.start(&params.language).await?;
    Ok(Json(started))
}

/// Answer a message within a session.
async fn send_message(
    State(state): State<Arc<AppState>>,
    request: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = request?;
    let session_id = parse_session(&request.session_id)?;
    tracing::debug!(%session_id, language = %request.language, "message received");

    let reply = state.service.message(session_id, &request.message).await?;
    Ok(Json(reply))
}

/// Return the turns of a session.
async fn get_history(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    let Path(raw) = path?;
    let session_id = parse_session(&raw)?;
    let turns = state.service.history(session_id).await?;
    Ok(Json(turns))
}

/// Delete a session.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Path(raw) = path?;
    let session_id = parse_session(&raw)?;
    let deleted = state.service.delete(session_id).await?;
    Ok(Json(deleted))
}

/// Rate an answer.
async fn send_feedback(
    State(state): State<Arc<AppState>>,
    request: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let Json(request) = request?;
    let session_id = parse_session(&request.session_id)?;
    let message_id = parse_turn(&request.message_id)?;

    let recorded = state
        .service
        .feedback(session_id, message_id, request.rating)
        .await?;
    Ok(Json(recorded))
}

/// List live conversations.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConversationList>, ApiError> {
    let conversations = state.service.conversations().await?;
    Ok(Json(ConversationList { conversations }))
}
