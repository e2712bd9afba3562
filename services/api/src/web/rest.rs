//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the session and message endpoints and the
//! master definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use solace_core::domain::{ChatMessage, ChatSession, Mood, MoodEntry, Role};
use solace_core::ports::PortError;
use std::sync::Arc;
use tracing::error;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

/// The window and cap behind GET /moods, matching the history view's query.
const MOOD_HISTORY_DAYS: i64 = 30;
const MOOD_HISTORY_LIMIT: i64 = 50;

/// The intensity recorded when a check-in does not state one.
const DEFAULT_MOOD_INTENSITY: i16 = 5;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::turn::turn_handler,
        create_session_handler,
        list_sessions_handler,
        append_message_handler,
        list_messages_handler,
        record_mood_handler,
        list_moods_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            crate::web::turn::TurnSchema,
            crate::web::turn::TurnRequest,
            crate::web::turn::TurnResponse,
            CreateSessionRequest,
            SessionResponse,
            AppendMessageRequest,
            MessageResponse,
            RecordMoodRequest,
            MoodEntryResponse,
            ErrorResponse
        )
    ),
    modifiers(&BearerTokenSecurity),
    tags(
        (name = "Solace API", description = "API endpoints for the mood-aware support companion.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token security scheme referenced by the protected paths.
struct BearerTokenSecurity;

impl Modify for BearerTokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The error body shared by every non-2xx response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Defaults to a mood-derived check-in title when omitted.
    pub title: Option<String>,
    #[schema(value_type = Option<String>, example = "anxious")]
    pub mood: Option<Mood>,
}

/// One stored conversation.
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub title: String,
    #[schema(value_type = Option<String>)]
    pub mood: Option<Mood>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionResponse {
    fn from_domain(session: ChatSession) -> Self {
        Self {
            id: session.id,
            title: session.title,
            mood: session.mood,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AppendMessageRequest {
    /// "user" or "assistant".
    #[schema(value_type = String, example = "user")]
    pub role: Role,
    pub content: String,
    /// Set by the client when storing a crisis-escalation reply.
    #[serde(default, rename = "isCrisis")]
    pub is_crisis: bool,
}

/// One stored message.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    #[schema(value_type = String)]
    pub role: Role,
    pub content: String,
    #[serde(rename = "isCrisis")]
    pub is_crisis: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageResponse {
    fn from_domain(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            session_id: message.session_id,
            role: message.role,
            content: message.content,
            is_crisis: message.is_crisis,
            created_at: message.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RecordMoodRequest {
    #[schema(value_type = String, example = "anxious")]
    pub mood: Mood,
    /// 1 to 10; omitted means 5, the check-in flow's default.
    pub intensity: Option<i16>,
}

/// One recorded mood check-in.
#[derive(Serialize, ToSchema)]
pub struct MoodEntryResponse {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub mood: Mood,
    pub intensity: i16,
    pub created_at: DateTime<Utc>,
}

impl MoodEntryResponse {
    fn from_domain(entry: MoodEntry) -> Self {
        Self {
            id: entry.id,
            mood: entry.mood,
            intensity: entry.intensity,
            created_at: entry.created_at,
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// POST /sessions - Start a new conversation
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created successfully", body = SessionResponse),
        (status = 401, description = "Missing or invalid bearer credential", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let title = req.title.unwrap_or_else(|| default_title(req.mood));

    let session = state
        .store
        .create_chat_session(user_id, &title, req.mood)
        .await
        .map_err(|e| {
            error!("Failed to create chat session: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::from_domain(session)),
    ))
}

/// GET /sessions - List the caller's conversations, most recent first
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "The caller's sessions", body = [SessionResponse]),
        (status = 401, description = "Missing or invalid bearer credential", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let sessions = state.store.list_chat_sessions(user_id).await.map_err(|e| {
        error!("Failed to list chat sessions: {:?}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list sessions")
    })?;

    let body: Vec<SessionResponse> = sessions
        .into_iter()
        .map(SessionResponse::from_domain)
        .collect();
    Ok(Json(body))
}

/// POST /sessions/{id}/messages - Append one message to a conversation
#[utoipa::path(
    post,
    path = "/sessions/{id}/messages",
    request_body = AppendMessageRequest,
    params(
        ("id" = Uuid, Path, description = "The session to append to")
    ),
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer credential", body = ErrorResponse),
        (status = 404, description = "No such session for this caller", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn append_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AppendMessageRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    require_session_owner(&state, session_id, user_id).await?;

    let message = state
        .store
        .append_message(session_id, req.role, &req.content, req.is_crisis)
        .await
        .map_err(|e| {
            error!("Failed to append message: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store message")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::from_domain(message)),
    ))
}

/// GET /sessions/{id}/messages - List a conversation's messages in order
#[utoipa::path(
    get,
    path = "/sessions/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "The session to read")
    ),
    responses(
        (status = 200, description = "The session's messages, chronological", body = [MessageResponse]),
        (status = 401, description = "Missing or invalid bearer credential", body = ErrorResponse),
        (status = 404, description = "No such session for this caller", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    require_session_owner(&state, session_id, user_id).await?;

    let messages = state.store.list_messages(session_id).await.map_err(|e| {
        error!("Failed to list messages: {:?}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list messages")
    })?;

    let body: Vec<MessageResponse> = messages
        .into_iter()
        .map(MessageResponse::from_domain)
        .collect();
    Ok(Json(body))
}

/// POST /moods - Record a mood check-in
#[utoipa::path(
    post,
    path = "/moods",
    request_body = RecordMoodRequest,
    responses(
        (status = 201, description = "Check-in recorded", body = MoodEntryResponse),
        (status = 400, description = "Intensity out of range", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer credential", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn record_mood_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<RecordMoodRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let intensity = req.intensity.unwrap_or(DEFAULT_MOOD_INTENSITY);
    if !(1..=10).contains(&intensity) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Intensity must be between 1 and 10",
        ));
    }

    let entry = state
        .store
        .record_mood(user_id, req.mood, intensity)
        .await
        .map_err(|e| {
            error!("Failed to record mood: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record mood")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MoodEntryResponse::from_domain(entry)),
    ))
}

/// GET /moods - The caller's check-ins from the last 30 days, newest first
#[utoipa::path(
    get,
    path = "/moods",
    responses(
        (status = 200, description = "Recent check-ins, newest first", body = [MoodEntryResponse]),
        (status = 401, description = "Missing or invalid bearer credential", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_moods_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let since = Utc::now() - Duration::days(MOOD_HISTORY_DAYS);
    let entries = state
        .store
        .recent_moods(user_id, since, MOOD_HISTORY_LIMIT)
        .await
        .map_err(|e| {
            error!("Failed to list mood entries: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list moods")
        })?;

    let body: Vec<MoodEntryResponse> = entries
        .into_iter()
        .map(MoodEntryResponse::from_domain)
        .collect();
    Ok(Json(body))
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Confirms the session exists and belongs to the caller. Another user's
/// session is reported as not found rather than forbidden, so session ids
/// leak nothing.
async fn require_session_owner(
    state: &AppState,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let session = state.store.get_chat_session(session_id).await.map_err(|e| match e {
        PortError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Session not found"),
        other => {
            error!("Failed to load chat session: {:?}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load session")
        }
    })?;

    if session.user_id != user_id {
        return Err(error_response(StatusCode::NOT_FOUND, "Session not found"));
    }
    Ok(())
}

/// The title a new session gets when the caller does not supply one,
/// e.g. "Anxious Check-in".
fn default_title(mood: Option<Mood>) -> String {
    match mood {
        Some(mood) => {
            let label = mood.as_str();
            let mut chars = label.chars();
            match chars.next() {
                Some(first) => format!("{}{} Check-in", first.to_uppercase(), chars.as_str()),
                None => "Check-in".to_string(),
            }
        }
        None => "Check-in".to_string(),
    }
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}
