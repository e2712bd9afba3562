//! crates/solace_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthSession, ChatMessage, ChatSession, Mood, MoodEntry, Role, Turn, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for store and identity port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Failure classes of the hosted completion gateway. The web layer maps
/// each kind to an HTTP status and a user-safe message; raw upstream
/// detail stays in the `Upstream` payload and is only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The gateway is rate limiting us (HTTP 429). Safe to retry shortly.
    #[error("completion gateway is rate limited")]
    Throttled,
    /// The gateway reports a quota or payment problem (HTTP 402).
    #[error("completion gateway is unavailable")]
    Unavailable,
    /// Any other failure: transport error, timeout, unexpected status,
    /// or a response body without a usable completion.
    #[error("completion gateway failure: {0}")]
    Upstream(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable storage for accounts, issued bearer tokens, and conversation
/// history. The turn pipeline itself only consumes `validate_auth_session`
/// (through the auth middleware); everything else backs the surrounding
/// session/message endpoints.
#[async_trait]
pub trait SessionStore: Send + Sync {
    // --- Accounts ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Issued bearer tokens ---
    /// Persists a freshly issued token and returns the stored session.
    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession>;

    /// Resolves a bearer token to its subject, refusing expired or unknown
    /// tokens with `PortError::Unauthorized`.
    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    // --- Chat sessions ---
    async fn create_chat_session(
        &self,
        user_id: Uuid,
        title: &str,
        mood: Option<Mood>,
    ) -> PortResult<ChatSession>;

    async fn get_chat_session(&self, session_id: Uuid) -> PortResult<ChatSession>;

    async fn list_chat_sessions(&self, user_id: Uuid) -> PortResult<Vec<ChatSession>>;

    // --- Messages ---
    async fn append_message(
        &self,
        session_id: Uuid,
        role: Role,
        content: &str,
        is_crisis: bool,
    ) -> PortResult<ChatMessage>;

    async fn list_messages(&self, session_id: Uuid) -> PortResult<Vec<ChatMessage>>;

    // --- Mood check-ins ---
    async fn record_mood(
        &self,
        user_id: Uuid,
        mood: Mood,
        intensity: i16,
    ) -> PortResult<MoodEntry>;

    /// Entries for one user newer than `since`, newest first, at most `limit`.
    async fn recent_moods(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> PortResult<Vec<MoodEntry>>;
}

/// The hosted chat-completion gateway. One non-streaming request per call;
/// no retries at this boundary, retry policy belongs to the caller.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Submits the system prompt followed by the caller's turns and returns
    /// the first completion choice's text.
    async fn complete(
        &self,
        system_prompt: &str,
        turns: &[Turn],
    ) -> Result<String, GatewayError>;
}
