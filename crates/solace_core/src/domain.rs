//! crates/solace_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! The conversation vocabulary (Role, Turn, Mood) carries serde derives
//! because it is also the wire vocabulary of the turn endpoint; the
//! stored entities stay serialization-free and are mapped to response
//! payloads at the web layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::GatewayError;

/// The author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// One message in a conversation. Immutable once created; owned by the
/// caller and referenced, never mutated, by the turn pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The emotional-state tag a caller can attach to a session and pass
/// through to the pipeline. Advisory context only; membership in this set
/// is the only validation applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Anxious,
    Angry,
    Lonely,
    Overwhelmed,
    Neutral,
    Custom,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
            Mood::Angry => "angry",
            Mood::Lonely => "lonely",
            Mood::Overwhelmed => "overwhelmed",
            Mood::Neutral => "neutral",
            Mood::Custom => "custom",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "anxious" => Ok(Mood::Anxious),
            "angry" => Ok(Mood::Angry),
            "lonely" => Ok(Mood::Lonely),
            "overwhelmed" => Ok(Mood::Overwhelmed),
            "neutral" => Ok(Mood::Neutral),
            "custom" => Ok(Mood::Custom),
            other => Err(format!("unknown mood '{other}'")),
        }
    }
}

/// The result of running one conversation turn through the support
/// pipeline. Exactly one variant is produced per request; the web layer
/// matches on it exhaustively to shape the HTTP response.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Crisis language was detected; the gateway was skipped and the
    /// fixed crisis-resources reply is returned.
    Escalated(String),
    /// The completion gateway produced a reply.
    Completed(String),
    /// The completion gateway failed; the kind decides status and user text.
    Failed(GatewayError),
}

// Represents a user - used throughout the app.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents an issued login session (the opaque bearer token).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A persisted conversation with an optional mood attached at creation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub mood: Option<Mood>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single stored message within a chat session. Assistant messages that
/// carried the crisis-resources reply keep that fact alongside the text.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: Role,
    pub content: String,
    pub is_crisis: bool,
    pub created_at: DateTime<Utc>,
}

/// One mood check-in. Clients record one when a conversation starts and
/// read a recent window of them for the history view.
#[derive(Debug, Clone)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: Mood,
    /// Self-reported strength of the mood, 1 to 10.
    pub intensity: i16,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_wire_form() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        let parsed: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(parsed, Role::Assistant);
    }

    #[test]
    fn mood_wire_form_covers_the_whole_set() {
        let all = [
            Mood::Happy,
            Mood::Sad,
            Mood::Anxious,
            Mood::Angry,
            Mood::Lonely,
            Mood::Overwhelmed,
            Mood::Neutral,
            Mood::Custom,
        ];
        for mood in all {
            let json = serde_json::to_string(&mood).unwrap();
            assert_eq!(json, format!("\"{}\"", mood.as_str()));
            let back: Mood = serde_json::from_str(&json).unwrap();
            assert_eq!(back, mood);
            assert_eq!(mood.as_str().parse::<Mood>().unwrap(), mood);
        }
    }

    #[test]
    fn unknown_mood_is_rejected() {
        let result: Result<Mood, _> = serde_json::from_str("\"ecstatic\"");
        assert!(result.is_err());
        assert!("ecstatic".parse::<Mood>().is_err());
    }

    #[test]
    fn turn_deserializes_from_the_wire_shape() {
        let turn: Turn =
            serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(turn, Turn::user("hi"));
    }
}
