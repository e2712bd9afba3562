pub mod domain;
pub mod ports;
pub mod prompt;
pub mod screening;

pub use domain::{
    AuthSession, ChatMessage, ChatSession, Mood, MoodEntry, Role, Turn, TurnOutcome, User,
    UserCredentials,
};
pub use ports::{CompletionService, GatewayError, PortError, PortResult, SessionStore};
pub use prompt::{compose_system_prompt, SUPPORT_SYSTEM_PROMPT};
pub use screening::{CrisisLexicon, CRISIS_SUPPORT_MESSAGE};
