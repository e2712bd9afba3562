//! services/api/src/web/turn.rs
//!
//! The conversational support pipeline behind POST /turn: screen the newest
//! user turn for crisis language, then either short-circuit with the fixed
//! crisis-resources reply or compose the mood-aware system prompt and ask
//! the completion gateway for a reply. All failure-to-response mapping for
//! the endpoint lives here.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use utoipa::ToSchema;

use solace_core::domain::{Mood, Role, Turn, TurnOutcome};
use solace_core::ports::{CompletionService, GatewayError};
use solace_core::prompt::compose_system_prompt;
use solace_core::screening::{CrisisLexicon, CRISIS_SUPPORT_MESSAGE};

use crate::web::rest::ErrorResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Wire shape of one conversation turn (documentation schema).
#[derive(ToSchema)]
#[schema(as = Turn)]
pub struct TurnSchema {
    /// "user" or "assistant".
    #[schema(example = "user")]
    pub role: String,
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TurnRequest {
    /// The conversation in chronological order, the newest user turn last.
    #[schema(value_type = Vec<TurnSchema>)]
    pub turns: Vec<Turn>,
    /// Optional emotional-state tag attached to the session.
    #[schema(value_type = Option<String>, example = "anxious")]
    pub mood: Option<Mood>,
}

#[derive(Serialize, ToSchema)]
pub struct TurnResponse {
    /// The assistant's reply text.
    pub response: String,
    /// True when the reply is the fixed crisis-resources message.
    #[serde(rename = "isCrisis")]
    pub is_crisis: bool,
}

//=========================================================================================
// The Pipeline
//=========================================================================================

/// Runs one conversation turn through screening and, when screening passes,
/// the completion gateway. Takes the ports directly so tests can drive it
/// with stubs.
///
/// Only the newest turn with role `user` is screened; with no user turn at
/// all, screening is a no-op and the conversation goes straight to the
/// gateway.
pub async fn run_turn(
    lexicon: &CrisisLexicon,
    completion: &dyn CompletionService,
    turns: &[Turn],
    mood: Option<Mood>,
) -> TurnOutcome {
    let newest_user_turn = turns.iter().rev().find(|t| t.role == Role::User);
    if let Some(turn) = newest_user_turn {
        if lexicon.detect(&turn.content) {
            return TurnOutcome::Escalated(CRISIS_SUPPORT_MESSAGE.to_string());
        }
    }

    let system_prompt = compose_system_prompt(mood);
    match completion.complete(&system_prompt, turns).await {
        Ok(reply) => TurnOutcome::Completed(reply),
        Err(e) => TurnOutcome::Failed(e),
    }
}

/// The single mapping from gateway failure kinds to the turn endpoint's
/// HTTP status and user-safe message.
fn gateway_failure_response(error: &GatewayError) -> (StatusCode, &'static str) {
    match error {
        GatewayError::Throttled => (
            StatusCode::TOO_MANY_REQUESTS,
            "I'm receiving many requests right now. Please try again in a moment. 💚",
        ),
        GatewayError::Unavailable => (
            StatusCode::PAYMENT_REQUIRED,
            "Service temporarily unavailable. Please try again later.",
        ),
        GatewayError::Upstream(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "I'm having trouble connecting right now. Please try again in a moment. Remember, you're not alone. 💚",
        ),
    }
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /turn - Run one conversation turn through the support pipeline
#[utoipa::path(
    post,
    path = "/turn",
    request_body = TurnRequest,
    responses(
        (status = 200, description = "Reply produced (completion or crisis escalation)", body = TurnResponse),
        (status = 401, description = "Missing or invalid bearer credential", body = ErrorResponse),
        (status = 429, description = "Completion gateway is rate limited", body = ErrorResponse),
        (status = 402, description = "Completion gateway is unavailable", body = ErrorResponse),
        (status = 500, description = "Completion gateway failure", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn turn_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TurnRequest>,
) -> Response {
    let start_time = Instant::now();

    let outcome = run_turn(
        &state.lexicon,
        state.completion.as_ref(),
        &req.turns,
        req.mood,
    )
    .await;

    // Message content is never logged; only the outcome kind and timing.
    match outcome {
        TurnOutcome::Escalated(reply) => {
            info!(
                "Turn escalated to crisis resources ({} turns in, took: {:?})",
                req.turns.len(),
                start_time.elapsed()
            );
            let body = TurnResponse {
                response: reply,
                is_crisis: true,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        TurnOutcome::Completed(reply) => {
            info!(
                "Turn completed via gateway ({} turns in, took: {:?})",
                req.turns.len(),
                start_time.elapsed()
            );
            let body = TurnResponse {
                response: reply,
                is_crisis: false,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        TurnOutcome::Failed(e) => {
            warn!("Turn failed at the gateway: {} (took: {:?})", e, start_time.elapsed());
            let (status, message) = gateway_failure_response(&e);
            let body = ErrorResponse {
                error: message.to_string(),
            };
            (status, Json(body)).into_response()
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A gateway stub that counts calls, captures the last system prompt,
    /// and replies with a canned result.
    struct StubGateway {
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
        reply: Result<String, GatewayError>,
    }

    impl StubGateway {
        fn ok(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
                reply: Ok(reply.to_string()),
            }
        }

        fn failing(error: GatewayError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
                reply: Err(error),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionService for StubGateway {
        async fn complete(
            &self,
            system_prompt: &str,
            _turns: &[Turn],
        ) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(system_prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(GatewayError::Throttled) => Err(GatewayError::Throttled),
                Err(GatewayError::Unavailable) => Err(GatewayError::Unavailable),
                Err(GatewayError::Upstream(reason)) => {
                    Err(GatewayError::Upstream(reason.clone()))
                }
            }
        }
    }

    #[tokio::test]
    async fn escalation_skips_the_gateway() {
        let lexicon = CrisisLexicon::builtin();
        let gateway = StubGateway::ok("should never be seen");
        let turns = vec![Turn::user("I want to die")];

        let outcome = run_turn(&lexicon, &gateway, &turns, None).await;

        match outcome {
            TurnOutcome::Escalated(reply) => {
                assert_eq!(reply, CRISIS_SUPPORT_MESSAGE);
                assert!(reply.contains("988"));
            }
            other => panic!("expected escalation, got {:?}", other),
        }
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn only_the_newest_user_turn_is_screened() {
        let lexicon = CrisisLexicon::builtin();
        let gateway = StubGateway::ok("Glad to hear today feels lighter.");
        let turns = vec![
            Turn::user("sometimes I think about suicide"),
            Turn::assistant("I'm really glad you told me. You deserve support."),
            Turn::user("talking helped, today feels a bit lighter"),
        ];

        let outcome = run_turn(&lexicon, &gateway, &turns, None).await;

        assert!(matches!(outcome, TurnOutcome::Completed(_)));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn assistant_only_conversations_go_to_the_gateway() {
        // Crisis phrases in assistant turns are the assistant's own safety
        // language, not a user signal; with no user turn screening is a no-op.
        let lexicon = CrisisLexicon::builtin();
        let gateway = StubGateway::ok("How are you feeling today?");
        let turns = vec![Turn::assistant(
            "If you ever have thoughts of suicide, please reach out to a crisis line.",
        )];

        let outcome = run_turn(&lexicon, &gateway, &turns, None).await;

        assert!(matches!(outcome, TurnOutcome::Completed(_)));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn completed_turns_pass_the_reply_through() {
        let lexicon = CrisisLexicon::builtin();
        let gateway = StubGateway::ok("That sounds hard...");
        let turns = vec![Turn::user("I feel anxious about work")];

        let outcome = run_turn(&lexicon, &gateway, &turns, Some(Mood::Anxious)).await;

        match outcome {
            TurnOutcome::Completed(reply) => assert_eq!(reply, "That sounds hard..."),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn the_mood_annotation_reaches_the_gateway() {
        let lexicon = CrisisLexicon::builtin();
        let gateway = StubGateway::ok("ok");
        let turns = vec![Turn::user("long day")];

        run_turn(&lexicon, &gateway, &turns, Some(Mood::Overwhelmed)).await;

        let prompt = gateway.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("**Current user mood**: overwhelmed."));

        run_turn(&lexicon, &gateway, &turns, None).await;
        let prompt = gateway.last_prompt.lock().unwrap().clone().unwrap();
        assert!(!prompt.contains("Current user mood"));
    }

    #[tokio::test]
    async fn gateway_failures_keep_their_kind() {
        let lexicon = CrisisLexicon::builtin();
        let gateway = StubGateway::failing(GatewayError::Throttled);
        let turns = vec![Turn::user("hello")];

        let outcome = run_turn(&lexicon, &gateway, &turns, None).await;

        match outcome {
            TurnOutcome::Failed(e) => {
                let (status, message) = gateway_failure_response(&e);
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert!(message.contains("try again in a moment"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn the_failure_table_covers_every_kind() {
        let (status, _) = gateway_failure_response(&GatewayError::Throttled);
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, message) = gateway_failure_response(&GatewayError::Unavailable);
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert!(message.contains("temporarily unavailable"));

        let (status, message) =
            gateway_failure_response(&GatewayError::Upstream("boom".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.contains("not alone"));
    }
}
