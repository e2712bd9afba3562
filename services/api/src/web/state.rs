//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use solace_core::ports::{CompletionService, SessionStore};
use solace_core::screening::CrisisLexicon;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub completion: Arc<dyn CompletionService>,
    pub lexicon: Arc<CrisisLexicon>,
    pub config: Arc<Config>,
}
