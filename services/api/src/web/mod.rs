pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod turn;

// Re-export the pieces the binaries and integration tests assemble.
pub use middleware::require_auth;
pub use rest::{
    append_message_handler, create_session_handler, list_messages_handler, list_moods_handler,
    list_sessions_handler, record_mood_handler,
};
pub use turn::turn_handler;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::post,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::web::state::AppState;

/// Builds the application router: public auth routes, protected routes
/// behind `require_auth`, permissive CORS (the layer answers preflight
/// itself, with no body), and a request body cap.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/turn", post(turn::turn_handler))
        .route(
            "/sessions",
            post(rest::create_session_handler).get(rest::list_sessions_handler),
        )
        .route(
            "/sessions/{id}/messages",
            post(rest::append_message_handler).get(rest::list_messages_handler),
        )
        .route(
            "/moods",
            post(rest::record_mood_handler).get(rest::list_moods_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
