//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{completion_llm::CompletionGatewayAdapter, db::DbAdapter},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::Router;
use solace_core::CrisisLexicon;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Completion Gateway ---
    let api_key = config
        .completion_api_key
        .clone()
        .ok_or_else(|| ApiError::Internal("COMPLETION_API_KEY is required".to_string()))?;
    let completion_adapter = Arc::new(
        CompletionGatewayAdapter::new(
            &config.completion_base_url,
            api_key,
            config.completion_model.clone(),
            Duration::from_secs(config.completion_timeout_secs),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to build completion client: {}", e)))?,
    );

    // --- 4. Load the Crisis Lexicon ---
    let lexicon = match &config.crisis_lexicon_path {
        Some(path) => CrisisLexicon::from_file(path)?,
        None => CrisisLexicon::builtin(),
    };
    info!(
        "Crisis lexicon '{}' loaded with {} phrases",
        lexicon.version,
        lexicon.phrases.len()
    );

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store: db_adapter,
        completion: completion_adapter,
        lexicon: Arc::new(lexicon),
        config: config.clone(),
    });

    // --- 6. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::build_router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
