use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_intake_api::ai_client::AiClient;
use lead_intake_api::app::build_app;
use lead_intake_api::config::Config;
use lead_intake_api::db::Database;
use lead_intake_api::handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_intake_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool established");

    // Initialize AI client (runs in degraded mode without a credential)
    let ai_client = AiClient::new(&config)?;
    if config.groq_api_key.is_some() {
        tracing::info!("Groq client initialized: {}", config.groq_base_url);
    }

    let port = config.port;

    // Build application state and router
    let app_state = Arc::new(AppState {
        db: db.pool.clone(),
        config,
        ai_client,
    });
    let app = build_app(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
