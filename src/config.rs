use std::time::Duration;

use serde::Deserialize;

/// Default Groq endpoint (OpenAI-compatible chat completions).
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Production model used for lead analysis and email generation.
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Outbound AI request timeout (milliseconds). Overridable for tests.
const DEFAULT_AI_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    /// Bearer credential for the Groq API. `None` disables enrichment:
    /// leads are still accepted and stored, analysis and email are skipped.
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    #[serde(skip, default = "default_ai_timeout")]
    pub ai_timeout: Duration,
    pub cors_enabled: bool,
    pub allowed_origins: Vec<String>,
}

fn default_ai_timeout() -> Duration {
    Duration::from_millis(DEFAULT_AI_TIMEOUT_MS)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            db_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a positive integer")
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            groq_api_key: std::env::var("GROQ_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            groq_base_url: std::env::var("GROQ_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("GROQ_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            ai_timeout: std::env::var("GROQ_TIMEOUT_MS")
                .ok()
                .map(|ms| {
                    ms.parse::<u64>()
                        .map_err(|_| anyhow::anyhow!("GROQ_TIMEOUT_MS must be a positive integer"))
                })
                .transpose()?
                .map(Duration::from_millis)
                .unwrap_or_else(default_ai_timeout),
            cors_enabled: std::env::var("CORS_ENABLED")
                .map(|v| v != "false")
                .unwrap_or(true),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Groq Base URL: {}", config.groq_base_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.groq_api_key.is_none() {
            tracing::warn!(
                "GROQ_API_KEY is not set. Lead creation will succeed but AI analysis \
                 and email generation will be skipped."
            );
        }

        Ok(config)
    }
}
