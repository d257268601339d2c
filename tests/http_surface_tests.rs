//! Tests for the assembled router: security headers, request-id handling,
//! health payload, and validation rejection. Uses a lazy pool so no database
//! is needed; none of these requests reach a query.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use lead_intake_api::ai_client::AiClient;
use lead_intake_api::app::build_app;
use lead_intake_api::config::Config;
use lead_intake_api::handlers::AppState;

fn test_config() -> Config {
    Config {
        database_url: "postgresql://localhost/unused".to_string(),
        db_max_connections: 1,
        port: 3000,
        groq_api_key: None,
        groq_base_url: "http://localhost:1".to_string(),
        ai_timeout: Duration::from_millis(500),
        cors_enabled: true,
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}

fn test_app() -> axum::Router {
    let config = test_config();
    // Lazy pool: no connection is made until a query runs.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .unwrap();
    let ai_client = AiClient::new(&config).unwrap();
    build_app(Arc::new(AppState {
        db: pool,
        config,
        ai_client,
    }))
}

#[tokio::test]
async fn health_carries_security_headers_and_request_id() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(
        headers.get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
        "max-age=31536000; includeSubDomains; preload"
    );
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));

    // A request id is generated when the client sends none.
    let request_id = headers
        .get("x-request-id")
        .expect("x-request-id should be set");
    assert!(!request_id.to_str().unwrap().is_empty());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["status"], "healthy");
    assert_eq!(payload["service"], "lead-intake-api");
    assert_eq!(payload["ai_enabled"], false);
}

#[tokio::test]
async fn client_supplied_request_id_is_echoed() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "corr-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "corr-42");
}

#[tokio::test]
async fn invalid_lead_is_rejected_before_touching_the_database() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/leads")
                .header(header::CONTENT_TYPE, "application/json")
                // Rate limiter keys on client IP; tests have no socket peer.
                .header("x-forwarded-for", "1.2.3.4")
                .body(Body::from(
                    r#"{"name": "Acme", "email": "cto@acme.io", "message": "short"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["success"], false);
    assert_eq!(payload["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(payload["error"]["status"], 400);
}
