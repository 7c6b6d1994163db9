//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod examples;

use anyhow::Context;
use auth::{AuthConfig, OAuthProvider, PgAuthAdapter, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::examples::examples_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let is_production = env::var("APP_ENV").is_ok_and(|v| v == "production");

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired sessions and verification tokens
    // Errors here should not prevent server startup
    let adapter = PgAuthAdapter::new(pool.clone());
    if let Err(e) = adapter.cleanup_expired().await {
        tracing::warn!(
            error = %e,
            "Auth cleanup failed, continuing anyway"
        );
    }

    let auth_config = auth_config(is_production)?;

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(adapter, auth_config))
        .nest("/api/examples", examples_router(pool))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .map(|p| p.parse::<u16>())
        .transpose()
        .context("PORT must be a port number")?
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, production = is_production, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Auth configuration from the environment
///
/// Development falls back to a random state secret and insecure cookies;
/// production requires `AUTH_SECRET`.
fn auth_config(is_production: bool) -> anyhow::Result<AuthConfig> {
    let base = if is_production {
        let secret_b64 = env::var("AUTH_SECRET").context("AUTH_SECRET must be set in production")?;
        AuthConfig {
            state_secret: decode_secret(&secret_b64)?,
            ..AuthConfig::default()
        }
    } else {
        match env::var("AUTH_SECRET") {
            Ok(secret_b64) => AuthConfig {
                state_secret: decode_secret(&secret_b64)?,
                cookie_secure: false,
                ..AuthConfig::default()
            },
            Err(_) => AuthConfig::development(),
        }
    };

    let client_id = env::var("DISCORD_CLIENT_ID").context("DISCORD_CLIENT_ID must be set")?;
    let client_secret =
        env::var("DISCORD_CLIENT_SECRET").context("DISCORD_CLIENT_SECRET must be set")?;

    Ok(AuthConfig {
        base_url: env::var("AUTH_URL").unwrap_or(base.base_url.clone()),
        ..base
    }
    .with_provider(OAuthProvider::discord(client_id, client_secret)))
}

/// Standard base64 encoding of exactly 32 bytes
fn decode_secret(secret_b64: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = Engine::decode(&general_purpose::STANDARD, secret_b64.trim())
        .context("AUTH_SECRET must be base64")?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("AUTH_SECRET must be 32 bytes, got {}", b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_secret() {
        let encoded = general_purpose::STANDARD.encode([9u8; 32]);
        assert_eq!(decode_secret(&encoded).unwrap(), [9u8; 32]);
    }

    #[test]
    fn test_decode_secret_rejects_wrong_length_and_garbage() {
        let short = general_purpose::STANDARD.encode([9u8; 16]);
        assert!(decode_secret(&short).is_err());
        assert!(decode_secret("not base64!").is_err());
    }
}
