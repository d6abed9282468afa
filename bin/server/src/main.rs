//! Eureka question and answer server
//!
//! Serves the JSON API over HTTP, backed by a RocksDB data directory.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings (localhost:5000, ./eureka_data)
//! EUREKA_TOKEN_SECRET=<32+ byte secret> eureka-server
//!
//! # Run on custom address with a custom data directory
//! eureka-server --bind 0.0.0.0:8080 --data-dir /var/lib/eureka --token-secret <secret>
//!
//! # Shorter token lifetime
//! eureka-server --token-ttl-days 1
//!
//! # Enable debug logging
//! RUST_LOG=debug eureka-server
//! ```

use eureka::api::{build_router, AppState};
use eureka::config::ServerConfig;
use eureka::qa::QaStorage;
use eureka::storage::RocksDbConfig;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eureka=info,eureka_server=info,tower_http=debug".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!("Starting with {:?}", config);

    let signer = config.token_signer()?;
    let storage = Arc::new(QaStorage::open(
        &config.data_dir,
        &RocksDbConfig::for_server(),
    )?);

    let app = build_router(AppState::new(storage, signer));

    // Start server
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Eureka server running on http://{}", config.bind_addr);
    info!("");
    info!("Endpoints:");
    info!("  GET    /api/health               - Health check");
    info!("  POST   /api/auth/register        - Create an account");
    info!("  POST   /api/auth/login           - Log in and receive a token");
    info!("  GET    /api/users/me/profile     - Current user's account");
    info!("  GET    /api/users/:id            - Public profile with stats");
    info!("  GET    /api/themes               - List themes (?category=)");
    info!("  POST   /api/themes               - Create a theme");
    info!("  GET    /api/themes/:id           - Theme with its questions");
    info!("  GET    /api/questions            - List questions (?theme_id=&status=&user_id=)");
    info!("  POST   /api/questions            - Ask a question");
    info!("  GET    /api/questions/:id        - Question with answers");
    info!("  PUT    /api/questions/:id        - Update own question");
    info!("  POST   /api/answers              - Answer a question");
    info!("  PUT    /api/answers/:id          - Update own answer");
    info!("  POST   /api/answers/:id/select   - Select an answer (question owner)");
    info!("  POST   /api/answers/:id/upvote   - Upvote an answer");
    info!("  GET    /api/comments             - List comments (?parent_type=&parent_id=)");
    info!("  POST   /api/comments             - Comment on a question or answer");
    info!("  PUT    /api/comments/:id         - Edit own comment");
    info!("  DELETE /api/comments/:id         - Delete own comment");

    axum::serve(listener, app).await?;

    Ok(())
}
