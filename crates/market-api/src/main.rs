//! # resale-market
//!
//! REST backend for the secondhand marketplace.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export ACCESS_TOKEN_SECRET=...
//! export MONGODB_URI=mongodb+srv://...
//!
//! # Run the server
//! resale-market
//! ```

use market_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::from_env().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Storage backend: {}", state.market.store().backend_name());
    info!(
        "Payment provider: {} ({})",
        state.payments.provider_name(),
        state.config.currency
    );

    let app = routes::create_router(state);

    info!("Resale market starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Categories: GET http://{}/categories", addr);
        info!("Token: GET http://{}/jwt?email=...", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn print_banner() {
    println!(
        r#"
  Authois Resale Market
  ━━━━━━━━━━━━━━━━━━━━━━━
  Secondhand marketplace API
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
