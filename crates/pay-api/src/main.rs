//! # Checkout Server
//!
//! Brokers Stripe Checkout sessions for a static web client.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables (or put them in .env)
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_PUBLISHABLE_KEY=pk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export PRICE=price_...
//! export DOMAIN=http://localhost:4242
//! export STATIC_DIR=../client
//!
//! # Run the server
//! checkout-server
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file if present

    init_logging();

    print_banner();

    // Initialize application state
    let state = AppState::from_env()?;

    let addr = state.config.bind_addr();

    info!("Serving static files from {}", state.config.static_dir.display());
    info!("Selling price {}", state.config.price_id);
    info!("Payment provider: {}", state.gateway.provider_name());

    // Create router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Listening on http://{} ...", addr);
    info!("🔔 Webhook: POST http://{}/webhook", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` filters; `LOG_FORMAT=json` switches to structured output
fn init_logging() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

fn print_banner() {
    println!(
        r#"
  Checkout Server
  ━━━━━━━━━━━━━━━━━━━━━━━
  Stripe Checkout broker
  Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
