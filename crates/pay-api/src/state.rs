//! # Application State
//!
//! Shared state for the Axum application.
//! Configuration is read once at startup and never mutated afterwards.

use pay_core::{BoxedPaymentGateway, CheckoutUrls, PaymentError};
use pay_stripe::{LoggingWebhookHandler, StripeClient, StripeConfig, WebhookHandler};
use std::path::PathBuf;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL the customer is sent back to after checkout
    pub domain: String,
    /// Provider price id sold by this server
    pub price_id: String,
    /// Publishable key handed to the client
    pub publishable_key: String,
    /// Directory with the pre-built client
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Load from environment variables
    ///
    /// Required: `PRICE`, `DOMAIN`, `STATIC_DIR`, `STRIPE_PUBLISHABLE_KEY`.
    /// Optional: `HOST` (default `localhost`), `PORT` (default `4242`).
    pub fn from_env() -> Result<Self, PaymentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PaymentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PaymentError::Configuration(format!("{} not set", key)))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| PaymentError::Configuration(format!("PORT is invalid: {}", raw)))?,
            None => 4242,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            domain: require("DOMAIN")?,
            price_id: require("PRICE")?,
            publishable_key: require("STRIPE_PUBLISHABLE_KEY")?,
            static_dir: PathBuf::from(require("STATIC_DIR")?),
        })
    }

    /// Address to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: Arc<AppConfig>,
    /// Remote payment provider
    pub gateway: BoxedPaymentGateway,
    /// Receives verified webhook events
    pub webhook_handler: Arc<dyn WebhookHandler>,
}

impl AppState {
    /// Create state around an existing gateway, logging webhook events
    pub fn new(config: AppConfig, gateway: BoxedPaymentGateway) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
            webhook_handler: Arc::new(LoggingWebhookHandler),
        }
    }

    /// Builder: replace the webhook handler
    pub fn with_webhook_handler(mut self, handler: Arc<dyn WebhookHandler>) -> Self {
        self.webhook_handler = handler;
        self
    }

    /// Create a new AppState backed by Stripe
    pub fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let stripe_config = StripeConfig::from_env()?;

        if stripe_config.is_test_mode() {
            tracing::info!("Stripe is in test mode");
        }

        let client = StripeClient::new(stripe_config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::new(config, Arc::new(client)))
    }

    /// Success/cancel URLs for new checkout sessions
    pub fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls::new(&self.config.domain)
    }
}
