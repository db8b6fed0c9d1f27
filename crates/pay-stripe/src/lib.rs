//! # pay-stripe
//!
//! Stripe gateway for the checkout session broker.
//!
//! `StripeClient` implements `pay_core::PaymentGateway` against the Stripe
//! REST API: price lookup, checkout session creation and retrieval, and
//! webhook signature verification.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_stripe::{StripeClient, StripeConfig};
//! use pay_core::{CheckoutSessionParams, CheckoutUrls, PaymentGateway};
//!
//! let client = StripeClient::new(StripeConfig::from_env()?)?;
//!
//! let price = client.get_price("price_123").await?;
//! let urls = CheckoutUrls::new("http://localhost:4242");
//! let session = client
//!     .create_checkout_session(&CheckoutSessionParams::for_price(&urls, &price.id, 1))
//!     .await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use pay_stripe::{dispatch_webhook_event, LoggingWebhookHandler};
//!
//! // In your webhook endpoint:
//! let event = client.construct_event(payload, signature)?;
//! dispatch_webhook_event(&LoggingWebhookHandler, &event)?;
//! ```

pub mod client;
pub mod config;
pub mod webhook;

// Re-exports
pub use client::StripeClient;
pub use config::StripeConfig;
pub use webhook::{
    construct_event, dispatch_webhook_event, signature_header, LoggingWebhookHandler,
    WebhookHandler, SIGNATURE_HEADER,
};
