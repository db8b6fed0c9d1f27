//! # Payment Gateway Trait
//!
//! The four remote operations the broker needs from a payment provider.
//! Everything non-trivial (pricing, session lifecycle, signing) lives on
//! the provider side; this trait is the seam between the HTTP layer and it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentGateway (trait)                   │
//! │  ├── get_price()                                            │
//! │  ├── create_checkout_session()                              │
//! │  ├── get_checkout_session()                                 │
//! │  └── construct_event()                                      │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┴─────────────────┐
//!          │                                   │
//!  ┌───────┴───────┐                   ┌───────┴───────┐
//!  │ StripeClient  │                   │  test doubles │
//!  └───────────────┘                   └───────────────┘
//! ```

use crate::error::PaymentResult;
use crate::event::WebhookEvent;
use crate::price::Price;
use crate::session::{CheckoutSession, CheckoutSessionParams};
use async_trait::async_trait;
use std::sync::Arc;

/// Remote payment provider operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Look up a price by provider id.
    async fn get_price(&self, price_id: &str) -> PaymentResult<Price>;

    /// Create a checkout session.
    ///
    /// # Returns
    /// The provider's session object; its `id` is what the client redirects with.
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> PaymentResult<CheckoutSession>;

    /// Retrieve a checkout session by id.
    async fn get_checkout_session(&self, session_id: &str) -> PaymentResult<CheckoutSession>;

    /// Verify a webhook signature and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes, exactly as received
    /// * `signature` - Signature header from the request
    fn construct_event(&self, payload: &[u8], signature: &str) -> PaymentResult<WebhookEvent>;

    /// Provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;
