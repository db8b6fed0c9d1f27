//! # pay-core
//!
//! Core types and traits for the checkout session broker.
//!
//! This crate provides:
//! - `PaymentGateway` trait for the remote payment provider
//! - `Price`, `CheckoutSessionParams` and `CheckoutSession` for the checkout flow
//! - `WebhookEvent` for verified provider notifications
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{CheckoutSessionParams, CheckoutUrls, PaymentGateway};
//!
//! let urls = CheckoutUrls::new("http://localhost:4242");
//! let params = CheckoutSessionParams::for_price(&urls, "price_123", 2);
//!
//! let session = gateway.create_checkout_session(&params).await?;
//! println!("redirect with {}", session.id());
//! ```

pub mod error;
pub mod event;
pub mod gateway;
pub mod price;
pub mod session;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use event::{WebhookEvent, WebhookEventType};
pub use gateway::{BoxedPaymentGateway, PaymentGateway};
pub use price::Price;
pub use session::{
    CheckoutMode, CheckoutSession, CheckoutSessionParams, CheckoutUrls, LineItem,
    SetupFutureUsage, DEFAULT_PAYMENT_METHOD, SESSION_ID_TEMPLATE, validate_session_id,
};
