//! # pay-api
//!
//! HTTP API layer for the checkout session broker.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Endpoints for price config and checkout sessions
//! - Webhook handler for payment events
//! - Static file serving for the client
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/config` | Publishable key, unit amount, currency |
//! | POST | `/create-checkout-session` | Create checkout session |
//! | GET | `/checkout-session?sessionId=` | Retrieve checkout session |
//! | POST | `/webhook` | Stripe webhook |
//! | GET | `/*` | Static client files |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
