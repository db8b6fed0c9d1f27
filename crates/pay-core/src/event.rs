//! # Webhook Events
//!
//! Provider-agnostic view of a verified webhook notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Webhook event types we act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    /// checkout.session.completed
    CheckoutCompleted,
    /// checkout.session.async_payment_succeeded
    AsyncPaymentSucceeded,
    /// checkout.session.async_payment_failed
    AsyncPaymentFailed,
    /// Anything else, kept verbatim
    Unknown(String),
}

impl WebhookEventType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "checkout.session.completed" => WebhookEventType::CheckoutCompleted,
            "checkout.session.async_payment_succeeded" => WebhookEventType::AsyncPaymentSucceeded,
            "checkout.session.async_payment_failed" => WebhookEventType::AsyncPaymentFailed,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::CheckoutCompleted => "checkout.session.completed",
            WebhookEventType::AsyncPaymentSucceeded => "checkout.session.async_payment_succeeded",
            WebhookEventType::AsyncPaymentFailed => "checkout.session.async_payment_failed",
            WebhookEventType::Unknown(other) => other,
        }
    }
}

/// A verified webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Provider event id (evt_...)
    pub event_id: String,
    pub event_type: WebhookEventType,
    /// The object the event is about (a checkout session for the types we handle)
    pub object: Map<String, Value>,
    /// When the provider created the event
    pub created_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Id of the object the event describes
    pub fn object_id(&self) -> Option<&str> {
        self.object.get("id").and_then(Value::as_str)
    }

    /// Payment status of the session, when the object carries one
    pub fn payment_status(&self) -> Option<&str> {
        self.object.get("payment_status").and_then(Value::as_str)
    }
}
