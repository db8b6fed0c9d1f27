//! # Stripe Webhook Handling
//!
//! Signature verification and dispatch for Stripe webhooks.
//! Stripe signs every delivery with the endpoint's `whsec_` secret; nothing
//! in the body is trusted until the `Stripe-Signature` header checks out.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use pay_core::{PaymentError, PaymentResult, WebhookEvent, WebhookEventType};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Name of the header Stripe puts the signature in
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Webhook event handler trait
///
/// Implement this trait to react to checkout events. Every method defaults
/// to logging, which is all the broker itself does.
pub trait WebhookHandler: Send + Sync {
    /// Called when a checkout session is completed
    fn on_checkout_completed(&self, event: &WebhookEvent) -> PaymentResult<()> {
        info!(
            "Checkout session completed: session={:?}, payment_status={:?}",
            event.object_id(),
            event.payment_status()
        );
        Ok(())
    }

    /// Called when a delayed payment method (e.g. Bacs debit) settles
    fn on_async_payment_succeeded(&self, event: &WebhookEvent) -> PaymentResult<()> {
        info!(
            "Checkout session async payment succeeded: session={:?}",
            event.object_id()
        );
        Ok(())
    }

    /// Called when a delayed payment method fails
    fn on_async_payment_failed(&self, event: &WebhookEvent) -> PaymentResult<()> {
        warn!(
            "Checkout session async payment failed: session={:?}",
            event.object_id()
        );
        Ok(())
    }

    /// Called for unknown/unhandled events
    fn on_unknown_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
        debug!("Unhandled webhook event: {}", event.event_type.as_str());
        Ok(())
    }
}

/// Default no-op webhook handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a webhook event to the appropriate handler method
pub fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: &WebhookEvent,
) -> PaymentResult<()> {
    match &event.event_type {
        WebhookEventType::CheckoutCompleted => handler.on_checkout_completed(event),
        WebhookEventType::AsyncPaymentSucceeded => handler.on_async_payment_succeeded(event),
        WebhookEventType::AsyncPaymentFailed => handler.on_async_payment_failed(event),
        WebhookEventType::Unknown(_) => handler.on_unknown_event(event),
    }
}

/// Verify a webhook delivery and decode it into an event.
///
/// `header` is the raw `Stripe-Signature` value. Timestamps further than
/// `tolerance_secs` from now are rejected.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> PaymentResult<WebhookEvent> {
    construct_event_at(payload, header, secret, tolerance_secs, Utc::now().timestamp())
}

fn construct_event_at(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> PaymentResult<WebhookEvent> {
    let sig_parts = parse_signature_header(header)?;

    let tolerance = u64::try_from(tolerance_secs).unwrap_or(0);
    if now.abs_diff(sig_parts.timestamp) > tolerance {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let mac = signed_payload_mac(secret, sig_parts.timestamp, payload);

    // verify_slice compares in constant time
    let valid = sig_parts
        .signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());

    if !valid {
        return Err(PaymentError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Verified Stripe webhook: type={}", event.event_type);

    Ok(WebhookEvent {
        event_id: event.id,
        event_type: WebhookEventType::parse(&event.event_type),
        object: event.data.object,
        created_at: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
    })
}

/// Build a `Stripe-Signature` header value for a payload.
///
/// This is what Stripe sends; it is also how tests and local tooling forge
/// deliveries.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = signed_payload_mac(secret, timestamp, payload)
        .finalize()
        .into_bytes();
    format!("t={},v1={}", timestamp, hex::encode(signature))
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

// =============================================================================
// Signature header parsing
// =============================================================================

#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}
