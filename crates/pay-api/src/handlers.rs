//! # Request Handlers
//!
//! Axum request handlers for the checkout broker.
//! Every failure is logged and answered with its status code and the raw
//! error text.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use pay_core::{validate_session_id, CheckoutSessionParams, PaymentError};
use pay_stripe::{dispatch_webhook_event, SIGNATURE_HEADER};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Public configuration for the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub public_key: String,
    pub unit_amount: i64,
    pub currency: String,
}

/// Create checkout session request
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutSessionRequest {
    #[serde(default)]
    pub quantity: Option<u64>,
}

/// Create checkout session response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionResponse {
    pub session_id: String,
}

/// Query for `/checkout-session`
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Error returned from a handler.
///
/// Rendered as the status code from `PaymentError::status_code` with the
/// error text as a plain-text body.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub PaymentError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.0.to_string()).into_response()
    }
}

/// Serialize a value into a JSON response.
///
/// A value that fails to serialize becomes a 500 carrying the error text.
pub fn write_json<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(buf) => ([(header::CONTENT_TYPE, "application/json")], buf).into_response(),
        Err(e) => {
            error!("Failed to encode JSON response: {}", e);
            ApiError(e.into()).into_response()
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Returned for a known path hit with the wrong verb
pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Publishable key and the live price of the configured product
#[instrument(skip(state))]
pub async fn get_config(State(state): State<AppState>) -> Result<Response, ApiError> {
    let price = state
        .gateway
        .get_price(&state.config.price_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch price {}: {}", state.config.price_id, e);
            ApiError(e)
        })?;

    Ok(write_json(&ConfigResponse {
        public_key: state.config.publishable_key.clone(),
        unit_amount: price.amount(),
        currency: price.currency,
    }))
}

/// Create a checkout session for the configured price
#[instrument(skip(state, body))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let quantity = parse_quantity(&body).map_err(|e| {
        error!("Rejected checkout request: {}", e);
        ApiError(e)
    })?;

    let params =
        CheckoutSessionParams::for_price(&state.checkout_urls(), &state.config.price_id, quantity);

    let session = state
        .gateway
        .create_checkout_session(&params)
        .await
        .map_err(|e| {
            error!("Failed to create checkout session: {}", e);
            ApiError(e)
        })?;

    info!(
        "Created checkout session: id={}, quantity={}",
        session.id(),
        quantity
    );

    Ok(write_json(&CreateCheckoutSessionResponse {
        session_id: session.id().to_string(),
    }))
}

fn parse_quantity(body: &[u8]) -> Result<u64, PaymentError> {
    let request: CreateCheckoutSessionRequest = serde_json::from_slice(body)
        .map_err(|e| PaymentError::MalformedBody(e.to_string()))?;

    match request.quantity {
        Some(quantity) if quantity > 0 => Ok(quantity),
        Some(_) => Err(PaymentError::MalformedBody(
            "quantity must be at least 1".to_string(),
        )),
        None => Err(PaymentError::MalformedBody("quantity is required".to_string())),
    }
}

/// Look up a checkout session and return the provider's object unchanged
#[instrument(skip(state))]
pub async fn get_checkout_session(
    State(state): State<AppState>,
    query: Result<Query<CheckoutSessionQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| {
        error!("Failed to parse checkout session query: {}", e);
        ApiError(PaymentError::InvalidRequest(e.body_text()))
    })?;

    let session_id = match query.session_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            error!("Url Param 'sessionId' is missing");
            return Err(ApiError(PaymentError::InvalidRequest(
                "Url Param 'sessionId' is missing".to_string(),
            )));
        }
    };

    validate_session_id(session_id).map_err(|e| {
        error!("Rejected checkout session lookup: {}", e);
        ApiError(e)
    })?;

    let session = state
        .gateway
        .get_checkout_session(session_id)
        .await
        .map_err(|e| {
            error!("Failed to retrieve checkout session {}: {}", session_id, e);
            ApiError(e)
        })?;

    Ok(write_json(session.as_value()))
}

/// Handle a provider webhook
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, ApiError> {
    let body = body.map_err(|e| {
        error!("Failed to read webhook body: {}", e);
        ApiError(PaymentError::InvalidRequest(e.body_text()))
    })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let event = state
        .gateway
        .construct_event(&body, signature)
        .map_err(|e| {
            error!("Webhook verification failed: {}", e);
            ApiError(e)
        })?;

    info!(
        "Received webhook: type={}, id={}, provider={}, created_at={}",
        event.event_type.as_str(),
        event.event_id,
        state.gateway.provider_name(),
        event.created_at.to_rfc3339()
    );

    dispatch_webhook_event(state.webhook_handler.as_ref(), &event).map_err(|e| {
        error!("Webhook handler error: {}", e);
        ApiError(e)
    })?;

    Ok(StatusCode::OK)
}
