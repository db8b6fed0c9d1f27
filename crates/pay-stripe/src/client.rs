//! # Stripe REST Client
//!
//! `PaymentGateway` implementation backed by the Stripe REST API.
//! Prices and checkout sessions are fetched live; webhook verification is
//! done locally with the endpoint secret.

use crate::config::StripeConfig;
use crate::webhook;
use async_trait::async_trait;
use pay_core::{
    validate_session_id, CheckoutSession, CheckoutSessionParams, PaymentError, PaymentGateway,
    PaymentResult, Price, WebhookEvent,
};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Stripe API client
pub struct StripeClient {
    config: StripeConfig,
    client: Client,
}

impl StripeClient {
    /// Create a new client
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build an API URL from path segments.
    ///
    /// Each segment is percent-encoded on its own, so caller-supplied ids
    /// can never add path components, a query or a fragment.
    fn url(&self, segments: &[&str]) -> PaymentResult<Url> {
        let mut url = Url::parse(&self.config.api_base_url).map_err(|e| {
            PaymentError::Configuration(format!(
                "Invalid Stripe API base URL {}: {}",
                self.config.api_base_url, e
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                PaymentError::Configuration(format!(
                    "Stripe API base URL cannot carry a path: {}",
                    self.config.api_base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
    }

    /// Send a request and decode the body, turning Stripe error payloads
    /// into `ProviderError`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PaymentResult<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(PaymentError::stripe(error_response.error.message));
            }

            return Err(PaymentError::stripe(format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// Encode checkout params in Stripe's bracketed form notation
fn checkout_form_params(params: &CheckoutSessionParams) -> Vec<(String, String)> {
    let mut form_params: Vec<(String, String)> = vec![
        ("mode".to_string(), params.mode.as_str().to_string()),
        ("success_url".to_string(), params.success_url.clone()),
        ("cancel_url".to_string(), params.cancel_url.clone()),
    ];

    for (i, method) in params.payment_method_types.iter().enumerate() {
        form_params.push((format!("payment_method_types[{}]", i), method.clone()));
    }

    if let Some(usage) = params.setup_future_usage {
        form_params.push((
            "payment_intent_data[setup_future_usage]".to_string(),
            usage.as_str().to_string(),
        ));
    }

    for (i, item) in params.line_items.iter().enumerate() {
        form_params.push((format!("line_items[{}][price]", i), item.price.clone()));
        form_params.push((
            format!("line_items[{}][quantity]", i),
            item.quantity.to_string(),
        ));
    }

    form_params
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self))]
    async fn get_price(&self, price_id: &str) -> PaymentResult<Price> {
        let request = self.client.get(self.url(&["v1", "prices", price_id])?);
        let price: Price = self.send(request).await?;

        debug!(
            "Fetched Stripe price: id={}, amount={:?}, currency={}",
            price.id, price.unit_amount, price.currency
        );
        Ok(price)
    }

    #[instrument(skip(self, params), fields(line_items = params.line_items.len()))]
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> PaymentResult<CheckoutSession> {
        let form_params = checkout_form_params(params);
        debug!(
            "Creating Stripe checkout session: mode={}, {} form params",
            params.mode.as_str(),
            form_params.len()
        );

        let request = self
            .client
            .post(self.url(&["v1", "checkout", "sessions"])?)
            .form(&form_params);
        let session = CheckoutSession::from_value(self.send(request).await?)?;

        info!("Created Stripe checkout session: id={}", session.id());
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn get_checkout_session(&self, session_id: &str) -> PaymentResult<CheckoutSession> {
        validate_session_id(session_id)?;

        let request = self
            .client
            .get(self.url(&["v1", "checkout", "sessions", session_id])?);
        CheckoutSession::from_value(self.send(request).await?)
    }

    #[instrument(skip(self, payload, signature))]
    fn construct_event(&self, payload: &[u8], signature: &str) -> PaymentResult<WebhookEvent> {
        webhook::construct_event(
            payload,
            signature,
            &self.config.webhook_secret,
            self.config.webhook_tolerance_secs,
        )
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
