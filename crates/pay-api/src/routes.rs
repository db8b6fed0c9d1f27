//! # Routes
//!
//! Axum router configuration for the checkout broker.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Create the main application router
///
/// Routes:
/// - GET  /config - Publishable key and price
/// - POST /create-checkout-session - Create checkout session
/// - GET  /checkout-session?sessionId= - Retrieve checkout session
/// - POST /webhook - Stripe webhook handler
///
/// Anything else is served from the static directory. A known path hit
/// with the wrong verb answers 405.
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route(
            "/config",
            get(handlers::get_config).fallback(handlers::method_not_allowed),
        )
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session).fallback(handlers::method_not_allowed),
        )
        .route(
            "/checkout-session",
            get(handlers::get_checkout_session).fallback(handlers::method_not_allowed),
        )
        .route(
            "/webhook",
            post(handlers::webhook).fallback(handlers::method_not_allowed),
        )
        // Client assets
        .fallback_service(static_files)
        // Middleware
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, http::StatusCode};
    use pay_core::{
        CheckoutSession, CheckoutSessionParams, PaymentError, PaymentGateway, PaymentResult,
        Price, WebhookEvent,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Gateway that fails every call; routing tests never reach it
    struct UnreachableGateway;

    #[async_trait]
    impl PaymentGateway for UnreachableGateway {
        async fn get_price(&self, _price_id: &str) -> PaymentResult<Price> {
            Err(PaymentError::Internal("unreachable".into()))
        }

        async fn create_checkout_session(
            &self,
            _params: &CheckoutSessionParams,
        ) -> PaymentResult<CheckoutSession> {
            Err(PaymentError::Internal("unreachable".into()))
        }

        async fn get_checkout_session(&self, _session_id: &str) -> PaymentResult<CheckoutSession> {
            Err(PaymentError::Internal("unreachable".into()))
        }

        fn construct_event(&self, _payload: &[u8], _signature: &str) -> PaymentResult<WebhookEvent> {
            Err(PaymentError::Internal("unreachable".into()))
        }

        fn provider_name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn router() -> Router {
        let config = AppConfig {
            host: "localhost".into(),
            port: 4242,
            domain: "http://localhost:4242".into(),
            price_id: "price_123".into(),
            publishable_key: "pk_test_xyz789".into(),
            static_dir: "does-not-exist".into(),
        };
        create_router(AppState::new(config, Arc::new(UnreachableGateway)))
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        for (method, uri) in [
            ("POST", "/config"),
            ("GET", "/create-checkout-session"),
            ("DELETE", "/checkout-session"),
            ("GET", "/webhook"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = router().oneshot(request).await.unwrap();

            assert_eq!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "{} {}",
                method,
                uri
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let request = Request::builder()
            .uri("/missing.js")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
