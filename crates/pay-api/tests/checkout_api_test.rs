//! HTTP-level tests for the checkout broker.
//!
//! The router runs against an in-memory gateway that records every remote
//! call, so each test can assert both the response and whether the provider
//! was contacted. Webhook tests sign payloads with the real Stripe scheme.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::TestServer;
use pay_api::{create_router, AppConfig, AppState};
use pay_core::{
    CheckoutSession, CheckoutSessionParams, PaymentError, PaymentGateway, PaymentResult, Price,
    WebhookEvent,
};
use pay_stripe::{construct_event, signature_header, WebhookHandler};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const WEBHOOK_SECRET: &str = "whsec_test_secret";

// =============================================================================
// Test doubles
// =============================================================================

#[derive(Default)]
struct FakeGateway {
    fail_create: bool,
    remote_calls: AtomicUsize,
    created: Mutex<Vec<CheckoutSessionParams>>,
    sessions: Mutex<HashMap<String, Value>>,
}

impl FakeGateway {
    fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn get_price(&self, price_id: &str) -> PaymentResult<Price> {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
        match price_id {
            "price_123" => Ok(Price::new("price_123", 1999, "gbp")),
            other => Err(PaymentError::stripe(format!("No such price: '{}'", other))),
        }
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> PaymentResult<CheckoutSession> {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(PaymentError::stripe("Invalid payment_method_types"));
        }

        let mut created = self.created.lock().unwrap();
        created.push(params.clone());
        let id = format!("cs_test_{}", created.len());
        let session = json!({
            "id": id,
            "object": "checkout.session",
            "mode": params.mode.as_str(),
            "payment_status": "unpaid",
            "success_url": params.success_url,
        });
        self.sessions
            .lock()
            .unwrap()
            .insert(id.clone(), session.clone());
        CheckoutSession::from_value(session)
    }

    async fn get_checkout_session(&self, session_id: &str) -> PaymentResult<CheckoutSession> {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
        let session = self.sessions.lock().unwrap().get(session_id).cloned();
        match session {
            Some(value) => CheckoutSession::from_value(value),
            None => Err(PaymentError::stripe(format!(
                "No such checkout.session: '{}'",
                session_id
            ))),
        }
    }

    fn construct_event(&self, payload: &[u8], signature: &str) -> PaymentResult<WebhookEvent> {
        construct_event(payload, signature, WEBHOOK_SECRET, 300)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
struct RecordingHandler {
    calls: Mutex<Vec<String>>,
}

impl RecordingHandler {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: &str, event: &WebhookEvent) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", kind, event.object_id().unwrap_or("-")));
    }
}

impl WebhookHandler for RecordingHandler {
    fn on_checkout_completed(&self, event: &WebhookEvent) -> PaymentResult<()> {
        self.record("completed", event);
        Ok(())
    }

    fn on_async_payment_succeeded(&self, event: &WebhookEvent) -> PaymentResult<()> {
        self.record("succeeded", event);
        Ok(())
    }

    fn on_async_payment_failed(&self, event: &WebhookEvent) -> PaymentResult<()> {
        self.record("failed", event);
        Ok(())
    }

    fn on_unknown_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
        self.record("unknown", event);
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    server: TestServer,
    gateway: Arc<FakeGateway>,
    handler: Arc<RecordingHandler>,
}

fn config(static_dir: &Path) -> AppConfig {
    AppConfig {
        host: "localhost".to_string(),
        port: 4242,
        domain: "http://localhost:4242".to_string(),
        price_id: "price_123".to_string(),
        publishable_key: "pk_test_xyz789".to_string(),
        static_dir: static_dir.to_path_buf(),
    }
}

fn harness_with(gateway: FakeGateway, static_dir: &Path) -> Harness {
    let gateway = Arc::new(gateway);
    let handler = Arc::new(RecordingHandler::default());
    let state = AppState::new(config(static_dir), gateway.clone())
        .with_webhook_handler(handler.clone());
    let server = TestServer::new(create_router(state)).expect("failed to start test server");

    Harness {
        server,
        gateway,
        handler,
    }
}

fn harness() -> Harness {
    harness_with(FakeGateway::default(), Path::new("does-not-exist"))
}

fn event_payload(event_type: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_test_1",
        "object": "event",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "cs_test_42",
                "object": "checkout.session",
                "payment_status": "paid"
            }
        }
    }))
    .unwrap()
}

fn signature_for(secret: &str, payload: &[u8]) -> HeaderValue {
    let header = signature_header(secret, chrono::Utc::now().timestamp(), payload);
    HeaderValue::from_str(&header).unwrap()
}

fn stripe_signature() -> HeaderName {
    HeaderName::from_static("stripe-signature")
}

// =============================================================================
// /config
// =============================================================================

#[tokio::test]
async fn config_reports_gateway_price() {
    let h = harness();

    let response = h.server.get("/config").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({"publicKey": "pk_test_xyz789", "unitAmount": 1999, "currency": "gbp"})
    );
    assert_eq!(h.gateway.remote_calls(), 1);
}

#[tokio::test]
async fn config_surfaces_remote_failure_as_500() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(FakeGateway::default());
    let mut config = config(dir.path());
    config.price_id = "price_gone".to_string();
    let server = TestServer::new(create_router(AppState::new(config, gateway))).unwrap();

    let response = server.get("/config").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text(),
        "Provider error [stripe]: No such price: 'price_gone'"
    );
}

// =============================================================================
// Method checks
// =============================================================================

#[tokio::test]
async fn wrong_methods_are_not_allowed() {
    let h = harness();

    for (method, path) in [
        (Method::POST, "/config"),
        (Method::PUT, "/config"),
        (Method::GET, "/create-checkout-session"),
        (Method::POST, "/checkout-session"),
        (Method::GET, "/webhook"),
        (Method::DELETE, "/webhook"),
    ] {
        let response = h.server.method(method.clone(), path).await;
        assert_eq!(
            response.status_code(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{} {}",
            method,
            path
        );
    }

    assert_eq!(h.gateway.remote_calls(), 0);
    assert!(h.handler.calls().is_empty());
}

// =============================================================================
// /create-checkout-session and /checkout-session
// =============================================================================

#[tokio::test]
async fn malformed_checkout_bodies_are_500_without_remote_call() {
    let h = harness();

    for body in [
        "not json",
        "{}",
        r#"{"quantity": null}"#,
        r#"{"quantity": "3"}"#,
        r#"{"quantity": -1}"#,
        r#"{"quantity": 0}"#,
        r#"{"quantity": 1.5}"#,
    ] {
        let response = h
            .server
            .post("/create-checkout-session")
            .text(body)
            .await;
        assert_eq!(
            response.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "body: {}",
            body
        );
    }

    assert_eq!(h.gateway.remote_calls(), 0);
}

#[tokio::test]
async fn created_session_can_be_retrieved_by_id() {
    let h = harness();

    let created = h
        .server
        .post("/create-checkout-session")
        .json(&json!({"quantity": 2}))
        .await;
    assert_eq!(created.status_code(), StatusCode::OK);
    let session_id = created.json::<Value>()["sessionId"]
        .as_str()
        .expect("sessionId should be a string")
        .to_string();

    let fetched = h
        .server
        .get("/checkout-session")
        .add_query_param("sessionId", &session_id)
        .await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    let session = fetched.json::<Value>();
    assert_eq!(session["id"], session_id.as_str());
    assert_eq!(session["object"], "checkout.session");
}

#[tokio::test]
async fn checkout_request_carries_fixed_parameters() {
    let h = harness();

    h.server
        .post("/create-checkout-session")
        .json(&json!({"quantity": 5}))
        .await
        .assert_status_ok();

    let created = h.gateway.created.lock().unwrap();
    let params = &created[0];
    assert_eq!(
        params.success_url,
        "http://localhost:4242/success.html?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(params.cancel_url, "http://localhost:4242/canceled.html");
    assert_eq!(params.payment_method_types, vec!["bacs_debit"]);
    assert_eq!(params.line_items.len(), 1);
    assert_eq!(params.line_items[0].price, "price_123");
    assert_eq!(params.line_items[0].quantity, 5);
}

#[tokio::test]
async fn failed_creation_is_reported_not_swallowed() {
    let h = harness_with(FakeGateway::failing_create(), Path::new("does-not-exist"));

    let response = h
        .server
        .post("/create-checkout-session")
        .json(&json!({"quantity": 1}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().contains("Invalid payment_method_types"));
}

#[tokio::test]
async fn missing_session_id_is_400_without_remote_call() {
    let h = harness();

    let response = h.server.get("/checkout-session").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Invalid request: Url Param 'sessionId' is missing");

    let response = h
        .server
        .get("/checkout-session")
        .add_query_param("sessionId", "")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    assert_eq!(h.gateway.remote_calls(), 0);
}

#[tokio::test]
async fn path_like_session_ids_are_400_without_remote_call() {
    let h = harness();

    for session_id in [
        "../x",
        "..",
        "../../customers/cus_secret",
        "a/b",
        "a?expand[]=x",
        "cs_test_1#line_items",
    ] {
        let response = h
            .server
            .get("/checkout-session")
            .add_query_param("sessionId", session_id)
            .await;

        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "sessionId={:?}",
            session_id
        );
        assert!(response.text().starts_with("Invalid request: Invalid session id"));
    }

    assert_eq!(h.gateway.remote_calls(), 0);
}

#[tokio::test]
async fn unparseable_session_query_is_400_without_remote_call() {
    let h = harness();

    let response = h
        .server
        .get("/checkout-session")
        .add_query_param("sessionId", "cs_test_1")
        .add_query_param("sessionId", "cs_test_2")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.text().starts_with("Invalid request:"));
    assert_eq!(h.gateway.remote_calls(), 0);
}

#[tokio::test]
async fn unknown_session_is_500() {
    let h = harness();

    let response = h
        .server
        .get("/checkout-session")
        .add_query_param("sessionId", "cs_test_nope")
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.gateway.remote_calls(), 1);
}

// =============================================================================
// /webhook
// =============================================================================

#[tokio::test]
async fn invalid_signature_is_400_and_not_dispatched() {
    let h = harness();
    let payload = event_payload("checkout.session.completed");

    let response = h
        .server
        .post("/webhook")
        .bytes(Bytes::from(payload.clone()))
        .add_header(stripe_signature(), signature_for("whsec_wrong", &payload))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(h.handler.calls().is_empty());
}

#[tokio::test]
async fn missing_signature_is_400() {
    let h = harness();

    let response = h
        .server
        .post("/webhook")
        .bytes(Bytes::from(event_payload("checkout.session.completed")))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(h.handler.calls().is_empty());
}

#[tokio::test]
async fn completed_event_is_dispatched_and_acknowledged() {
    let h = harness();
    let payload = event_payload("checkout.session.completed");

    let response = h
        .server
        .post("/webhook")
        .bytes(Bytes::from(payload.clone()))
        .add_header(stripe_signature(), signature_for(WEBHOOK_SECRET, &payload))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "");
    assert_eq!(h.handler.calls(), vec!["completed:cs_test_42"]);
    assert_eq!(h.gateway.remote_calls(), 0);
}

#[tokio::test]
async fn async_payment_events_are_dispatched() {
    let h = harness();

    for event_type in [
        "checkout.session.async_payment_succeeded",
        "checkout.session.async_payment_failed",
        "payment_intent.created",
    ] {
        let payload = event_payload(event_type);
        h.server
            .post("/webhook")
            .bytes(Bytes::from(payload.clone()))
            .add_header(stripe_signature(), signature_for(WEBHOOK_SECRET, &payload))
            .await
            .assert_status_ok();
    }

    assert_eq!(
        h.handler.calls(),
        vec![
            "succeeded:cs_test_42",
            "failed:cs_test_42",
            "unknown:cs_test_42"
        ]
    );
}

// =============================================================================
// Static files
// =============================================================================

#[tokio::test]
async fn static_client_is_served_from_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Checkout</h1>").unwrap();
    std::fs::write(dir.path().join("success.html"), "<h1>Paid</h1>").unwrap();
    let h = harness_with(FakeGateway::default(), dir.path());

    let index = h.server.get("/").await;
    assert_eq!(index.status_code(), StatusCode::OK);
    assert_eq!(index.text(), "<h1>Checkout</h1>");

    let success = h.server.get("/success.html").await;
    assert_eq!(success.text(), "<h1>Paid</h1>");

    h.server
        .get("/missing.html")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
