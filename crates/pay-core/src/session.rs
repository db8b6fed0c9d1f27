//! # Checkout Session Types
//!
//! The request sent to create a checkout session, the URLs the customer is
//! sent back to, and the opaque session the provider hands back.

use crate::error::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Placeholder the provider substitutes with the real session id on redirect
pub const SESSION_ID_TEMPLATE: &str = "{CHECKOUT_SESSION_ID}";

/// The only payment method offered at checkout
pub const DEFAULT_PAYMENT_METHOD: &str = "bacs_debit";

/// Checkout mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// One-time payment
    #[default]
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
        }
    }
}

/// Whether the payment method collected at checkout is saved for reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupFutureUsage {
    /// Reuse without the customer (recurring charges)
    OffSession,
}

impl SetupFutureUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupFutureUsage::OffSession => "off_session",
        }
    }
}

/// A line item referencing a provider price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Provider price id (price_...)
    pub price: String,
    pub quantity: u64,
}

/// Success and cancel URLs, rooted at the client's domain
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Base URL of the client (e.g., "http://localhost:4242")
    pub base_url: String,
    /// Success page path
    pub success_path: String,
    /// Cancel page path
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            success_path: "/success.html".to_string(),
            cancel_path: "/canceled.html".to_string(),
        }
    }

    /// Success URL carrying the session id template as a query parameter
    pub fn success_url(&self) -> String {
        format!(
            "{}{}?session_id={}",
            self.base_url, self.success_path, SESSION_ID_TEMPLATE
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }
}

/// Parameters for creating a checkout session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionParams {
    pub success_url: String,
    pub cancel_url: String,
    pub payment_method_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_future_usage: Option<SetupFutureUsage>,
    pub line_items: Vec<LineItem>,
    pub mode: CheckoutMode,
}

impl CheckoutSessionParams {
    /// A one-off payment for `quantity` units of a single price, paid by
    /// direct debit and kept for off-session reuse.
    pub fn for_price(urls: &CheckoutUrls, price_id: impl Into<String>, quantity: u64) -> Self {
        Self {
            success_url: urls.success_url(),
            cancel_url: urls.cancel_url(),
            payment_method_types: vec![DEFAULT_PAYMENT_METHOD.to_string()],
            setup_future_usage: Some(SetupFutureUsage::OffSession),
            line_items: vec![LineItem {
                price: price_id.into(),
                quantity,
            }],
            mode: CheckoutMode::Payment,
        }
    }
}

/// A checkout session as the provider represents it.
///
/// The object is owned by the provider and forwarded to clients untouched;
/// only the `id` is ever read locally.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct CheckoutSession(Value);

impl TryFrom<Value> for CheckoutSession {
    type Error = PaymentError;

    fn try_from(value: Value) -> PaymentResult<Self> {
        Self::from_value(value)
    }
}

impl Serialize for CheckoutSession {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Check that a session id is an opaque provider token (`cs_test_a1B2...`).
///
/// Ids end up as a URL path segment, so anything beyond ASCII letters,
/// digits and underscores is refused.
pub fn validate_session_id(session_id: &str) -> PaymentResult<()> {
    let well_formed = !session_id.is_empty()
        && session_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');

    if well_formed {
        Ok(())
    } else {
        Err(PaymentError::InvalidRequest(format!(
            "Invalid session id: {:?}",
            session_id
        )))
    }
}

impl CheckoutSession {
    /// Wrap a provider object, which must carry a string `id`
    pub fn from_value(value: Value) -> PaymentResult<Self> {
        match value.get("id") {
            Some(Value::String(_)) => Ok(Self(value)),
            _ => Err(PaymentError::Serialization(
                "checkout session is missing a string id".to_string(),
            )),
        }
    }

    pub fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    /// The full provider object
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}
