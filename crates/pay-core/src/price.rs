//! # Price
//!
//! The price a checkout is sold at, as reported by the payment provider.

use serde::{Deserialize, Serialize};

/// A provider-side price.
///
/// Amounts are always in the smallest unit of the currency (pence, cents).
/// Prices are never cached: every lookup goes back to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Provider identifier (price_...)
    pub id: String,

    /// Amount in the smallest currency unit; tiered prices carry none
    #[serde(default)]
    pub unit_amount: Option<i64>,

    /// Three-letter ISO currency code, lowercase as the provider reports it
    pub currency: String,
}

impl Price {
    pub fn new(id: impl Into<String>, unit_amount: i64, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unit_amount: Some(unit_amount),
            currency: currency.into(),
        }
    }

    /// Unit amount, reading a missing amount as zero
    pub fn amount(&self) -> i64 {
        self.unit_amount.unwrap_or_default()
    }
}
