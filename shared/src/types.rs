//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A numeric field as it arrives from a form: either a JSON number or a
/// free-text string such as `"16,90€"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Number(value.into())
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(RawAmount::Number)
            .unwrap_or_else(|| RawAmount::Text(value.to_string()))
    }
}

/// Format an amount in euros with two decimals, e.g. `12.50€`
pub fn format_euros(amount: Decimal) -> String {
    format!("{:.2}€", amount.round_dp(2))
}

/// Format a whole-unit price, e.g. `145€`
pub fn format_whole_euros(amount: Decimal) -> String {
    format!("{}€", amount.normalize())
}

/// Lot progress for one case, as displayed on the storefront
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotProgress {
    /// Intentions in the lot currently forming
    pub open_count: i64,
    /// Number of lots already complete
    pub closed_lot_count: i64,
}

impl LotProgress {
    /// Percentage of the forming lot that is filled, capped at 100
    pub fn percent_of(&self, min_participants: i32) -> u8 {
        let min = i64::from(min_participants.max(1));
        let pct = (self.open_count.max(0) * 100) / min;
        pct.min(100) as u8
    }
}
