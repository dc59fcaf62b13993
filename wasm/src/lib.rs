//! WebAssembly module for the wine lots storefront
//!
//! Provides client-side computation for:
//! - Case price preview in the admin form
//! - Price per bottle
//! - Lot progress bars
//! - Form validation

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::models::ItemInput;
use shared::pricing::{compute_price, normalize_price, normalize_quantity};
use shared::types::{format_euros, LotProgress, RawAmount};

// Re-export shared types for use in JavaScript
pub use shared::models::*;

/// Price a case from a JSON array of items, as the server will
#[wasm_bindgen]
pub fn compute_case_price(items_json: &str) -> Result<String, JsValue> {
    let items: Vec<ItemInput> = serde_json::from_str(items_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid items JSON: {}", e)))?;

    Ok(compute_price(&items).to_string())
}

/// Price of one bottle, e.g. "12.50€"
#[wasm_bindgen]
pub fn price_per_bottle(case_price: f64, bottles: u32) -> String {
    let price = Decimal::try_from(case_price).unwrap_or(Decimal::ZERO);
    format_euros(shared::pricing::price_per_bottle(price, bottles))
}

/// Normalize a typed unit price ("16,90€" → "16.90")
#[wasm_bindgen]
pub fn normalize_unit_price(raw: &str) -> String {
    normalize_price(Some(&RawAmount::from(raw))).to_string()
}

/// Normalize a typed quantity; blank or invalid gives the default
#[wasm_bindgen]
pub fn normalize_item_quantity(raw: &str) -> i32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return normalize_quantity(None);
    }
    normalize_quantity(Some(&RawAmount::from(trimmed)))
}

/// Fill percentage of the open lot, capped at 100
#[wasm_bindgen]
pub fn lot_progress_percent(current: u32, min_participants: i32) -> u8 {
    LotProgress {
        open_count: i64::from(current),
        closed_lot_count: 0,
    }
    .percent_of(min_participants)
}

/// Basic email check used before submitting the form
#[wasm_bindgen]
pub fn is_valid_email(email: &str) -> bool {
    shared::validation::validate_email(email).is_ok()
}
