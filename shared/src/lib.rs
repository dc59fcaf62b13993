//! Shared types and models for the wine lots storefront
//!
//! This crate contains the catalog and intention models, the case pricing
//! rules and form validation shared between the backend and the admin
//! panel (via WASM).

pub mod models;
pub mod pricing;
pub mod types;
pub mod validation;

pub use models::*;
pub use pricing::*;
pub use types::*;
pub use validation::*;

/// Errors raised when parsing stored model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Unknown wine category: {0}")]
    UnknownCategory(String),

    #[error("Unknown intention status: {0}")]
    UnknownStatus(String),
}
