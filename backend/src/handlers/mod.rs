//! HTTP handlers for the wine lots storefront

pub mod auth;
pub mod catalog;
pub mod health;
pub mod intention;
pub mod stats;

pub use auth::*;
pub use catalog::*;
pub use health::*;
pub use intention::*;
pub use stats::*;
