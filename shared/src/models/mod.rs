//! Domain models for the wine lots storefront

mod case;
mod intention;

pub use case::*;
pub use intention::*;
