//! Business logic services for the wine lots storefront

pub mod auth;
pub mod catalog;
pub mod intention;
pub mod lot;
pub mod notification;
pub mod stats;

pub use auth::AdminAuthService;
pub use catalog::CatalogService;
pub use intention::IntentionService;
pub use lot::{LotLocks, LotService};
pub use notification::NotificationService;
pub use stats::StatsService;
