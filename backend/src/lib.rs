//! Wine lots storefront - backend library
//!
//! Group buying of wine cases: visitors register intentions for a case,
//! intentions fill numbered lots, and a lot closes once it reaches the
//! case's participant threshold.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::Config;

use external::Mailer;
use repository::{CatalogRepository, InMemoryStore, IntentionRepository};
use services::{
    AdminAuthService, CatalogService, IntentionService, LotLocks, LotService,
    NotificationService, StatsService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub intentions: Arc<dyn IntentionRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub lot_locks: LotLocks,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        intentions: Arc<dyn IntentionRepository>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        Self {
            catalog,
            intentions,
            mailer,
            lot_locks: LotLocks::new(),
            config: Arc::new(config),
        }
    }

    /// State backed by one [`InMemoryStore`] for both repositories
    pub fn in_memory(store: InMemoryStore, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self::new(Arc::new(store.clone()), Arc::new(store), mailer, config)
    }

    pub fn catalog_service(&self) -> CatalogService {
        CatalogService::new(
            self.catalog.clone(),
            self.config.catalog.clone(),
            self.config.store.read_failure,
        )
    }

    pub fn lot_service(&self) -> LotService {
        LotService::new(self.intentions.clone(), self.lot_locks.clone())
    }

    pub fn intention_service(&self) -> IntentionService {
        IntentionService::new(
            self.intentions.clone(),
            self.catalog_service(),
            self.lot_service(),
            NotificationService::new(self.mailer.clone(), &self.config.mail),
            self.config.store.read_failure,
        )
    }

    pub fn stats_service(&self) -> StatsService {
        StatsService::new(
            self.catalog.clone(),
            self.intentions.clone(),
            self.config.store.read_failure,
        )
    }

    pub fn auth_service(&self) -> AdminAuthService {
        AdminAuthService::new(&self.config.admin)
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Wine Lots Storefront API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
