//! Route definitions for the wine lots storefront

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::admin_auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Storefront routes (public)
        .route("/cases", get(handlers::list_cases))
        .route("/counts", get(handlers::get_counts))
        .route("/intentions", post(handlers::submit_intention))
        // Admin session (public)
        .route(
            "/admin/auth",
            post(handlers::login)
                .get(handlers::session_status)
                .delete(handlers::logout),
        )
        // Protected routes - admin panel
        .nest("/admin", admin_routes(state))
}

/// Admin panel routes (protected)
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/cases",
            get(handlers::admin_list_cases).post(handlers::create_case),
        )
        .route(
            "/cases/:case_id",
            put(handlers::update_case).delete(handlers::delete_case),
        )
        .route("/intentions", get(handlers::list_intentions))
        .route(
            "/intentions/:intention_id",
            put(handlers::update_intention).delete(handlers::delete_intention),
        )
        .route("/stats", get(handlers::get_stats))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
