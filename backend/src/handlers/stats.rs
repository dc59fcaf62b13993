//! Admin statistics handler

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::stats::AdminStats;
use crate::AppState;

/// Dashboard figures for the admin panel
pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<AdminStats>> {
    let stats = state.stats_service().admin_stats().await?;
    Ok(Json(stats))
}
