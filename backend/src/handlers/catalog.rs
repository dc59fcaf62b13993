//! Catalog handlers: storefront reads and admin case management

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use shared::models::{CaseInput, CaseWithItems, LotCounts};

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogEntry;
use crate::AppState;

/// Active cases for the storefront
pub async fn list_cases(State(state): State<AppState>) -> AppResult<Json<Vec<CatalogEntry>>> {
    let cases = state.catalog_service().list_catalog().await?;
    Ok(Json(cases))
}

/// Lot counters per case slug
pub async fn get_counts(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, LotCounts>>> {
    let counts = state
        .catalog_service()
        .lot_counts(&state.lot_service())
        .await?;
    Ok(Json(counts))
}

/// Every case, including inactive ones
pub async fn admin_list_cases(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CaseWithItems>>> {
    let cases = state.catalog_service().list_all().await?;
    Ok(Json(cases))
}

/// Create a case
pub async fn create_case(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CaseInput>, AppError>,
) -> impl IntoResponse {
    match state.catalog_service().create_case(input).await {
        Ok(case) => (StatusCode::CREATED, Json(case)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace a case and its items
pub async fn update_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    WithRejection(Json(input), _): WithRejection<Json<CaseInput>, AppError>,
) -> AppResult<Json<CaseWithItems>> {
    let case = state.catalog_service().update_case(case_id, input).await?;
    Ok(Json(case))
}

/// Delete a case
pub async fn delete_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.catalog_service().delete_case(case_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
