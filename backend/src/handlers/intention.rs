//! Intention handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Intention, SubmitIntentionInput};

use crate::error::{AppError, AppResult};
use crate::services::intention::{SubmissionOutcome, UpdateIntentionInput};
use crate::services::StatsService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub format: Option<String>, // "json" or "csv"
}

/// Register a purchase intention
pub async fn submit_intention(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<SubmitIntentionInput>, AppError>,
) -> AppResult<Json<SubmissionOutcome>> {
    let outcome = state.intention_service().submit(input).await?;
    Ok(Json(outcome))
}

/// List intentions, newest first, as JSON or CSV
pub async fn list_intentions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Response> {
    let intentions = state.intention_service().list().await?;

    if query.format.as_deref() == Some("csv") {
        let csv = StatsService::export_to_csv(&intentions)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"intentions.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(intentions).into_response())
    }
}

/// Change an intention's payment status
pub async fn update_intention(
    State(state): State<AppState>,
    Path(intention_id): Path<Uuid>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateIntentionInput>, AppError>,
) -> AppResult<Json<Intention>> {
    let intention = state.intention_service().update(intention_id, input).await?;
    Ok(Json(intention))
}

/// Delete an intention
pub async fn delete_intention(
    State(state): State<AppState>,
    Path(intention_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.intention_service().delete(intention_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
