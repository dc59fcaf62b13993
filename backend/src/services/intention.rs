//! Intention service: storefront submissions and admin management

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::models::{CaseWithItems, Intention, IntentionStatus, SubmitIntentionInput};

use crate::config::ReadFailurePolicy;
use crate::error::{read_with_policy, AppError, AppResult};
use crate::repository::IntentionRepository;
use crate::services::catalog::CatalogService;
use crate::services::lot::{ClosedLot, LotCase, LotService};
use crate::services::notification::{
    NotificationService, RecapLine, SubmissionSummary, UnitProgress,
};

/// Intention service
#[derive(Clone)]
pub struct IntentionService {
    intentions: Arc<dyn IntentionRepository>,
    catalog: CatalogService,
    lots: LotService,
    notifications: NotificationService,
    read_policy: ReadFailurePolicy,
}

/// Where one requested unit landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitResult {
    #[serde(rename = "case")]
    pub case_slug: String,
    pub lot_number: i32,
    pub count: i64,
    /// 1-based position of the unit within its case
    pub unit: u32,
}

/// Response to a submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    pub results: Vec<UnitResult>,
    pub lots_completed: usize,
    #[serde(skip)]
    pub closed_lots: Vec<ClosedLot>,
}

/// Admin update of an intention
#[derive(Debug, Deserialize)]
pub struct UpdateIntentionInput {
    pub status: IntentionStatus,
}

impl IntentionService {
    /// Create a new IntentionService instance
    pub fn new(
        intentions: Arc<dyn IntentionRepository>,
        catalog: CatalogService,
        lots: LotService,
        notifications: NotificationService,
        read_policy: ReadFailurePolicy,
    ) -> Self {
        Self {
            intentions,
            catalog,
            lots,
            notifications,
            read_policy,
        }
    }

    /// Record a submission.
    ///
    /// Units are processed one at a time, case by case, each one fully
    /// assigned (and possibly closing its lot) before the next. Emails go
    /// out afterwards; their failures never undo what was recorded. If a
    /// unit fails to record, lots closed by earlier units are still
    /// announced before the error is returned.
    pub async fn submit(&self, input: SubmitIntentionInput) -> AppResult<SubmissionOutcome> {
        input.validate()?;

        let selected = input.selected_cases();
        if selected.is_empty() {
            return Err(AppError::Validation {
                field: "cases".to_string(),
                message: "No case selected".to_string(),
                message_fr: "Aucune caisse sélectionnée".to_string(),
            });
        }

        // Resolve every case before writing anything
        let mut cases: Vec<(CaseWithItems, u32)> = Vec::with_capacity(selected.len());
        for (slug, quantity) in selected {
            let case = self
                .catalog
                .find_active(&slug)
                .await?
                .ok_or(AppError::UnknownCase(slug))?;
            cases.push((case, quantity));
        }

        let mut results = Vec::new();
        let mut units = Vec::new();
        let mut closed_lots = Vec::new();
        let mut failure = None;

        'cases: for (with_items, quantity) in &cases {
            let lot_case = LotCase::from(&with_items.case);
            for unit in 1..=*quantity {
                let outcome = match self
                    .lots
                    .record_unit(&lot_case, input.draft_for(&lot_case.slug))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        failure = Some(err);
                        break 'cases;
                    }
                };

                results.push(UnitResult {
                    case_slug: lot_case.slug.clone(),
                    lot_number: outcome.assignment.lot_number,
                    count: outcome.assignment.current_count,
                    unit,
                });
                units.push(UnitProgress {
                    case_slug: lot_case.slug.clone(),
                    unit,
                    lot_number: outcome.assignment.lot_number,
                    count: outcome.assignment.current_count,
                    min_participants: lot_case.min_participants,
                });
                closed_lots.extend(outcome.closed);
            }
        }

        // A lot closes only once: announce it even if a later unit failed
        for lot in &closed_lots {
            self.notifications.notify_lot_completed(lot).await;
        }

        if let Some(err) = failure {
            tracing::error!(
                email = %input.email,
                units_recorded = results.len(),
                lots_completed = closed_lots.len(),
                error = %err,
                "Submission interrupted"
            );
            return Err(err);
        }

        tracing::info!(
            email = %input.email,
            units = results.len(),
            lots_completed = closed_lots.len(),
            "Submission recorded"
        );

        let draft = input.draft_for("");
        let summary = SubmissionSummary {
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            message: draft.message,
            recap: cases
                .iter()
                .map(|(c, quantity)| RecapLine {
                    case_name: c.case.name.clone(),
                    quantity: *quantity,
                    unit_price: c.case.price,
                })
                .collect(),
            units,
            lots_completed: closed_lots.len(),
        };
        self.notifications.send_confirmation(&summary).await;
        self.notifications.send_operator_summary(&summary).await;

        Ok(SubmissionOutcome {
            success: true,
            lots_completed: closed_lots.len(),
            results,
            closed_lots,
        })
    }

    /// All intentions, newest first
    pub async fn list(&self) -> AppResult<Vec<Intention>> {
        read_with_policy(
            self.read_policy,
            "intentions",
            self.intentions.list_intentions().await,
        )
    }

    /// Change the payment status of an intention
    pub async fn update(&self, id: Uuid, input: UpdateIntentionInput) -> AppResult<Intention> {
        let updated = self
            .intentions
            .update_status(id, input.status)
            .await?
            .ok_or_else(|| AppError::NotFound("Intention".to_string()))?;

        tracing::info!(intention_id = %id, status = updated.status.as_str(), "Intention updated");
        Ok(updated)
    }

    /// Delete an intention
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.intentions.delete_intention(id).await? {
            return Err(AppError::NotFound("Intention".to_string()));
        }
        tracing::info!(intention_id = %id, "Intention deleted");
        Ok(())
    }
}
