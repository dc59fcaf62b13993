//! Lot assignment and completion
//!
//! Every requested unit of a case becomes one intention placed in the case's
//! open lot. A lot closes the moment its open member count reaches the
//! case's `min_participants`; the next unit then opens lot `n + 1`.
//! Lot numbers per case are gapless from 1 and at most one lot per case is
//! open at any time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use shared::models::{Case, Intention, IntentionDraft, NewIntention};
use shared::types::LotProgress;

use crate::config::ReadFailurePolicy;
use crate::error::{read_with_policy, AppResult};
use crate::repository::{IntentionRepository, StoreResult};

/// Per-case serialization point for lot bookkeeping.
///
/// The assign/count/close sequence is several store round trips; holding the
/// case's lock across them keeps two submissions for the same case from
/// both joining a lot that only one of them should have closed.
#[derive(Clone, Default)]
pub struct LotLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the lots of `case_slug`
    pub async fn lock(&self, case_slug: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(case_slug.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }
}

/// The case fields the lot engine needs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotCase {
    pub slug: String,
    pub name: String,
    pub price: Decimal,
    pub min_participants: i32,
}

impl From<&Case> for LotCase {
    fn from(case: &Case) -> Self {
        Self {
            slug: case.slug.clone(),
            name: case.name.clone(),
            price: case.price,
            min_participants: case.min_participants,
        }
    }
}

/// Where one unit landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotAssignment {
    pub lot_number: i32,
    /// Open members of the lot after this unit was added
    pub current_count: i64,
}

/// A lot that just reached its threshold
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedLot {
    pub case: LotCase,
    pub lot_number: i32,
    pub participants: Vec<Intention>,
}

/// Outcome of recording one requested unit
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub assignment: LotAssignment,
    pub closed: Option<ClosedLot>,
}

/// Lot engine over an intention store
#[derive(Clone)]
pub struct LotService {
    intentions: Arc<dyn IntentionRepository>,
    locks: LotLocks,
}

impl LotService {
    /// Create a new LotService instance
    pub fn new(intentions: Arc<dyn IntentionRepository>, locks: LotLocks) -> Self {
        Self { intentions, locks }
    }

    /// Record one unit: assign it to the open lot and close the lot if the
    /// threshold is reached, all under the case's lock
    pub async fn record_unit(&self, case: &LotCase, draft: IntentionDraft) -> AppResult<UnitOutcome> {
        let _guard = self.locks.lock(&case.slug).await;

        let assignment = self.assign_to_lot(draft).await?;
        let closed = self
            .check_and_close_lot(case, assignment.lot_number, assignment.current_count)
            .await?;

        Ok(UnitOutcome { assignment, closed })
    }

    /// Lot number the next unit of `case_slug` belongs to
    pub async fn target_lot_number(&self, case_slug: &str) -> StoreResult<i32> {
        if let Some(open) = self.intentions.latest_lot_number(case_slug, false).await? {
            return Ok(open);
        }
        let last_closed = self.intentions.latest_lot_number(case_slug, true).await?;
        Ok(last_closed.map_or(1, |n| n + 1))
    }

    /// Insert an intention for one unit into the case's open lot, opening a
    /// new lot when none is open. Insertion failures propagate.
    pub async fn assign_to_lot(&self, draft: IntentionDraft) -> AppResult<LotAssignment> {
        let case_slug = draft.case_slug.clone();
        let lot_number = self.target_lot_number(&case_slug).await?;

        self.intentions
            .insert_intention(NewIntention { draft, lot_number })
            .await?;

        let current_count = self.intentions.count_open_lot(&case_slug, lot_number).await?;

        tracing::debug!(
            case_slug = %case_slug,
            lot_number,
            count = current_count,
            "Intention assigned to lot"
        );

        Ok(LotAssignment {
            lot_number,
            current_count,
        })
    }

    /// Close the lot when `current_count` has reached the case threshold.
    ///
    /// Returns the lot's members as they were just before closing, for
    /// notification. A threshold of 1 closes every lot on its first unit.
    pub async fn check_and_close_lot(
        &self,
        case: &LotCase,
        lot_number: i32,
        current_count: i64,
    ) -> AppResult<Option<ClosedLot>> {
        let min_participants = case.min_participants.max(1);
        if current_count < i64::from(min_participants) {
            return Ok(None);
        }

        let participants = self.intentions.open_lot_members(&case.slug, lot_number).await?;
        let closed = self.intentions.close_lot(&case.slug, lot_number).await?;

        tracing::info!(
            case_slug = %case.slug,
            lot_number,
            count = closed,
            min_participants,
            "Lot complete"
        );

        Ok(Some(ClosedLot {
            case: case.clone(),
            lot_number,
            participants,
        }))
    }

    /// Progress of the case's lots for display. Store failures follow the
    /// read-failure policy.
    pub async fn count_open_and_closed(
        &self,
        case_slug: &str,
        policy: ReadFailurePolicy,
    ) -> AppResult<LotProgress> {
        let result = self.load_progress(case_slug).await;
        read_with_policy(policy, "lot progress", result)
    }

    async fn load_progress(&self, case_slug: &str) -> StoreResult<LotProgress> {
        let open_count = self.intentions.count_open(case_slug).await?;
        let closed_lot_count = self.intentions.count_closed_lots(case_slug).await?;
        Ok(LotProgress {
            open_count,
            closed_lot_count,
        })
    }
}
