//! Admin statistics and intention export

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use shared::models::{Intention, IntentionStatus};

use crate::config::ReadFailurePolicy;
use crate::error::{read_with_policy, AppError, AppResult};
use crate::repository::{CatalogRepository, IntentionRepository};

/// Statistics service
#[derive(Clone)]
pub struct StatsService {
    cases: Arc<dyn CatalogRepository>,
    intentions: Arc<dyn IntentionRepository>,
    read_policy: ReadFailurePolicy,
}

/// Admin dashboard figures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_intentions: usize,
    /// Distinct closed (case, lot) pairs
    pub completed_lots: usize,
    pub total_cases: usize,
    pub pending_intentions: usize,
    pub paid_intentions: usize,
    /// Current price of each intention's case, summed
    pub revenue: Decimal,
}

/// One row of the intention export
#[derive(Debug, Serialize)]
pub struct IntentionCsvRow {
    pub created_at: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub case: String,
    pub lot_number: i32,
    pub lot_complete: bool,
    pub status: &'static str,
    pub message: String,
}

impl From<&Intention> for IntentionCsvRow {
    fn from(intention: &Intention) -> Self {
        Self {
            created_at: intention.created_at.to_rfc3339(),
            name: intention.name.clone(),
            email: intention.email.clone(),
            phone: intention.phone.clone().unwrap_or_default(),
            case: intention.case_slug.clone(),
            lot_number: intention.lot_number,
            lot_complete: intention.lot_complete,
            status: intention.status.as_str(),
            message: intention.message.clone().unwrap_or_default(),
        }
    }
}

impl StatsService {
    /// Create a new StatsService instance
    pub fn new(
        cases: Arc<dyn CatalogRepository>,
        intentions: Arc<dyn IntentionRepository>,
        read_policy: ReadFailurePolicy,
    ) -> Self {
        Self {
            cases,
            intentions,
            read_policy,
        }
    }

    /// Compute the admin dashboard figures
    pub async fn admin_stats(&self) -> AppResult<AdminStats> {
        let intentions = read_with_policy(
            self.read_policy,
            "stats intentions",
            self.intentions.list_intentions().await,
        )?;
        let cases = read_with_policy(
            self.read_policy,
            "stats cases",
            self.cases.list_cases(false).await,
        )?;

        let prices: HashMap<&str, Decimal> = cases
            .iter()
            .map(|c| (c.case.slug.as_str(), c.case.price))
            .collect();

        Ok(summarize(&intentions, &prices, cases.len()))
    }

    /// Serialize intentions as CSV, one row per intention
    pub fn export_to_csv(intentions: &[Intention]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for intention in intentions {
            wtr.serialize(IntentionCsvRow::from(intention))
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

/// Fold intentions into dashboard figures. Intentions whose case no longer
/// exists count everywhere except revenue.
pub fn summarize(
    intentions: &[Intention],
    prices: &HashMap<&str, Decimal>,
    total_cases: usize,
) -> AdminStats {
    let completed: HashSet<(&str, i32)> = intentions
        .iter()
        .filter(|i| i.lot_complete)
        .map(|i| (i.case_slug.as_str(), i.lot_number))
        .collect();

    AdminStats {
        total_intentions: intentions.len(),
        completed_lots: completed.len(),
        total_cases,
        pending_intentions: intentions
            .iter()
            .filter(|i| i.status == IntentionStatus::Pending)
            .count(),
        paid_intentions: intentions
            .iter()
            .filter(|i| i.status == IntentionStatus::Paid)
            .count(),
        revenue: intentions
            .iter()
            .filter_map(|i| prices.get(i.case_slug.as_str()))
            .copied()
            .sum(),
    }
}
