//! Purchase intention and lot models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::ModelError;

/// A non-binding request to buy one unit of a case.
///
/// A submission for several units produces one intention per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intention {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub case_slug: String,
    pub message: Option<String>,
    /// Lot within the case, gapless from 1
    pub lot_number: i32,
    pub lot_complete: bool,
    pub status: IntentionStatus,
    pub created_at: DateTime<Utc>,
}

/// Payment status of an intention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentionStatus {
    #[default]
    Pending,
    Paid,
}

impl IntentionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentionStatus::Pending => "pending",
            IntentionStatus::Paid => "paid",
        }
    }
}

impl std::str::FromStr for IntentionStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(IntentionStatus::Pending),
            "paid" => Ok(IntentionStatus::Paid),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// Contact details shared by every unit of one submission
#[derive(Debug, Clone, PartialEq)]
pub struct IntentionDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub case_slug: String,
    pub message: Option<String>,
}

/// A new row for the intention store
#[derive(Debug, Clone, PartialEq)]
pub struct NewIntention {
    pub draft: IntentionDraft,
    pub lot_number: i32,
}

/// Storefront submission form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitIntentionInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(max = 40, message = "Phone number is too long"))]
    pub phone: Option<String>,
    /// Requested quantity per case slug
    #[serde(default, alias = "cartons")]
    #[validate(custom = "crate::validation::validate_case_quantities")]
    pub cases: BTreeMap<String, i64>,
    #[validate(length(max = 2000, message = "Message is too long"))]
    pub message: Option<String>,
}

impl SubmitIntentionInput {
    /// Case slugs with a positive quantity, in slug order
    pub fn selected_cases(&self) -> Vec<(String, u32)> {
        self.cases
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(slug, qty)| (slug.clone(), u32::try_from(*qty).unwrap_or(u32::MAX)))
            .collect()
    }

    /// Contact details for one unit of `case_slug`
    pub fn draft_for(&self, case_slug: &str) -> IntentionDraft {
        IntentionDraft {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_blank(self.phone.as_deref()),
            case_slug: case_slug.to_string(),
            message: non_blank(self.message.as_deref()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lot counters for one case, as served by the counts endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotCounts {
    /// Size of the lot currently forming
    pub current: i64,
    #[serde(rename = "completeLots")]
    pub complete_lots: i64,
    #[serde(rename = "minPersonnes")]
    pub min_participants: i32,
}
