//! Wine case catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::pricing::{normalize_price, normalize_quantity};
use crate::types::RawAmount;
use crate::ModelError;

/// Minimum participants for a case when the admin leaves it blank
pub const DEFAULT_MIN_PARTICIPANTS: i32 = 3;

/// A purchasable case of wine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: Uuid,
    /// Unique storefront identifier (e.g., "bourgogne-rouge")
    pub slug: String,
    pub name: String,
    pub region: Option<String>,
    pub category: WineCategory,
    /// Short marketing label shown on the card
    pub badge: Option<String>,
    /// Intentions needed to complete a lot; 1 means direct order
    pub min_participants: i32,
    /// Whole-euro price, always derived from the items
    pub price: Decimal,
    pub active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One wine making up part of a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseItem {
    pub id: Uuid,
    pub case_id: Uuid,
    pub name: String,
    /// Producing estate or source label
    pub estate: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub display_order: i32,
}

/// A case together with its items, in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseWithItems {
    #[serde(flatten)]
    pub case: Case,
    pub items: Vec<CaseItem>,
}

/// Wine category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WineCategory {
    #[serde(alias = "rouge")]
    Red,
    #[serde(alias = "blanc")]
    White,
    #[serde(alias = "rosé")]
    Rose,
    Champagne,
}

impl WineCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WineCategory::Red => "red",
            WineCategory::White => "white",
            WineCategory::Rose => "rose",
            WineCategory::Champagne => "champagne",
        }
    }
}

impl std::str::FromStr for WineCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" | "rouge" => Ok(WineCategory::Red),
            "white" | "blanc" => Ok(WineCategory::White),
            "rose" | "rosé" => Ok(WineCategory::Rose),
            "champagne" => Ok(WineCategory::Champagne),
            other => Err(ModelError::UnknownCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for WineCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WineCategory::Red => write!(f, "Rouge"),
            WineCategory::White => write!(f, "Blanc"),
            WineCategory::Rose => write!(f, "Rosé"),
            WineCategory::Champagne => write!(f, "Champagne"),
        }
    }
}

/// Admin input for creating or replacing a case.
///
/// No price field: the price is computed from `items` on every write.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CaseInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom = "crate::validation::validate_slug")]
    pub slug: String,
    pub region: Option<String>,
    pub category: WineCategory,
    pub badge: Option<String>,
    #[serde(alias = "min_personnes", alias = "minPersonnes")]
    pub min_participants: Option<i32>,
    pub active: Option<bool>,
    pub display_order: Option<i32>,
    #[serde(default)]
    #[validate]
    pub items: Vec<ItemInput>,
}

impl CaseInput {
    /// Threshold to store: blank or zero falls back to the default
    pub fn effective_min_participants(&self, default: i32) -> i32 {
        match self.min_participants {
            Some(n) if n > 0 => n,
            _ => default,
        }
    }
}

/// One item line as typed in the admin form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    #[serde(alias = "domaine")]
    pub estate: Option<String>,
    #[serde(alias = "prix")]
    pub price: Option<RawAmount>,
    #[serde(alias = "quantite")]
    pub quantity: Option<RawAmount>,
}

impl ItemInput {
    /// Normalize the line for storage at position `display_order`
    pub fn to_draft(&self, display_order: i32) -> ItemDraft {
        ItemDraft {
            name: self.name.trim().to_string(),
            estate: self
                .estate
                .as_ref()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            unit_price: normalize_price(self.price.as_ref()),
            quantity: normalize_quantity(self.quantity.as_ref()),
            display_order,
        }
    }
}

/// Case fields ready to be written, price already computed
#[derive(Debug, Clone, PartialEq)]
pub struct CaseDraft {
    pub slug: String,
    pub name: String,
    pub region: Option<String>,
    pub category: WineCategory,
    pub badge: Option<String>,
    pub min_participants: i32,
    pub price: Decimal,
    pub active: bool,
    pub display_order: i32,
}

/// Normalized item ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub estate: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub display_order: i32,
}
