//! Catalog service for wine cases
//!
//! Prices are never taken from the caller: every create or update
//! recomputes the case price from the submitted item list.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use shared::models::{CaseDraft, CaseInput, CaseWithItems, ItemDraft, LotCounts, WineCategory};
use shared::pricing::{compute_price, price_per_bottle, MAX_CASE_PRICE};
use shared::types::format_euros;
use shared::validation::validate_min_participants;

use crate::config::{CatalogConfig, ReadFailurePolicy};
use crate::error::{read_with_policy, AppError, AppResult};
use crate::repository::CatalogRepository;
use crate::services::lot::LotService;

/// Catalog service for storefront reads and admin writes
#[derive(Clone)]
pub struct CatalogService {
    cases: Arc<dyn CatalogRepository>,
    config: CatalogConfig,
    read_policy: ReadFailurePolicy,
}

/// A case as shown on the storefront
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub slug: String,
    pub name: String,
    pub region: Option<String>,
    pub category: WineCategory,
    pub badge: Option<String>,
    pub min_participants: i32,
    pub price: Decimal,
    /// e.g. "12.50€"
    pub price_per_bottle: String,
    pub items: Vec<CatalogItem>,
}

/// An item line on the storefront
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,
    pub estate: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(
        cases: Arc<dyn CatalogRepository>,
        config: CatalogConfig,
        read_policy: ReadFailurePolicy,
    ) -> Self {
        Self {
            cases,
            config,
            read_policy,
        }
    }

    /// Active cases for the storefront, in display order
    pub async fn list_catalog(&self) -> AppResult<Vec<CatalogEntry>> {
        let cases = read_with_policy(
            self.read_policy,
            "catalog",
            self.cases.list_cases(true).await,
        )?;

        Ok(cases.into_iter().map(|c| self.to_entry(c)).collect())
    }

    /// Lot counters of every active case, keyed by slug
    pub async fn lot_counts(&self, lots: &LotService) -> AppResult<BTreeMap<String, LotCounts>> {
        let cases = read_with_policy(
            self.read_policy,
            "lot counts",
            self.cases.list_cases(true).await,
        )?;

        let mut counts = BTreeMap::new();
        for CaseWithItems { case, .. } in cases {
            let progress = lots.count_open_and_closed(&case.slug, self.read_policy).await?;
            counts.insert(
                case.slug,
                LotCounts {
                    current: progress.open_count,
                    complete_lots: progress.closed_lot_count,
                    min_participants: case.min_participants,
                },
            );
        }
        Ok(counts)
    }

    /// Every case, active or not, for the admin panel
    pub async fn list_all(&self) -> AppResult<Vec<CaseWithItems>> {
        read_with_policy(
            self.read_policy,
            "admin catalog",
            self.cases.list_cases(false).await,
        )
    }

    /// Find a case that can currently be ordered
    pub async fn find_active(&self, slug: &str) -> AppResult<Option<CaseWithItems>> {
        let found = self.cases.find_case_by_slug(slug).await?;
        Ok(found.filter(|c| c.case.active))
    }

    /// Create a case; the price is computed from `input.items`
    pub async fn create_case(&self, input: CaseInput) -> AppResult<CaseWithItems> {
        let (draft, items) = self.prepare(input)?;
        let created = self.cases.create_case(draft, items).await?;

        tracing::info!(case_slug = %created.case.slug, price = %created.case.price, "Case created");
        Ok(created)
    }

    /// Replace a case and its whole item list; the price is recomputed
    pub async fn update_case(&self, id: Uuid, input: CaseInput) -> AppResult<CaseWithItems> {
        let (draft, items) = self.prepare(input)?;
        let updated = self
            .cases
            .update_case(id, draft, items)
            .await?
            .ok_or_else(|| AppError::NotFound("Case".to_string()))?;

        tracing::info!(case_slug = %updated.case.slug, price = %updated.case.price, "Case updated");
        Ok(updated)
    }

    /// Delete a case together with its items
    pub async fn delete_case(&self, id: Uuid) -> AppResult<()> {
        if !self.cases.delete_case(id).await? {
            return Err(AppError::NotFound("Case".to_string()));
        }
        tracing::info!(case_id = %id, "Case deleted");
        Ok(())
    }

    fn prepare(&self, input: CaseInput) -> AppResult<(CaseDraft, Vec<ItemDraft>)> {
        input.validate()?;

        if let Some(min) = input.min_participants.filter(|m| *m != 0) {
            validate_min_participants(min).map_err(|msg| AppError::Validation {
                field: "minParticipants".to_string(),
                message: msg.to_string(),
                message_fr: "Le nombre minimum de participants doit être au moins 1".to_string(),
            })?;
        }

        let price = compute_price(&input.items);
        if price > MAX_CASE_PRICE {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Case price is too large".to_string(),
                message_fr: "Le prix de la caisse est trop élevé".to_string(),
            });
        }
        let items: Vec<ItemDraft> = input
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| item.to_draft(i as i32))
            .collect();

        let draft = CaseDraft {
            min_participants: input.effective_min_participants(self.config.default_min_participants),
            slug: input.slug,
            name: input.name.trim().to_string(),
            region: input.region,
            category: input.category,
            badge: input.badge,
            price,
            active: input.active.unwrap_or(true),
            display_order: input.display_order.unwrap_or(0),
        };

        Ok((draft, items))
    }

    fn to_entry(&self, with_items: CaseWithItems) -> CatalogEntry {
        let CaseWithItems { case, items } = with_items;
        CatalogEntry {
            price_per_bottle: format_euros(price_per_bottle(case.price, self.config.bottles_per_case)),
            slug: case.slug,
            name: case.name,
            region: case.region,
            category: case.category,
            badge: case.badge,
            min_participants: case.min_participants,
            price: case.price,
            items: items
                .into_iter()
                .map(|i| CatalogItem {
                    name: i.name,
                    estate: i.estate,
                    unit_price: i.unit_price,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}
