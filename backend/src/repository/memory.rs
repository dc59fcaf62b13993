//! In-memory store
//!
//! Backs the `memory` store backend and the test suites. Tables live behind
//! one `tokio::sync::RwLock`; an outage switch makes every call fail with
//! [`StoreError::Unavailable`] so the degrade paths can be exercised.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::models::{
    Case, CaseDraft, CaseItem, CaseWithItems, Intention, IntentionStatus, ItemDraft,
    NewIntention,
};

use super::{CatalogRepository, IntentionRepository, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    cases: Vec<Case>,
    items: Vec<CaseItem>,
    intentions: Vec<Intention>,
}

/// A thread-safe in-memory catalog and intention store
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store becoming unreachable (or reachable again)
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_items(tables: &Tables, case: &Case) -> CaseWithItems {
        let mut items: Vec<CaseItem> = tables
            .items
            .iter()
            .filter(|i| i.case_id == case.id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.display_order);
        CaseWithItems {
            case: case.clone(),
            items,
        }
    }

    fn build_items(case_id: Uuid, items: Vec<ItemDraft>) -> Vec<CaseItem> {
        items
            .into_iter()
            .map(|i| CaseItem {
                id: Uuid::new_v4(),
                case_id,
                name: i.name,
                estate: i.estate,
                unit_price: i.unit_price,
                quantity: i.quantity,
                display_order: i.display_order,
            })
            .collect()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }

    async fn list_cases(&self, active_only: bool) -> StoreResult<Vec<CaseWithItems>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let mut cases: Vec<&Case> = tables
            .cases
            .iter()
            .filter(|c| !active_only || c.active)
            .collect();
        cases.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(cases
            .into_iter()
            .map(|c| Self::with_items(&tables, c))
            .collect())
    }

    async fn find_case_by_slug(&self, slug: &str) -> StoreResult<Option<CaseWithItems>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .cases
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| Self::with_items(&tables, c)))
    }

    async fn create_case(
        &self,
        case: CaseDraft,
        items: Vec<ItemDraft>,
    ) -> StoreResult<CaseWithItems> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.cases.iter().any(|c| c.slug == case.slug) {
            return Err(StoreError::Duplicate("slug".to_string()));
        }

        let now = Utc::now();
        let record = Case {
            id: Uuid::new_v4(),
            slug: case.slug,
            name: case.name,
            region: case.region,
            category: case.category,
            badge: case.badge,
            min_participants: case.min_participants,
            price: case.price,
            active: case.active,
            display_order: case.display_order,
            created_at: now,
            updated_at: now,
        };
        let items = Self::build_items(record.id, items);
        tables.items.extend(items);
        tables.cases.push(record.clone());
        Ok(Self::with_items(&tables, &record))
    }

    async fn update_case(
        &self,
        id: Uuid,
        case: CaseDraft,
        items: Vec<ItemDraft>,
    ) -> StoreResult<Option<CaseWithItems>> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.cases.iter().any(|c| c.slug == case.slug && c.id != id) {
            return Err(StoreError::Duplicate("slug".to_string()));
        }
        let Some(record) = tables.cases.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        record.slug = case.slug;
        record.name = case.name;
        record.region = case.region;
        record.category = case.category;
        record.badge = case.badge;
        record.min_participants = case.min_participants;
        record.price = case.price;
        record.active = case.active;
        record.display_order = case.display_order;
        record.updated_at = Utc::now();
        let record = record.clone();

        tables.items.retain(|i| i.case_id != id);
        tables.items.extend(Self::build_items(id, items));
        Ok(Some(Self::with_items(&tables, &record)))
    }

    async fn delete_case(&self, id: Uuid) -> StoreResult<bool> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let before = tables.cases.len();
        tables.cases.retain(|c| c.id != id);
        tables.items.retain(|i| i.case_id != id);
        Ok(tables.cases.len() < before)
    }
}

#[async_trait]
impl IntentionRepository for InMemoryStore {
    async fn latest_lot_number(
        &self,
        case_slug: &str,
        lot_complete: bool,
    ) -> StoreResult<Option<i32>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .intentions
            .iter()
            .filter(|i| i.case_slug == case_slug && i.lot_complete == lot_complete)
            .map(|i| i.lot_number)
            .max())
    }

    async fn insert_intention(&self, intention: NewIntention) -> StoreResult<Intention> {
        self.check_online()?;
        let record = Intention {
            id: Uuid::new_v4(),
            name: intention.draft.name,
            email: intention.draft.email,
            phone: intention.draft.phone,
            case_slug: intention.draft.case_slug,
            message: intention.draft.message,
            lot_number: intention.lot_number,
            lot_complete: false,
            status: IntentionStatus::Pending,
            created_at: Utc::now(),
        };
        self.tables.write().await.intentions.push(record.clone());
        Ok(record)
    }

    async fn open_lot_members(
        &self,
        case_slug: &str,
        lot_number: i32,
    ) -> StoreResult<Vec<Intention>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .intentions
            .iter()
            .filter(|i| i.case_slug == case_slug && i.lot_number == lot_number && !i.lot_complete)
            .cloned()
            .collect())
    }

    async fn count_open_lot(&self, case_slug: &str, lot_number: i32) -> StoreResult<i64> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .intentions
            .iter()
            .filter(|i| i.case_slug == case_slug && i.lot_number == lot_number && !i.lot_complete)
            .count() as i64)
    }

    async fn close_lot(&self, case_slug: &str, lot_number: i32) -> StoreResult<u64> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for intention in tables
            .intentions
            .iter_mut()
            .filter(|i| i.case_slug == case_slug && i.lot_number == lot_number && !i.lot_complete)
        {
            intention.lot_complete = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_open(&self, case_slug: &str) -> StoreResult<i64> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .intentions
            .iter()
            .filter(|i| i.case_slug == case_slug && !i.lot_complete)
            .count() as i64)
    }

    async fn count_closed_lots(&self, case_slug: &str) -> StoreResult<i64> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let lots: BTreeSet<i32> = tables
            .intentions
            .iter()
            .filter(|i| i.case_slug == case_slug && i.lot_complete)
            .map(|i| i.lot_number)
            .collect();
        Ok(lots.len() as i64)
    }

    async fn list_intentions(&self) -> StoreResult<Vec<Intention>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        // Newest first; insertion order breaks timestamp ties
        let mut intentions: Vec<Intention> = tables.intentions.iter().rev().cloned().collect();
        intentions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(intentions)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: IntentionStatus,
    ) -> StoreResult<Option<Intention>> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .intentions
            .iter_mut()
            .find(|i| i.id == id)
            .map(|i| {
                i.status = status;
                i.clone()
            }))
    }

    async fn delete_intention(&self, id: Uuid) -> StoreResult<bool> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let before = tables.intentions.len();
        tables.intentions.retain(|i| i.id != id);
        Ok(tables.intentions.len() < before)
    }
}
