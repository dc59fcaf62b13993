//! PostgreSQL store backed by sqlx

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{
    Case, CaseDraft, CaseItem, CaseWithItems, Intention, IntentionStatus, ItemDraft,
    NewIntention,
};

use super::{CatalogRepository, IntentionRepository, StoreResult};

/// Catalog and intention store over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct CaseRow {
    id: Uuid,
    slug: String,
    name: String,
    region: Option<String>,
    category: String,
    badge: Option<String>,
    min_participants: i32,
    price: Decimal,
    active: bool,
    display_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CaseRow> for Case {
    type Error = shared::ModelError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        Ok(Case {
            id: row.id,
            slug: row.slug,
            name: row.name,
            region: row.region,
            category: row.category.parse()?,
            badge: row.badge,
            min_participants: row.min_participants,
            price: row.price,
            active: row.active,
            display_order: row.display_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    case_id: Uuid,
    name: String,
    estate: Option<String>,
    unit_price: Decimal,
    quantity: i32,
    display_order: i32,
}

impl From<ItemRow> for CaseItem {
    fn from(row: ItemRow) -> Self {
        CaseItem {
            id: row.id,
            case_id: row.case_id,
            name: row.name,
            estate: row.estate,
            unit_price: row.unit_price,
            quantity: row.quantity,
            display_order: row.display_order,
        }
    }
}

#[derive(Debug, FromRow)]
struct IntentionRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    case_slug: String,
    message: Option<String>,
    lot_number: i32,
    lot_complete: bool,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IntentionRow> for Intention {
    type Error = shared::ModelError;

    fn try_from(row: IntentionRow) -> Result<Self, Self::Error> {
        Ok(Intention {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            case_slug: row.case_slug,
            message: row.message,
            lot_number: row.lot_number,
            lot_complete: row.lot_complete,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

const CASE_COLUMNS: &str = "id, slug, name, region, category, badge, min_participants, price, \
                            active, display_order, created_at, updated_at";

const INTENTION_COLUMNS: &str = "id, name, email, phone, case_slug, message, lot_number, \
                                 lot_complete, status, created_at";

impl PgStore {
    /// Create a new PgStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn items_for(&self, case_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<CaseItem>>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, case_id, name, estate, unit_price, quantity, display_order
            FROM case_items
            WHERE case_id = ANY($1)
            ORDER BY display_order, name
            "#,
        )
        .bind(case_ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_case: HashMap<Uuid, Vec<CaseItem>> = HashMap::new();
        for row in rows {
            by_case.entry(row.case_id).or_default().push(row.into());
        }
        Ok(by_case)
    }

    async fn attach_items(&self, rows: Vec<CaseRow>) -> StoreResult<Vec<CaseWithItems>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        rows.into_iter()
            .map(|row| -> StoreResult<CaseWithItems> {
                let case = Case::try_from(row)?;
                let case_items = items.remove(&case.id).unwrap_or_default();
                Ok(CaseWithItems {
                    case,
                    items: case_items,
                })
            })
            .collect()
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        case_id: Uuid,
        items: &[ItemDraft],
    ) -> StoreResult<()> {
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO case_items (case_id, name, estate, unit_price, quantity, display_order)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(case_id)
            .bind(&item.name)
            .bind(&item.estate)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.display_order)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list_cases(&self, active_only: bool) -> StoreResult<Vec<CaseWithItems>> {
        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {} FROM cases WHERE ($1 = FALSE OR active = TRUE) ORDER BY display_order, name",
            CASE_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(rows).await
    }

    async fn find_case_by_slug(&self, slug: &str) -> StoreResult<Option<CaseWithItems>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {} FROM cases WHERE slug = $1",
            CASE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_case(
        &self,
        case: CaseDraft,
        items: Vec<ItemDraft>,
    ) -> StoreResult<CaseWithItems> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            INSERT INTO cases (slug, name, region, category, badge, min_participants, price, active, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            CASE_COLUMNS
        ))
        .bind(&case.slug)
        .bind(&case.name)
        .bind(&case.region)
        .bind(case.category.as_str())
        .bind(&case.badge)
        .bind(case.min_participants)
        .bind(case.price)
        .bind(case.active)
        .bind(case.display_order)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_items(&mut tx, row.id, &items).await?;
        tx.commit().await?;

        let case_id = row.id;
        let case = Case::try_from(row)?;
        let mut stored = self.items_for(&[case_id]).await?;
        Ok(CaseWithItems {
            case,
            items: stored.remove(&case_id).unwrap_or_default(),
        })
    }

    async fn update_case(
        &self,
        id: Uuid,
        case: CaseDraft,
        items: Vec<ItemDraft>,
    ) -> StoreResult<Option<CaseWithItems>> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            UPDATE cases
            SET slug = $2, name = $3, region = $4, category = $5, badge = $6,
                min_participants = $7, price = $8, active = $9, display_order = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CASE_COLUMNS
        ))
        .bind(id)
        .bind(&case.slug)
        .bind(&case.name)
        .bind(&case.region)
        .bind(case.category.as_str())
        .bind(&case.badge)
        .bind(case.min_participants)
        .bind(case.price)
        .bind(case.active)
        .bind(case.display_order)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM case_items WHERE case_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_items(&mut tx, id, &items).await?;
        tx.commit().await?;

        Ok(self.attach_items(vec![row]).await?.pop())
    }

    async fn delete_case(&self, id: Uuid) -> StoreResult<bool> {
        // case_items rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IntentionRepository for PgStore {
    async fn latest_lot_number(
        &self,
        case_slug: &str,
        lot_complete: bool,
    ) -> StoreResult<Option<i32>> {
        let latest = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(lot_number) FROM intentions WHERE case_slug = $1 AND lot_complete = $2",
        )
        .bind(case_slug)
        .bind(lot_complete)
        .fetch_one(&self.db)
        .await?;
        Ok(latest)
    }

    async fn insert_intention(&self, intention: NewIntention) -> StoreResult<Intention> {
        let draft = intention.draft;
        let row = sqlx::query_as::<_, IntentionRow>(&format!(
            r#"
            INSERT INTO intentions (name, email, phone, case_slug, message, lot_number, lot_complete, status)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
            RETURNING {}
            "#,
            INTENTION_COLUMNS
        ))
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.case_slug)
        .bind(&draft.message)
        .bind(intention.lot_number)
        .bind(IntentionStatus::Pending.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(Intention::try_from(row)?)
    }

    async fn open_lot_members(
        &self,
        case_slug: &str,
        lot_number: i32,
    ) -> StoreResult<Vec<Intention>> {
        let rows = sqlx::query_as::<_, IntentionRow>(&format!(
            r#"
            SELECT {} FROM intentions
            WHERE case_slug = $1 AND lot_number = $2 AND lot_complete = FALSE
            ORDER BY created_at
            "#,
            INTENTION_COLUMNS
        ))
        .bind(case_slug)
        .bind(lot_number)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| Intention::try_from(r).map_err(Into::into))
            .collect()
    }

    async fn count_open_lot(&self, case_slug: &str, lot_number: i32) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM intentions
            WHERE case_slug = $1 AND lot_number = $2 AND lot_complete = FALSE
            "#,
        )
        .bind(case_slug)
        .bind(lot_number)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn close_lot(&self, case_slug: &str, lot_number: i32) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE intentions SET lot_complete = TRUE
            WHERE case_slug = $1 AND lot_number = $2 AND lot_complete = FALSE
            "#,
        )
        .bind(case_slug)
        .bind(lot_number)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_open(&self, case_slug: &str) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM intentions WHERE case_slug = $1 AND lot_complete = FALSE",
        )
        .bind(case_slug)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn count_closed_lots(&self, case_slug: &str) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT lot_number) FROM intentions
            WHERE case_slug = $1 AND lot_complete = TRUE
            "#,
        )
        .bind(case_slug)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn list_intentions(&self) -> StoreResult<Vec<Intention>> {
        let rows = sqlx::query_as::<_, IntentionRow>(&format!(
            "SELECT {} FROM intentions ORDER BY created_at DESC",
            INTENTION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| Intention::try_from(r).map_err(Into::into))
            .collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: IntentionStatus,
    ) -> StoreResult<Option<Intention>> {
        let row = sqlx::query_as::<_, IntentionRow>(&format!(
            "UPDATE intentions SET status = $2 WHERE id = $1 RETURNING {}",
            INTENTION_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Intention::try_from).transpose()?)
    }

    async fn delete_intention(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM intentions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
