//! Store access for catalog and intention records
//!
//! Services never hold a database handle directly: they receive these
//! repository traits, so the same engine runs against PostgreSQL in
//! production and an in-memory store in tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared::models::{
    CaseDraft, CaseWithItems, Intention, IntentionStatus, ItemDraft, NewIntention,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Repository-level failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (pool exhausted, connection lost...)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A unique constraint rejected the write
    #[error("duplicate {0}")]
    Duplicate(String),

    /// A stored value could not be decoded into a model
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.constraint().unwrap_or("record").to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

impl From<shared::ModelError> for StoreError {
    fn from(err: shared::ModelError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Case catalog storage
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Cheap round trip used by the health check
    async fn ping(&self) -> StoreResult<()>;

    /// Cases ordered by display order, items ordered within each case
    async fn list_cases(&self, active_only: bool) -> StoreResult<Vec<CaseWithItems>>;

    async fn find_case_by_slug(&self, slug: &str) -> StoreResult<Option<CaseWithItems>>;

    async fn create_case(&self, case: CaseDraft, items: Vec<ItemDraft>)
        -> StoreResult<CaseWithItems>;

    /// Overwrite the case and replace its whole item list.
    /// Returns `None` when no case has this id.
    async fn update_case(
        &self,
        id: Uuid,
        case: CaseDraft,
        items: Vec<ItemDraft>,
    ) -> StoreResult<Option<CaseWithItems>>;

    /// Delete a case and its items. Returns false when nothing was deleted.
    async fn delete_case(&self, id: Uuid) -> StoreResult<bool>;
}

/// Intention storage, including the lot queries used by the lot engine
#[async_trait]
pub trait IntentionRepository: Send + Sync {
    /// Highest lot number among intentions of the case with the given
    /// `lot_complete` flag
    async fn latest_lot_number(&self, case_slug: &str, lot_complete: bool)
        -> StoreResult<Option<i32>>;

    async fn insert_intention(&self, intention: NewIntention) -> StoreResult<Intention>;

    /// Intentions of an open lot, oldest first
    async fn open_lot_members(&self, case_slug: &str, lot_number: i32)
        -> StoreResult<Vec<Intention>>;

    /// Count intentions of an open lot
    async fn count_open_lot(&self, case_slug: &str, lot_number: i32) -> StoreResult<i64>;

    /// Flip `lot_complete` on every open member of the lot in one update.
    /// Returns the number of rows changed.
    async fn close_lot(&self, case_slug: &str, lot_number: i32) -> StoreResult<u64>;

    /// Intentions of the case with `lot_complete = false`
    async fn count_open(&self, case_slug: &str) -> StoreResult<i64>;

    /// Distinct lot numbers of the case with `lot_complete = true`
    async fn count_closed_lots(&self, case_slug: &str) -> StoreResult<i64>;

    /// All intentions, newest first
    async fn list_intentions(&self) -> StoreResult<Vec<Intention>>;

    async fn update_status(&self, id: Uuid, status: IntentionStatus)
        -> StoreResult<Option<Intention>>;

    async fn delete_intention(&self, id: Uuid) -> StoreResult<bool>;
}
