use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::customer::Customer;
use super::order::aggregate::{Order, OrderDraft};
use super::order::inventory::StockDecrement;

// ============================================================================
// Storage Ports
// ============================================================================
//
// Narrow interfaces the placement workflow consumes. The production
// implementation lives in `storage::PgStore`; tests substitute in-memory
// implementations. The writer is the only mutating port and executes the
// whole commit (order row, item rows, stock decrements) inside one
// database transaction.
//
// ============================================================================

/// Point-in-time product projection used by one placement attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub price: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub stock_quantity: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("storage error: {0}")]
    Other(String),
}

/// Failures surfaced by the transactional commit. Stock conflicts are
/// detected here a second time because the pre-commit availability check
/// runs on an unlocked snapshot and can lose a race.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("product {0} no longer exists")]
    ProductVanished(i64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for CommitError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StorageError::Database(err))
    }
}

#[async_trait]
pub trait CustomerReader: Send + Sync {
    /// Fetch an active customer together with their membership tier and
    /// addresses. Inactive or unknown customers come back as `None`.
    async fn fetch_active_with_addresses(&self, id: i64) -> Result<Option<Customer>, StorageError>;
}

#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Fetch the catalog projection for the given product ids. Unknown ids
    /// are simply absent from the result.
    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<CatalogEntry>, StorageError>;
}

#[async_trait]
pub trait OrderWriter: Send + Sync {
    /// Persist the order, its items and the stock decrements as a single
    /// durable commit. Any failure rolls back everything.
    async fn commit_order(
        &self,
        draft: OrderDraft,
        decrements: Vec<StockDecrement>,
    ) -> Result<Order, CommitError>;
}

#[async_trait]
pub trait OrderReader: Send + Sync {
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StorageError>;

    async fn fetch_orders_by_customer(&self, customer_id: i64)
        -> Result<Vec<Order>, StorageError>;
}
