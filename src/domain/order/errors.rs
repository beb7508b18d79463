use crate::domain::ports::{CommitError, StorageError};

// ============================================================================
// Order Placement Errors
// ============================================================================
//
// Every failure of the placement workflow maps to exactly one of these
// kinds; nothing is silently recovered or retried. The API layer maps
// them to HTTP statuses, the metrics layer uses `kind()` as a label.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PlaceOrderError {
    #[error("invalid order request: {0}")]
    InvalidRequest(String),

    #[error("customer {0} not found or inactive")]
    CustomerNotFoundOrInactive(i64),

    #[error("shipping address {address_id} is invalid or does not belong to customer {customer_id}")]
    InvalidShippingAddress { address_id: i64, customer_id: i64 },

    #[error("unknown product: {0}")]
    UnknownProduct(i64),

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("product {0} no longer exists")]
    ProductVanished(i64),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl PlaceOrderError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PlaceOrderError::InvalidRequest(_) => "invalid_request",
            PlaceOrderError::CustomerNotFoundOrInactive(_) => "customer_not_found",
            PlaceOrderError::InvalidShippingAddress { .. } => "invalid_shipping_address",
            PlaceOrderError::UnknownProduct(_) => "unknown_product",
            PlaceOrderError::InsufficientStock { .. } => "insufficient_stock",
            PlaceOrderError::ProductVanished(_) => "product_vanished",
            PlaceOrderError::Storage(_) => "storage",
        }
    }
}

impl From<CommitError> for PlaceOrderError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::InsufficientStock {
                product_id,
                requested,
                available,
            } => PlaceOrderError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            CommitError::ProductVanished(id) => PlaceOrderError::ProductVanished(id),
            CommitError::Storage(e) => PlaceOrderError::Storage(e),
        }
    }
}

/// Errors from the pure pricing engine
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("unknown product: {0}")]
    UnknownProduct(i64),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(i32),
}

impl From<PricingError> for PlaceOrderError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::UnknownProduct(id) => PlaceOrderError::UnknownProduct(id),
            PricingError::InvalidQuantity(q) => {
                PlaceOrderError::InvalidRequest(format!("invalid quantity: {}", q))
            }
        }
    }
}
