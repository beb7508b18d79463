use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pricing::{OrderTotals, PricedItem};
use super::value_objects::OrderStatus;

// ============================================================================
// Order Aggregate
// ============================================================================
//
// An order is created exactly once by the placement workflow and its line
// items are immutable thereafter. Item pricing fields are snapshots taken
// at order time, never recomputed from the live catalog.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,

    // Computed monetary fields
    pub amount: Decimal,
    pub order_discount: Decimal,
    pub delivery_charge: Decimal,
    pub total_amount: Decimal,

    pub customer_id: i64,
    pub shipping_address_id: i64,
    pub items: Vec<OrderItem>,

    // Fulfillment fields, set later in the order's life
    pub shipped_date: Option<DateTime<Utc>>,
    pub tracking: Option<TrackingDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub product_price: Decimal,
    pub discount: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingDetail {
    pub id: i64,
    pub order_id: i64,
    pub carrier: String,
    pub tracking_number: Option<String>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

/// A fully-priced order that has not been persisted yet. The writer turns
/// this into an `Order` with generated identities inside one transaction.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub customer_id: i64,
    pub shipping_address_id: i64,
    pub items: Vec<PricedItem>,
    pub totals: OrderTotals,
}

impl OrderDraft {
    pub fn new(
        customer_id: i64,
        shipping_address_id: i64,
        items: Vec<PricedItem>,
        totals: OrderTotals,
    ) -> Self {
        Self {
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            customer_id,
            shipping_address_id,
            items,
            totals,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
