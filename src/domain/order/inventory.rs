use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::PlaceOrderError;
use super::value_objects::OrderItemRequest;
use crate::domain::ports::CatalogEntry;

// ============================================================================
// Inventory Ledger - Availability Check & Stock Decrements
// ============================================================================
//
// Two phases:
// 1. `check_availability` validates requested quantities against the
//    catalog snapshot before anything is written. It fails fast on the
//    FIRST insufficient item in request order.
// 2. The decrements produced by `decrements_for` are applied by the
//    order writer inside the commit transaction with a conditional
//    UPDATE, which re-verifies stock and catches races the snapshot
//    check cannot see.
//
// Quantities for a product repeated across items are aggregated so the
// combined demand is what gets checked and decremented.
//
// ============================================================================

/// One stock subtraction to apply at commit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDecrement {
    pub product_id: i64,
    pub quantity: i32,
}

/// Aggregate requested quantities per product, preserving first-seen order
pub fn decrements_for(items: &[OrderItemRequest]) -> Vec<StockDecrement> {
    let mut order: Vec<i64> = Vec::new();
    let mut totals: HashMap<i64, i32> = HashMap::new();

    for item in items {
        if !totals.contains_key(&item.product_id) {
            order.push(item.product_id);
        }
        *totals.entry(item.product_id).or_insert(0) += item.quantity;
    }

    order
        .into_iter()
        .map(|product_id| StockDecrement {
            product_id,
            quantity: totals[&product_id],
        })
        .collect()
}

/// Verify that every requested quantity fits in current stock.
/// Deterministic: reports the first offending product in request order.
pub fn check_availability(
    items: &[OrderItemRequest],
    catalog: &HashMap<i64, CatalogEntry>,
) -> Result<(), PlaceOrderError> {
    for decrement in decrements_for(items) {
        let entry = catalog
            .get(&decrement.product_id)
            .ok_or(PlaceOrderError::UnknownProduct(decrement.product_id))?;

        if entry.stock_quantity < decrement.quantity {
            return Err(PlaceOrderError::InsufficientStock {
                product_id: decrement.product_id,
                requested: decrement.quantity,
                available: entry.stock_quantity,
            });
        }
    }

    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
