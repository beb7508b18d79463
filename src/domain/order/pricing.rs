use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::PricingError;
use super::value_objects::OrderItemRequest;
use crate::domain::ports::CatalogEntry;

// ============================================================================
// Pricing Engine - Pure Computation
// ============================================================================
//
// Computes per-item pricing and order-level totals from a catalog snapshot
// and the customer's membership discount. No I/O happens here; all
// arithmetic is decimal (never binary floating point) and every money
// field is rounded to 2 decimal places with banker's rounding.
//
// Invariants enforced:
//   item.total_price   = (price - unit_discount) * quantity
//   totals.amount      = sum of item totals
//   order_discount     = amount * membership_pct / 100
//   delivery_charge    = flat amount when enabled and amount < threshold
//   total_amount       = amount - order_discount + delivery_charge
//
// ============================================================================

const MONEY_DP: u32 = 2;

/// Round a money value to 2 decimal places (banker's rounding)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_DP)
}

/// Delivery-charge policy, loaded once at process start and read-only
/// thereafter. A flat fee applies unless the order subtotal reaches the
/// free-delivery threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryChargePolicy {
    pub enabled: bool,
    pub flat_amount: Decimal,
    pub free_threshold: Decimal,
}

/// Captured pricing snapshot for one line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedItem {
    pub product_id: i64,
    pub quantity: i32,
    /// Unit price at order time
    pub product_price: Decimal,
    /// Product-level discount for the whole line
    pub discount: Decimal,
    /// Line total after the product-level discount
    pub total_price: Decimal,
}

/// Order-level monetary fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub amount: Decimal,
    pub order_discount: Decimal,
    pub delivery_charge: Decimal,
    pub total_amount: Decimal,
}

/// Price every requested item against the catalog snapshot.
/// Captured values are snapshots at order time; later catalog changes
/// must not retroactively affect them.
pub fn price_items(
    items: &[OrderItemRequest],
    catalog: &HashMap<i64, CatalogEntry>,
) -> Result<Vec<PricedItem>, PricingError> {
    let mut priced = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity <= 0 {
            return Err(PricingError::InvalidQuantity(item.quantity));
        }

        let entry = catalog
            .get(&item.product_id)
            .ok_or(PricingError::UnknownProduct(item.product_id))?;

        let quantity = Decimal::from(item.quantity);
        let unit_discount = entry
            .discount_percentage
            .map(|pct| entry.price * pct / Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO);

        priced.push(PricedItem {
            product_id: item.product_id,
            quantity: item.quantity,
            product_price: entry.price,
            discount: round_money(unit_discount * quantity),
            total_price: round_money((entry.price - unit_discount) * quantity),
        });
    }

    Ok(priced)
}

/// Apply the order-level invariants: subtotal, membership discount,
/// conditional delivery charge and final total.
pub fn compute_order_totals(
    priced: &[PricedItem],
    membership_discount_pct: Decimal,
    policy: &DeliveryChargePolicy,
) -> OrderTotals {
    let amount: Decimal = priced.iter().map(|p| p.total_price).sum();
    let amount = round_money(amount);

    let order_discount = round_money(amount * membership_discount_pct / Decimal::ONE_HUNDRED);

    let delivery_charge = if policy.enabled && amount < policy.free_threshold {
        policy.flat_amount
    } else {
        Decimal::ZERO
    };

    OrderTotals {
        amount,
        order_discount,
        delivery_charge,
        total_amount: round_money(amount - order_discount + delivery_charge),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
