use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Customer Model
// ============================================================================
//
// Customers, their addresses and their membership tier are read-only inside
// the order-placement workflow. The tier carries the order-level discount
// percentage; the addresses are checked to confirm the chosen shipping
// address really belongs to the ordering customer.
//
// ============================================================================

/// Loyalty tier granting a percentage discount on the order subtotal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipTier {
    pub id: i64,
    pub tier_name: String,
    pub discount_percentage: Decimal,
}

/// Shipping address owned by a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub customer_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub membership_tier: Option<MembershipTier>,
    pub addresses: Vec<Address>,
}

impl Customer {
    /// Look up one of the customer's own addresses by id
    pub fn address(&self, address_id: i64) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == address_id)
    }

    /// Order-level discount percentage from the membership tier.
    /// A customer without a tier gets no discount.
    pub fn membership_discount(&self) -> Decimal {
        self.membership_tier
            .as_ref()
            .map(|t| t.discount_percentage)
            .unwrap_or(Decimal::ZERO)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
