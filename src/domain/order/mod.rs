// ============================================================================
// Order Domain - Atomic Order Placement
// ============================================================================
//
// This module contains ALL order-specific code:
// - Value objects (PlaceOrderRequest, OrderStatus)
// - Errors (PlaceOrderError, PricingError)
// - Pricing engine (line-item and order-level totals)
// - Inventory availability check and stock decrements
// - Aggregate (Order, OrderItem, OrderDraft)
// - Placement orchestrator (OrderPlacementService)
//
// The placement workflow is the only part of the system with real
// invariants: captured pricing snapshots, non-negative stock, and
// all-or-nothing persistence.
//
// ============================================================================

pub mod aggregate;
pub mod errors;
pub mod inventory;
pub mod placement;
pub mod pricing;
pub mod value_objects;

// Re-export for convenience
pub use aggregate::*;
pub use errors::*;
pub use placement::*;
pub use pricing::*;
pub use value_objects::*;
