// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// This module contains the order-management domain:
// - Customer, Address, MembershipTier models
// - Order aggregate with captured line-item pricing
// - Pricing engine (pure decimal arithmetic)
// - Inventory availability checks
// - Order placement orchestration
// - Storage ports (traits implemented by the storage layer)
//
// This layer performs no I/O of its own; all reads and writes go through
// the port traits in `ports`.
//
// ============================================================================

pub mod customer;
pub mod order;
pub mod ports;
