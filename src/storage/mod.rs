// ============================================================================
// Storage Layer - Postgres Implementation of the Domain Ports
// ============================================================================

mod postgres;

pub use postgres::PgStore;
