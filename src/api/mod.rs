// ============================================================================
// API Layer - HTTP Transport (thin plumbing)
// ============================================================================
//
// Maps JSON requests onto the placement workflow and domain errors onto
// HTTP statuses. The core returns plain aggregates; all external-facing
// shaping happens here.
//
// ============================================================================

pub mod orders;

use std::sync::Arc;

use actix_web::web;

use crate::domain::order::placement::OrderPlacementService;
use crate::domain::ports::OrderReader;
use crate::metrics::Metrics;

pub struct AppState {
    pub placement: OrderPlacementService,
    pub orders: Arc<dyn OrderReader>,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/orders", web::post().to(orders::create_order))
        .route("/api/orders/{id}", web::get().to(orders::get_order_by_id))
        .route(
            "/api/customers/{id}/orders",
            web::get().to(orders::get_orders_by_customer),
        );
}
