use std::time::Instant;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::order::aggregate::{Order, OrderItem};
use crate::domain::order::errors::PlaceOrderError;
use crate::domain::order::value_objects::{OrderItemRequest, PlaceOrderRequest};

// ============================================================================
// Order Endpoints
// ============================================================================

// ---------------------------
// Request / Response DTOs
// ---------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub shipping_address_id: i64,
    #[serde(default)]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderItem {
    pub product_id: i64,
    pub quantity: i32,
}

impl From<CreateOrderRequest> for PlaceOrderRequest {
    fn from(dto: CreateOrderRequest) -> Self {
        PlaceOrderRequest {
            customer_id: dto.customer_id,
            shipping_address_id: dto.shipping_address_id,
            items: dto
                .items
                .into_iter()
                .map(|i| OrderItemRequest {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: i64,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub amount: Decimal,
    pub order_discount: Decimal,
    pub delivery_charge: Decimal,
    pub total_amount: Decimal,
    pub customer_id: i64,
    pub shipping_address_id: i64,
    pub items: Vec<OrderItemResponse>,
    pub shipped_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub quantity: i32,
    pub product_price: Decimal,
    pub discount: Decimal,
    pub total_price: Decimal,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        OrderItemResponse {
            product_id: item.product_id,
            quantity: item.quantity,
            product_price: item.product_price,
            discount: item.discount,
            total_price: item.total_price,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            order_id: order.id,
            order_date: order.order_date,
            status: order.status.as_str().to_string(),
            amount: order.amount,
            order_discount: order.order_discount,
            delivery_charge: order.delivery_charge,
            total_amount: order.total_amount,
            customer_id: order.customer_id,
            shipping_address_id: order.shipping_address_id,
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            shipped_date: order.shipped_date,
        }
    }
}

// ---------------------------
// Error Mapping
// ---------------------------

fn status_for(err: &PlaceOrderError) -> StatusCode {
    match err {
        PlaceOrderError::InvalidRequest(_)
        | PlaceOrderError::InvalidShippingAddress { .. }
        | PlaceOrderError::UnknownProduct(_)
        | PlaceOrderError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
        PlaceOrderError::CustomerNotFoundOrInactive(_) => StatusCode::NOT_FOUND,
        PlaceOrderError::ProductVanished(_) => StatusCode::CONFLICT,
        PlaceOrderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &PlaceOrderError) -> HttpResponse {
    HttpResponse::build(status_for(err)).json(serde_json::json!({
        "error": err.to_string(),
        "kind": err.kind(),
    }))
}

// ---------------------------
// POST /api/orders
// ---------------------------

pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> HttpResponse {
    let started = Instant::now();
    let result = state.placement.place_order(body.into_inner().into()).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(order) => {
            state.metrics.record_placement(elapsed, None);
            HttpResponse::Ok().json(OrderResponse::from(order))
        }
        Err(err) => {
            state.metrics.record_placement(elapsed, Some(err.kind()));
            if matches!(err, PlaceOrderError::Storage(_)) {
                tracing::error!(error = %err, "Order placement failed in storage");
            } else {
                tracing::warn!(error = %err, kind = err.kind(), "Order placement rejected");
            }
            error_response(&err)
        }
    }
}

// ---------------------------
// GET /api/orders/{id}
// ---------------------------

pub async fn get_order_by_id(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let order_id = path.into_inner();

    match state.orders.fetch_order(order_id).await {
        Ok(Some(order)) => {
            state.metrics.record_lookup("order_by_id", true);
            HttpResponse::Ok().json(OrderResponse::from(order))
        }
        Ok(None) => {
            state.metrics.record_lookup("order_by_id", false);
            HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Order with ID {} not found", order_id),
            }))
        }
        Err(err) => {
            tracing::error!(error = %err, order_id, "Order lookup failed");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "storage failure",
            }))
        }
    }
}

// ---------------------------
// GET /api/customers/{id}/orders
// ---------------------------

pub async fn get_orders_by_customer(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> HttpResponse {
    let customer_id = path.into_inner();

    match state.orders.fetch_orders_by_customer(customer_id).await {
        Ok(orders) if orders.is_empty() => {
            state.metrics.record_lookup("orders_by_customer", false);
            HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("No orders found for customer with ID {}", customer_id),
            }))
        }
        Ok(orders) => {
            state.metrics.record_lookup("orders_by_customer", true);
            let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
            HttpResponse::Ok().json(body)
        }
        Err(err) => {
            tracing::error!(error = %err, customer_id, "Customer order lookup failed");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "storage failure",
            }))
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::value_objects::OrderStatus;
    use crate::domain::ports::StorageError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                PlaceOrderError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                PlaceOrderError::CustomerNotFoundOrInactive(1),
                StatusCode::NOT_FOUND,
            ),
            (
                PlaceOrderError::InvalidShippingAddress {
                    address_id: 1,
                    customer_id: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (PlaceOrderError::UnknownProduct(3), StatusCode::BAD_REQUEST),
            (
                PlaceOrderError::InsufficientStock {
                    product_id: 1,
                    requested: 2,
                    available: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
            (PlaceOrderError::ProductVanished(4), StatusCode::CONFLICT),
            (
                PlaceOrderError::Storage(StorageError::Other("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "wrong status for {err:?}");
        }
    }

    #[test]
    fn test_create_request_converts_to_domain() {
        let dto = CreateOrderRequest {
            customer_id: 1,
            shipping_address_id: 2,
            items: vec![CreateOrderItem {
                product_id: 3,
                quantity: 4,
            }],
        };

        let request: PlaceOrderRequest = dto.into();
        assert_eq!(request.customer_id, 1);
        assert_eq!(request.shipping_address_id, 2);
        assert_eq!(
            request.items,
            vec![OrderItemRequest {
                product_id: 3,
                quantity: 4
            }]
        );
    }

    #[test]
    fn test_order_response_from_aggregate() {
        let order = Order {
            id: 9,
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            amount: dec!(100.00),
            order_discount: dec!(10.00),
            delivery_charge: dec!(50),
            total_amount: dec!(140.00),
            customer_id: 1,
            shipping_address_id: 2,
            items: vec![OrderItem {
                id: 90,
                order_id: 9,
                product_id: 3,
                quantity: 2,
                product_price: dec!(50.00),
                discount: dec!(0.00),
                total_price: dec!(100.00),
            }],
            shipped_date: None,
            tracking: None,
        };

        let response = OrderResponse::from(order);
        assert_eq!(response.order_id, 9);
        assert_eq!(response.status, "Pending");
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].total_price, dec!(100.00));
    }

    #[test]
    fn test_missing_items_field_deserializes_to_empty_list() {
        // Shape validation downstream turns this into InvalidRequest
        let dto: CreateOrderRequest =
            serde_json::from_str(r#"{"customer_id": 1, "shipping_address_id": 2}"#).unwrap();
        assert!(dto.items.is_empty());
    }
}
