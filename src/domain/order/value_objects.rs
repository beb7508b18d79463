use serde::{Deserialize, Serialize};

use super::errors::PlaceOrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// One product/quantity pair requested by the caller
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

/// The request shape into the placement workflow
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PlaceOrderRequest {
    pub customer_id: i64,
    pub shipping_address_id: i64,
    pub items: Vec<OrderItemRequest>,
}

impl PlaceOrderRequest {
    /// Shape validation before any storage read. Rejects missing ids,
    /// an empty item list and non-positive product ids or quantities.
    pub fn validate(&self) -> Result<(), PlaceOrderError> {
        if self.customer_id <= 0 {
            return Err(PlaceOrderError::InvalidRequest(
                "customer id must be positive".to_string(),
            ));
        }
        if self.shipping_address_id <= 0 {
            return Err(PlaceOrderError::InvalidRequest(
                "shipping address id must be positive".to_string(),
            ));
        }
        if self.items.is_empty() {
            return Err(PlaceOrderError::InvalidRequest(
                "order must contain at least one item".to_string(),
            ));
        }
        for item in &self.items {
            if item.product_id <= 0 {
                return Err(PlaceOrderError::InvalidRequest(format!(
                    "invalid product id: {}",
                    item.product_id
                )));
            }
            if item.quantity <= 0 {
                return Err(PlaceOrderError::InvalidRequest(format!(
                    "invalid quantity {} for product {}",
                    item.quantity, item.product_id
                )));
            }
        }
        Ok(())
    }
}

/// Order lifecycle status. Placement only ever produces `Pending`;
/// the later transitions belong to fulfillment, outside this workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(OrderStatus::Pending),
            "Shipped" => Some(OrderStatus::Shipped),
            "Delivered" => Some(OrderStatus::Delivered),
            "Cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer_id: 1,
            shipping_address_id: 2,
            items: vec![OrderItemRequest {
                product_id: 3,
                quantity: 1,
            }],
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut request = valid_request();
        request.items.clear();
        assert!(matches!(
            request.validate(),
            Err(PlaceOrderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut request = valid_request();
        request.items[0].quantity = 0;
        assert!(matches!(
            request.validate(),
            Err(PlaceOrderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_non_positive_product_id_rejected() {
        let mut request = valid_request();
        request.items[0].product_id = -4;
        assert!(matches!(
            request.validate(),
            Err(PlaceOrderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_missing_customer_id_rejected() {
        let mut request = valid_request();
        request.customer_id = 0;
        assert!(matches!(
            request.validate(),
            Err(PlaceOrderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("Unknown"), None);
    }
}
