use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::aggregate::{Order, OrderDraft};
use super::errors::PlaceOrderError;
use super::inventory;
use super::pricing::{self, DeliveryChargePolicy};
use super::value_objects::PlaceOrderRequest;
use crate::domain::customer::{Address, Customer};
use crate::domain::ports::{CatalogEntry, CatalogReader, CustomerReader, OrderWriter};

// ============================================================================
// Order Placement Orchestrator
// ============================================================================
//
// Coordinates one placement attempt as a single unit of work:
//
//   shape validation -> customer/address validation -> catalog snapshot
//   -> availability check -> pricing -> transactional commit
//
// Every step before the commit is a pure check or a read; the commit is
// the only durable write and either persists the order, its items and
// the stock decrements together or nothing at all.
//
// ============================================================================

/// Confirm the customer exists, is active, and owns the shipping address.
/// Read-only; the reader has already filtered on the active flag.
pub fn validate_customer(
    customer: Option<Customer>,
    customer_id: i64,
    shipping_address_id: i64,
) -> Result<(Customer, Address), PlaceOrderError> {
    let customer =
        customer.ok_or(PlaceOrderError::CustomerNotFoundOrInactive(customer_id))?;

    let address = customer
        .address(shipping_address_id)
        .cloned()
        .ok_or(PlaceOrderError::InvalidShippingAddress {
            address_id: shipping_address_id,
            customer_id,
        })?;

    Ok((customer, address))
}

pub struct OrderPlacementService {
    customers: Arc<dyn CustomerReader>,
    catalog: Arc<dyn CatalogReader>,
    orders: Arc<dyn OrderWriter>,
    delivery_policy: DeliveryChargePolicy,
}

impl OrderPlacementService {
    pub fn new(
        customers: Arc<dyn CustomerReader>,
        catalog: Arc<dyn CatalogReader>,
        orders: Arc<dyn OrderWriter>,
        delivery_policy: DeliveryChargePolicy,
    ) -> Self {
        Self {
            customers,
            catalog,
            orders,
            delivery_policy,
        }
    }

    /// Place an order. Returns the persisted order (with generated ids) or
    /// a typed error; no partial state is ever left behind on failure.
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, PlaceOrderError> {
        // 1. Shape validation before any storage read
        request.validate()?;

        let request_id = Uuid::new_v4();
        tracing::debug!(
            request_id = %request_id,
            customer_id = request.customer_id,
            item_count = request.items.len(),
            "Placing order"
        );

        // 2. Customer and shipping address
        let customer = self
            .customers
            .fetch_active_with_addresses(request.customer_id)
            .await?;
        let (customer, address) =
            validate_customer(customer, request.customer_id, request.shipping_address_id)?;

        // 3. Catalog snapshot limited to the requested products
        let mut product_ids: Vec<i64> = request.items.iter().map(|i| i.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let entries = self.catalog.fetch_by_ids(&product_ids).await?;
        let catalog: HashMap<i64, CatalogEntry> =
            entries.into_iter().map(|e| (e.id, e)).collect();

        if catalog.len() != product_ids.len() {
            let missing = product_ids
                .iter()
                .copied()
                .find(|id| !catalog.contains_key(id))
                .unwrap_or_default();
            return Err(PlaceOrderError::UnknownProduct(missing));
        }

        // 4. Availability check on the snapshot (fails cheaply before writes)
        inventory::check_availability(&request.items, &catalog)?;

        // 5. Pricing: line items, then order totals from the membership tier
        //    and the injected delivery policy
        let priced = pricing::price_items(&request.items, &catalog)?;
        let totals = pricing::compute_order_totals(
            &priced,
            customer.membership_discount(),
            &self.delivery_policy,
        );

        // 6-8. Single transactional commit: order row, item rows and the
        //      conditional stock decrements stand or fall together
        let decrements = inventory::decrements_for(&request.items);
        let draft = OrderDraft::new(customer.id, address.id, priced, totals);
        let order = self.orders.commit_order(draft, decrements).await?;

        tracing::info!(
            request_id = %request_id,
            order_id = order.id,
            customer_id = order.customer_id,
            total_amount = %order.total_amount,
            "✅ Order placed"
        );

        Ok(order)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures_util::future::join_all;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::customer::MembershipTier;
    use crate::domain::order::aggregate::OrderItem;
    use crate::domain::order::value_objects::{OrderItemRequest, OrderStatus};
    use crate::domain::ports::{CommitError, StorageError};

    // ------------------------------------------------------------------
    // In-memory port implementations
    // ------------------------------------------------------------------

    struct InMemoryStore {
        customers: Vec<Customer>,
        products: Mutex<HashMap<i64, CatalogEntry>>,
        orders: Mutex<Vec<Order>>,
        next_order_id: AtomicI64,
        fail_commit: AtomicBool,
    }

    impl InMemoryStore {
        fn new(customers: Vec<Customer>, products: Vec<CatalogEntry>) -> Arc<Self> {
            Arc::new(Self {
                customers,
                products: Mutex::new(products.into_iter().map(|p| (p.id, p)).collect()),
                orders: Mutex::new(Vec::new()),
                next_order_id: AtomicI64::new(1),
                fail_commit: AtomicBool::new(false),
            })
        }

        fn stock_of(&self, product_id: i64) -> i32 {
            self.products.lock().unwrap()[&product_id].stock_quantity
        }

        fn order_count(&self) -> usize {
            self.orders.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CustomerReader for InMemoryStore {
        async fn fetch_active_with_addresses(
            &self,
            id: i64,
        ) -> Result<Option<Customer>, StorageError> {
            Ok(self
                .customers
                .iter()
                .find(|c| c.id == id && c.is_active)
                .cloned())
        }
    }

    #[async_trait]
    impl CatalogReader for InMemoryStore {
        async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<CatalogEntry>, StorageError> {
            let products = self.products.lock().unwrap();
            Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
        }
    }

    #[async_trait]
    impl OrderWriter for InMemoryStore {
        async fn commit_order(
            &self,
            draft: OrderDraft,
            decrements: Vec<crate::domain::order::inventory::StockDecrement>,
        ) -> Result<Order, CommitError> {
            if self.fail_commit.load(Ordering::SeqCst) {
                return Err(CommitError::Storage(StorageError::Other(
                    "injected commit failure".to_string(),
                )));
            }

            let mut products = self.products.lock().unwrap();

            // Validate every decrement before mutating anything, mirroring
            // transactional all-or-nothing semantics.
            for d in &decrements {
                match products.get(&d.product_id) {
                    None => return Err(CommitError::ProductVanished(d.product_id)),
                    Some(p) if p.stock_quantity < d.quantity => {
                        return Err(CommitError::InsufficientStock {
                            product_id: d.product_id,
                            requested: d.quantity,
                            available: p.stock_quantity,
                        })
                    }
                    Some(_) => {}
                }
            }

            for d in &decrements {
                products.get_mut(&d.product_id).unwrap().stock_quantity -= d.quantity;
            }

            let order_id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
            let items = draft
                .items
                .iter()
                .enumerate()
                .map(|(i, p)| OrderItem {
                    id: order_id * 100 + i as i64,
                    order_id,
                    product_id: p.product_id,
                    quantity: p.quantity,
                    product_price: p.product_price,
                    discount: p.discount,
                    total_price: p.total_price,
                })
                .collect();

            let order = Order {
                id: order_id,
                order_date: draft.order_date,
                status: draft.status,
                amount: draft.totals.amount,
                order_discount: draft.totals.order_discount,
                delivery_charge: draft.totals.delivery_charge,
                total_amount: draft.totals.total_amount,
                customer_id: draft.customer_id,
                shipping_address_id: draft.shipping_address_id,
                items,
                shipped_date: None,
                tracking: None,
            };

            self.orders.lock().unwrap().push(order.clone());
            Ok(order)
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    fn customer(id: i64, address_id: i64, tier_pct: Option<Decimal>) -> Customer {
        Customer {
            id,
            first_name: "Test".to_string(),
            last_name: "Customer".to_string(),
            email: format!("customer{id}@example.com"),
            is_active: true,
            membership_tier: tier_pct.map(|pct| MembershipTier {
                id: 1,
                tier_name: "Gold".to_string(),
                discount_percentage: pct,
            }),
            addresses: vec![Address {
                id: address_id,
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                zip_code: "12345".to_string(),
                customer_id: id,
            }],
        }
    }

    fn product(id: i64, price: Decimal, discount_pct: Option<Decimal>, stock: i32) -> CatalogEntry {
        CatalogEntry {
            id,
            price,
            discount_percentage: discount_pct,
            stock_quantity: stock,
        }
    }

    fn service(store: &Arc<InMemoryStore>, policy: DeliveryChargePolicy) -> OrderPlacementService {
        OrderPlacementService::new(store.clone(), store.clone(), store.clone(), policy)
    }

    fn default_policy() -> DeliveryChargePolicy {
        DeliveryChargePolicy {
            enabled: true,
            flat_amount: dec!(50),
            free_threshold: dec!(1000),
        }
    }

    fn request(customer_id: i64, address_id: i64, items: &[(i64, i32)]) -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer_id,
            shipping_address_id: address_id,
            items: items
                .iter()
                .map(|&(product_id, quantity)| OrderItemRequest {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_successful_placement_computes_totals_and_decrements_stock() {
        let store = InMemoryStore::new(
            vec![customer(1, 10, Some(dec!(15)))],
            vec![
                product(100, dec!(1500), Some(dec!(10)), 5),
                product(200, dec!(25), Some(dec!(5)), 5),
            ],
        );
        let service = service(&store, default_policy());

        let order = service
            .place_order(request(1, 10, &[(100, 1), (200, 2)]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.amount, dec!(1397.50));
        assert_eq!(order.order_discount, dec!(209.62));
        assert_eq!(order.delivery_charge, dec!(0));
        assert_eq!(order.total_amount, dec!(1187.88));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].total_price, dec!(1350.00));
        assert_eq!(order.items[1].total_price, dec!(47.50));

        assert_eq!(store.stock_of(100), 4);
        assert_eq!(store.stock_of(200), 3);
    }

    #[tokio::test]
    async fn test_delivery_charge_applied_below_threshold() {
        let store = InMemoryStore::new(
            vec![customer(1, 10, None)],
            vec![product(100, dec!(25), None, 5)],
        );
        let service = service(&store, default_policy());

        let order = service.place_order(request(1, 10, &[(100, 2)])).await.unwrap();

        assert_eq!(order.amount, dec!(50.00));
        assert_eq!(order.delivery_charge, dec!(50));
        assert_eq!(order.total_amount, dec!(100.00));
    }

    #[tokio::test]
    async fn test_unknown_customer_fails_without_writes() {
        let store = InMemoryStore::new(vec![], vec![product(100, dec!(10), None, 5)]);
        let service = service(&store, default_policy());

        let err = service.place_order(request(7, 10, &[(100, 1)])).await.unwrap_err();

        assert!(matches!(err, PlaceOrderError::CustomerNotFoundOrInactive(7)));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.stock_of(100), 5);
    }

    #[tokio::test]
    async fn test_inactive_customer_is_treated_as_missing() {
        let mut inactive = customer(1, 10, None);
        inactive.is_active = false;
        let store = InMemoryStore::new(vec![inactive], vec![product(100, dec!(10), None, 5)]);
        let service = service(&store, default_policy());

        let err = service.place_order(request(1, 10, &[(100, 1)])).await.unwrap_err();
        assert!(matches!(err, PlaceOrderError::CustomerNotFoundOrInactive(1)));
    }

    #[tokio::test]
    async fn test_foreign_address_rejected_without_writes() {
        let store = InMemoryStore::new(
            vec![customer(1, 10, None), customer(2, 20, None)],
            vec![product(100, dec!(10), None, 5)],
        );
        let service = service(&store, default_policy());

        // Customer 1 tries to ship to customer 2's address
        let err = service.place_order(request(1, 20, &[(100, 1)])).await.unwrap_err();

        assert!(matches!(
            err,
            PlaceOrderError::InvalidShippingAddress {
                address_id: 20,
                customer_id: 1,
            }
        ));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.stock_of(100), 5);
    }

    #[tokio::test]
    async fn test_unknown_product_in_catalog_snapshot() {
        let store = InMemoryStore::new(
            vec![customer(1, 10, None)],
            vec![product(100, dec!(10), None, 5)],
        );
        let service = service(&store, default_policy());

        let err = service
            .place_order(request(1, 10, &[(100, 1), (999, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, PlaceOrderError::UnknownProduct(999)));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_one_insufficient_item_fails_the_whole_order() {
        let store = InMemoryStore::new(
            vec![customer(1, 10, None)],
            vec![
                product(100, dec!(10), None, 5),
                product(200, dec!(10), None, 1),
            ],
        );
        let service = service(&store, default_policy());

        let err = service
            .place_order(request(1, 10, &[(100, 2), (200, 3)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlaceOrderError::InsufficientStock {
                product_id: 200,
                requested: 3,
                available: 1,
            }
        ));
        // Nothing was decremented, not even the item with enough stock
        assert_eq!(store.stock_of(100), 5);
        assert_eq!(store.stock_of(200), 1);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces_as_storage_error() {
        let store = InMemoryStore::new(
            vec![customer(1, 10, None)],
            vec![product(100, dec!(10), None, 5)],
        );
        store.fail_commit.store(true, Ordering::SeqCst);
        let service = service(&store, default_policy());

        let err = service.place_order(request(1, 10, &[(100, 1)])).await.unwrap_err();

        assert!(matches!(err, PlaceOrderError::Storage(_)));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.stock_of(100), 5);
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_storage() {
        let store = InMemoryStore::new(vec![], vec![]);
        let service = service(&store, default_policy());

        let err = service.place_order(request(1, 10, &[])).await.unwrap_err();
        assert!(matches!(err, PlaceOrderError::InvalidRequest(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_placements_never_oversell() {
        const STOCK: i32 = 5;
        const ATTEMPTS: usize = 8;

        let store = InMemoryStore::new(
            vec![customer(1, 10, None)],
            vec![product(100, dec!(10), None, STOCK)],
        );
        let service = Arc::new(service(&store, default_policy()));

        let tasks: Vec<_> = (0..ATTEMPTS)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.place_order(request(1, 10, &[(100, 1)])).await })
            })
            .collect();

        let results = join_all(tasks).await;

        let mut successes = 0;
        for result in results {
            match result.unwrap() {
                Ok(_) => successes += 1,
                Err(PlaceOrderError::InsufficientStock { available, .. }) => {
                    assert!(available >= 0);
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // The sum of decremented quantities never exceeds the stock
        assert_eq!(successes, STOCK as usize);
        assert_eq!(store.stock_of(100), 0);
        assert_eq!(store.order_count(), STOCK as usize);
    }
}
