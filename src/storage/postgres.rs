use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};

use async_trait::async_trait;

use crate::domain::customer::{Address, Customer, MembershipTier};
use crate::domain::order::aggregate::{Order, OrderDraft, OrderItem, TrackingDetail};
use crate::domain::order::inventory::StockDecrement;
use crate::domain::order::value_objects::OrderStatus;
use crate::domain::ports::{
    CatalogEntry, CatalogReader, CommitError, CustomerReader, OrderReader, OrderWriter,
    StorageError,
};

// ============================================================================
// PgStore - Postgres-backed implementation of the storage ports
// ============================================================================
//
// The commit path is the interesting part: order row, item rows and stock
// decrements are written inside ONE transaction. Stock is decremented with
// a conditional UPDATE (`... AND stock_quantity >= $n`); a zero row count
// means another transaction got there first, and the whole commit rolls
// back. This is what keeps stock_quantity >= 0 under concurrent
// placements without explicit row locks.
//
// ============================================================================

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Populate items and tracking details for already-fetched order rows
    async fn load_order_children(&self, orders: &mut [Order]) -> Result<(), StorageError> {
        if orders.is_empty() {
            return Ok(());
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();

        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, quantity, product_price, discount, total_price
             FROM order_items
             WHERE order_id = ANY($1)
             ORDER BY id",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let tracking_rows: Vec<TrackingRow> = sqlx::query_as(
            "SELECT id, order_id, carrier, tracking_number, estimated_delivery_date
             FROM tracking_details
             WHERE order_id = ANY($1)",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        for order in orders.iter_mut() {
            order.items = item_rows
                .iter()
                .filter(|r| r.order_id == order.id)
                .map(OrderItem::from)
                .collect();
            order.tracking = tracking_rows
                .iter()
                .find(|r| r.order_id == order.id)
                .map(TrackingDetail::from);
        }

        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    is_active: bool,
    tier_id: Option<i64>,
    tier_name: Option<String>,
    tier_discount: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i64,
    street: String,
    city: String,
    zip_code: String,
    customer_id: i64,
}

#[derive(sqlx::FromRow)]
struct CatalogRow {
    id: i64,
    price: Decimal,
    discount_percentage: Option<Decimal>,
    stock_quantity: i32,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_date: DateTime<Utc>,
    status: String,
    amount: Decimal,
    order_discount: Decimal,
    delivery_charge: Decimal,
    total_amount: Decimal,
    customer_id: i64,
    shipping_address_id: i64,
    shipped_date: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i32,
    product_price: Decimal,
    discount: Decimal,
    total_price: Decimal,
}

#[derive(sqlx::FromRow)]
struct TrackingRow {
    id: i64,
    order_id: i64,
    carrier: String,
    tracking_number: Option<String>,
    estimated_delivery_date: Option<DateTime<Utc>>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            street: row.street,
            city: row.city,
            zip_code: row.zip_code,
            customer_id: row.customer_id,
        }
    }
}

impl From<CatalogRow> for CatalogEntry {
    fn from(row: CatalogRow) -> Self {
        CatalogEntry {
            id: row.id,
            price: row.price,
            discount_percentage: row.discount_percentage,
            stock_quantity: row.stock_quantity,
        }
    }
}

impl From<&OrderItemRow> for OrderItem {
    fn from(row: &OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            product_price: row.product_price,
            discount: row.discount,
            total_price: row.total_price,
        }
    }
}

impl From<&TrackingRow> for TrackingDetail {
    fn from(row: &TrackingRow) -> Self {
        TrackingDetail {
            id: row.id,
            order_id: row.order_id,
            carrier: row.carrier.clone(),
            tracking_number: row.tracking_number.clone(),
            estimated_delivery_date: row.estimated_delivery_date,
        }
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = StorageError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            StorageError::Other(format!("unknown order status in row: {}", row.status))
        })?;

        Ok(Order {
            id: row.id,
            order_date: row.order_date,
            status,
            amount: row.amount,
            order_discount: row.order_discount,
            delivery_charge: row.delivery_charge,
            total_amount: row.total_amount,
            customer_id: row.customer_id,
            shipping_address_id: row.shipping_address_id,
            items: Vec::new(),
            shipped_date: row.shipped_date,
            tracking: None,
        })
    }
}

// ============================================================================
// Port Implementations
// ============================================================================

#[async_trait]
impl CustomerReader for PgStore {
    async fn fetch_active_with_addresses(
        &self,
        id: i64,
    ) -> Result<Option<Customer>, StorageError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT c.id, c.first_name, c.last_name, c.email, c.is_active,
                    t.id AS tier_id, t.tier_name AS tier_name,
                    t.discount_percentage AS tier_discount
             FROM customers c
             LEFT JOIN membership_tiers t ON t.id = c.membership_tier_id
             WHERE c.id = $1 AND c.is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let address_rows: Vec<AddressRow> = sqlx::query_as(
            "SELECT id, street, city, zip_code, customer_id
             FROM addresses
             WHERE customer_id = $1
             ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let membership_tier = match (row.tier_id, row.tier_name, row.tier_discount) {
            (Some(id), Some(tier_name), Some(discount_percentage)) => Some(MembershipTier {
                id,
                tier_name,
                discount_percentage,
            }),
            _ => None,
        };

        Ok(Some(Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            is_active: row.is_active,
            membership_tier,
            addresses: address_rows.into_iter().map(Address::from).collect(),
        }))
    }
}

#[async_trait]
impl CatalogReader for PgStore {
    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<CatalogEntry>, StorageError> {
        let rows: Vec<CatalogRow> = sqlx::query_as(
            "SELECT id, price, discount_percentage, stock_quantity
             FROM products
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }
}

#[async_trait]
impl OrderWriter for PgStore {
    async fn commit_order(
        &self,
        draft: OrderDraft,
        decrements: Vec<StockDecrement>,
    ) -> Result<Order, CommitError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (order_date, status, amount, order_discount,
                                 delivery_charge, total_amount, customer_id,
                                 shipping_address_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(draft.order_date)
        .bind(draft.status.as_str())
        .bind(draft.totals.amount)
        .bind(draft.totals.order_discount)
        .bind(draft.totals.delivery_charge)
        .bind(draft.totals.total_amount)
        .bind(draft.customer_id)
        .bind(draft.shipping_address_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(draft.items.len());
        for priced in &draft.items {
            let item_id: i64 = sqlx::query_scalar(
                "INSERT INTO order_items (order_id, product_id, quantity,
                                          product_price, discount, total_price)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id",
            )
            .bind(order_id)
            .bind(priced.product_id)
            .bind(priced.quantity)
            .bind(priced.product_price)
            .bind(priced.discount)
            .bind(priced.total_price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: item_id,
                order_id,
                product_id: priced.product_id,
                quantity: priced.quantity,
                product_price: priced.product_price,
                discount: priced.discount,
                total_price: priced.total_price,
            });
        }

        for decrement in &decrements {
            let result = sqlx::query(
                "UPDATE products
                 SET stock_quantity = stock_quantity - $1
                 WHERE id = $2 AND stock_quantity >= $1",
            )
            .bind(decrement.quantity)
            .bind(decrement.product_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Distinguish a vanished product from a lost stock race.
                // Dropping the transaction rolls everything back.
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                        .bind(decrement.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(match available {
                    Some(available) => CommitError::InsufficientStock {
                        product_id: decrement.product_id,
                        requested: decrement.quantity,
                        available,
                    },
                    None => CommitError::ProductVanished(decrement.product_id),
                });
            }
        }

        tx.commit().await?;

        tracing::debug!(
            order_id,
            item_count = items.len(),
            "Order commit durable"
        );

        Ok(Order {
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
        })
    }
}

#[async_trait]
impl OrderReader for PgStore {
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StorageError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, order_date, status, amount, order_discount, delivery_charge,
                    total_amount, customer_id, shipping_address_id, shipped_date
             FROM orders
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut orders = vec![Order::try_from(row)?];
        self.load_order_children(&mut orders).await?;
        Ok(orders.pop())
    }

    async fn fetch_orders_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Order>, StorageError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, order_date, status, amount, order_discount, delivery_charge,
                    total_amount, customer_id, shipping_address_id, shipped_date
             FROM orders
             WHERE customer_id = $1
             ORDER BY id",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.load_order_children(&mut orders).await?;
        Ok(orders)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
