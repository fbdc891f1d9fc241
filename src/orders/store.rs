use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct OrderRecord {
    pub id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub shipping_address: String,
    pub payment_method: String,
    pub user_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub payment_method: String,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StockSnapshot {
    pub stock: i32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub kind: String,
}

/// Storage boundary of the order placement flow. Each method is an
/// independent call with its own outcome; no multi-statement atomicity is
/// assumed.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> anyhow::Result<OrderRecord>;

    /// Stock and name of an orderable product; None when the product does
    /// not exist or is inactive.
    async fn product_stock(&self, product_id: Uuid) -> anyhow::Result<Option<StockSnapshot>>;

    async fn insert_order_item(&self, item: NewOrderItem) -> anyhow::Result<()>;

    /// Conditional decrement: succeeds only while `stock >= quantity` still
    /// holds at write time. Returns false when zero rows matched, meaning a
    /// concurrent checkout took the stock first.
    async fn decrement_stock(&self, product_id: Uuid, quantity: i32) -> anyhow::Result<bool>;

    async fn restock(&self, product_id: Uuid, quantity: i32) -> anyhow::Result<()>;

    async fn delete_order_items(&self, order_id: Uuid) -> anyhow::Result<()>;

    async fn delete_order(&self, order_id: Uuid) -> anyhow::Result<()>;

    async fn insert_notification(&self, notification: NewNotification) -> anyhow::Result<()>;
}

pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, order: NewOrder) -> anyhow::Result<OrderRecord> {
        let record = sqlx::query_as::<_, OrderRecord>(
            r#"
            INSERT INTO orders (total_amount, status, shipping_address, payment_method, user_id)
            VALUES ($1, 'pending', $2, $3, $4)
            RETURNING id, total_amount, status, shipping_address, payment_method, user_id, created_at
            "#,
        )
        .bind(order.total_amount)
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(order.user_id)
        .fetch_one(&self.db)
        .await
        .context("insert order")?;
        Ok(record)
    }

    async fn product_stock(&self, product_id: Uuid) -> anyhow::Result<Option<StockSnapshot>> {
        let snapshot = sqlx::query_as::<_, StockSnapshot>(
            r#"
            SELECT stock, name
            FROM products
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await
        .context("read product stock")?;
        Ok(snapshot)
    }

    async fn insert_order_item(&self, item: NewOrderItem) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&self.db)
        .await
        .context("insert order item")?;
        Ok(())
    }

    async fn decrement_stock(&self, product_id: Uuid, quantity: i32) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = now()
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&self.db)
        .await
        .context("decrement stock")?;
        Ok(result.rows_affected() > 0)
    }

    async fn restock(&self, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&self.db)
        .await
        .context("restock")?;
        Ok(())
    }

    async fn delete_order_items(&self, order_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await
            .context("delete order items")?;
        Ok(())
    }

    async fn delete_order(&self, order_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await
            .context("delete order")?;
        Ok(())
    }

    async fn insert_notification(&self, notification: NewNotification) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message, type)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .execute(&self.db)
        .await
        .context("insert notification")?;
        Ok(())
    }
}
