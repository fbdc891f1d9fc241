use tracing::{error, warn};
use uuid::Uuid;

use crate::config::FailureMode;
use crate::views::{ViewCache, ViewId};

use super::dto::{CreateOrderRequest, OrderLine};
use super::error::OrderError;
use super::store::{NewNotification, NewOrder, NewOrderItem, OrderStore, StockSnapshot};

pub const ORDER_CONFIRMED_MESSAGE: &str =
    "Order placed successfully! Your order has been confirmed.";

#[derive(Debug)]
pub enum PlacementOutcome {
    Placed { order_id: Uuid, message: String },
    Rejected { error: String },
}

/// Converts a cart snapshot into persisted order records and stock
/// decrements. Never raises past this boundary: every failure becomes a
/// `Rejected` outcome with a user-facing message, with detail logged.
pub async fn place_order(
    store: &dyn OrderStore,
    views: &dyn ViewCache,
    mode: FailureMode,
    request: CreateOrderRequest,
) -> PlacementOutcome {
    match run_placement(store, mode, &request).await {
        Ok(order_id) => {
            notify_order_confirmed(store, order_id).await;
            views.invalidate(ViewId::Home);
            views.invalidate(ViewId::Products);
            PlacementOutcome::Placed {
                order_id,
                message: ORDER_CONFIRMED_MESSAGE.to_string(),
            }
        }
        Err(err) => {
            error!(error = %err, "order placement failed");
            PlacementOutcome::Rejected {
                error: err.user_message(),
            }
        }
    }
}

async fn run_placement(
    store: &dyn OrderStore,
    mode: FailureMode,
    request: &CreateOrderRequest,
) -> Result<Uuid, OrderError> {
    let order = store
        .insert_order(NewOrder {
            total_amount: request.total_amount,
            shipping_address: request.customer_info.shipping_address(),
            payment_method: request.payment_method.clone(),
            // auth is not implemented upstream
            user_id: None,
        })
        .await
        .map_err(|cause| OrderError::OrderCreate { cause })?;

    let mut committed: Vec<(Uuid, i32)> = Vec::new();
    for line in &request.items {
        if let Err(err) = reserve_line(store, order.id, line).await {
            if mode == FailureMode::Compensate {
                unwind(store, order.id, &committed).await;
            }
            return Err(err);
        }
        committed.push((line.product_id, line.quantity));
    }

    Ok(order.id)
}

/// One cart line: stock check, order item insert with the caller-supplied
/// price, then the guarded decrement.
async fn reserve_line(
    store: &dyn OrderStore,
    order_id: Uuid,
    line: &OrderLine,
) -> Result<(), OrderError> {
    let snapshot = store
        .product_stock(line.product_id)
        .await
        .map_err(|cause| OrderError::ProductLookup {
            product_id: line.product_id,
            cause,
        })?
        .ok_or_else(|| OrderError::ProductLookup {
            product_id: line.product_id,
            cause: anyhow::anyhow!("product not found"),
        })?;

    if snapshot.stock < line.quantity {
        return Err(OrderError::InsufficientStock {
            name: snapshot.name,
            remaining: snapshot.stock,
        });
    }

    store
        .insert_order_item(NewOrderItem {
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            price: line.price,
        })
        .await
        .map_err(|cause| OrderError::OrderItemInsert {
            product_id: line.product_id,
            cause,
        })?;

    let updated = store
        .decrement_stock(line.product_id, line.quantity)
        .await
        .map_err(|cause| OrderError::StockUpdate {
            product_id: line.product_id,
            cause,
        })?;
    if !updated {
        // A concurrent checkout won the stock between the read and the
        // guarded write; surface it as insufficient stock with a fresh count.
        let remaining = store
            .product_stock(line.product_id)
            .await
            .ok()
            .flatten()
            .map(|s| s.stock)
            .unwrap_or(0);
        return Err(OrderError::InsufficientStock {
            name: snapshot.name,
            remaining,
        });
    }

    Ok(())
}

/// Best-effort undo of the writes this invocation already committed.
async fn unwind(store: &dyn OrderStore, order_id: Uuid, committed: &[(Uuid, i32)]) {
    for (product_id, quantity) in committed.iter().rev() {
        if let Err(err) = store.restock(*product_id, *quantity).await {
            error!(error = %err, %product_id, "compensation restock failed");
        }
    }
    if let Err(err) = store.delete_order_items(order_id).await {
        error!(error = %err, %order_id, "compensation order item delete failed");
    }
    if let Err(err) = store.delete_order(order_id).await {
        error!(error = %err, %order_id, "compensation order delete failed");
    }
}

/// Fire-and-forget: the user already has a valid order, so a failed
/// notification insert must not fail the placement.
async fn notify_order_confirmed(store: &dyn OrderStore, order_id: Uuid) {
    let short_id: String = order_id.to_string().chars().take(8).collect();
    let notification = NewNotification {
        user_id: None,
        title: "Order confirmed".to_string(),
        message: format!("Order #{short_id} has been confirmed"),
        kind: "success".to_string(),
    };
    if let Err(err) = store.insert_notification(notification).await {
        warn!(error = %err, %order_id, "order notification insert failed");
    }
}

pub async fn get_product_stock(
    store: &dyn OrderStore,
    product_id: Uuid,
) -> Result<StockSnapshot, String> {
    match store.product_stock(product_id).await {
        Ok(Some(snapshot)) => Ok(snapshot),
        Ok(None) => Err("Product not found".to_string()),
        Err(err) => {
            error!(error = %err, %product_id, "stock lookup failed");
            Err(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use anyhow::bail;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use time::OffsetDateTime;

    use super::*;
    use crate::orders::dto::CustomerInfo;
    use crate::orders::error::GENERIC_ORDER_ERROR;
    use crate::orders::store::OrderRecord;
    use crate::views::NoopViewCache;

    #[derive(Clone)]
    struct MemProduct {
        name: String,
        stock: i32,
        price: Decimal,
    }

    /// In-memory stand-in for the storage backend, with failure knobs for
    /// the abort paths.
    #[derive(Default)]
    struct MemStore {
        products: Mutex<HashMap<Uuid, MemProduct>>,
        orders: Mutex<Vec<OrderRecord>>,
        items: Mutex<Vec<NewOrderItem>>,
        notifications: Mutex<Vec<NewNotification>>,
        fail_notifications: bool,
        fail_item_insert_for: Option<Uuid>,
        lose_stock_race: bool,
    }

    impl MemStore {
        fn with_products(products: Vec<(Uuid, &str, i32, Decimal)>) -> Self {
            let store = Self::default();
            {
                let mut guard = store.products.lock().unwrap();
                for (id, name, stock, price) in products {
                    guard.insert(
                        id,
                        MemProduct {
                            name: name.to_string(),
                            stock,
                            price,
                        },
                    );
                }
            }
            store
        }

        fn stock_of(&self, id: Uuid) -> i32 {
            self.products.lock().unwrap()[&id].stock
        }

        fn items_for(&self, product_id: Uuid) -> Vec<NewOrderItem> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.product_id == product_id)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl OrderStore for MemStore {
        async fn insert_order(&self, order: NewOrder) -> anyhow::Result<OrderRecord> {
            let record = OrderRecord {
                id: Uuid::new_v4(),
                total_amount: order.total_amount,
                status: "pending".to_string(),
                shipping_address: order.shipping_address,
                payment_method: order.payment_method,
                user_id: order.user_id,
                created_at: OffsetDateTime::now_utc(),
            };
            self.orders.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn product_stock(
            &self,
            product_id: Uuid,
        ) -> anyhow::Result<Option<StockSnapshot>> {
            Ok(self.products.lock().unwrap().get(&product_id).map(|p| {
                StockSnapshot {
                    stock: p.stock,
                    name: p.name.clone(),
                }
            }))
        }

        async fn insert_order_item(&self, item: NewOrderItem) -> anyhow::Result<()> {
            if self.fail_item_insert_for == Some(item.product_id) {
                bail!("simulated order item insert failure");
            }
            self.items.lock().unwrap().push(item);
            Ok(())
        }

        async fn decrement_stock(&self, product_id: Uuid, quantity: i32) -> anyhow::Result<bool> {
            if self.lose_stock_race {
                return Ok(false);
            }
            let mut guard = self.products.lock().unwrap();
            let Some(product) = guard.get_mut(&product_id) else {
                bail!("no such product");
            };
            if product.stock < quantity {
                return Ok(false);
            }
            product.stock -= quantity;
            Ok(true)
        }

        async fn restock(&self, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
            let mut guard = self.products.lock().unwrap();
            let Some(product) = guard.get_mut(&product_id) else {
                bail!("no such product");
            };
            product.stock += quantity;
            Ok(())
        }

        async fn delete_order_items(&self, order_id: Uuid) -> anyhow::Result<()> {
            self.items.lock().unwrap().retain(|i| i.order_id != order_id);
            Ok(())
        }

        async fn delete_order(&self, order_id: Uuid) -> anyhow::Result<()> {
            self.orders.lock().unwrap().retain(|o| o.id != order_id);
            Ok(())
        }

        async fn insert_notification(
            &self,
            notification: NewNotification,
        ) -> anyhow::Result<()> {
            if self.fail_notifications {
                bail!("simulated notification insert failure");
            }
            self.notifications.lock().unwrap().push(notification);
            Ok(())
        }
    }

    /// Records invalidations instead of caching anything.
    #[derive(Default)]
    struct RecordingViewCache {
        invalidated: Mutex<Vec<ViewId>>,
    }

    impl ViewCache for RecordingViewCache {
        fn cached_listing(&self, _view: ViewId) -> Option<Vec<crate::catalog::dto::ProductView>> {
            None
        }
        fn store_listing(&self, _view: ViewId, _products: Vec<crate::catalog::dto::ProductView>) {}
        fn invalidate(&self, view: ViewId) {
            self.invalidated.lock().unwrap().push(view);
        }
    }

    fn price(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.test".into(),
            phone: "555-0100".into(),
            address: "1 Engine St".into(),
            city: "London".into(),
            postal_code: "E1 6AN".into(),
        }
    }

    fn request(items: Vec<OrderLine>, total: Decimal) -> CreateOrderRequest {
        CreateOrderRequest {
            items,
            total_amount: total,
            payment_method: "credit-card".into(),
            customer_info: customer(),
        }
    }

    fn line(product_id: Uuid, quantity: i32, unit_price: Decimal) -> OrderLine {
        OrderLine {
            product_id,
            quantity,
            price: unit_price,
        }
    }

    #[tokio::test]
    async fn places_order_and_decrements_stock_per_line() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let store = MemStore::with_products(vec![
            (p1, "Keyboard", 5, price(100)),
            (p2, "Mouse", 5, price(50)),
        ]);

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(
                vec![line(p1, 2, price(100)), line(p2, 1, price(50))],
                price(250),
            ),
        )
        .await;

        let PlacementOutcome::Placed { message, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(message, ORDER_CONFIRMED_MESSAGE);

        assert_eq!(store.stock_of(p1), 3);
        assert_eq!(store.stock_of(p2), 4);

        let orders = store.orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total_amount, price(250));
        assert_eq!(orders[0].status, "pending");
        assert_eq!(orders[0].shipping_address, "1 Engine St, London E1 6AN");
        assert_eq!(orders[0].user_id, None);
        drop(orders);

        let items = store.items.lock().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, price(100));
        assert_eq!(items[1].quantity, 1);
        assert_eq!(items[1].price, price(50));
        drop(items);

        assert_eq!(store.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_line_exceeding_stock_and_writes_no_item_for_it() {
        let p1 = Uuid::new_v4();
        let store = MemStore::with_products(vec![(p1, "Keyboard", 1, price(100))]);

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(vec![line(p1, 2, price(100))], price(200)),
        )
        .await;

        let PlacementOutcome::Rejected { error } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(error, "Keyboard has insufficient stock (remaining: 1)");
        assert!(store.items_for(p1).is_empty());
        assert_eq!(store.stock_of(p1), 1);
    }

    #[tokio::test]
    async fn empty_cart_creates_header_with_zero_items() {
        let store = MemStore::default();

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(vec![], price(0)),
        )
        .await;

        assert!(matches!(outcome, PlacementOutcome::Placed { .. }));
        let orders = store.orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total_amount, price(0));
        drop(orders);
        assert!(store.items.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn abandon_mode_keeps_earlier_lines_committed() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let store = MemStore::with_products(vec![
            (p1, "Keyboard", 5, price(100)),
            (p2, "Mouse", 5, price(50)),
        ]);

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(
                vec![line(p1, 1, price(100)), line(p2, 100, price(50))],
                price(5100),
            ),
        )
        .await;

        assert!(matches!(outcome, PlacementOutcome::Rejected { .. }));
        // The failed flow leaves line 1 committed: this is the documented
        // baseline, not a bug.
        assert_eq!(store.stock_of(p1), 4);
        assert_eq!(store.items_for(p1).len(), 1);
        assert!(store.items_for(p2).is_empty());
        assert_eq!(store.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn compensate_mode_unwinds_earlier_lines() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let store = MemStore::with_products(vec![
            (p1, "Keyboard", 5, price(100)),
            (p2, "Mouse", 5, price(50)),
        ]);

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Compensate,
            request(
                vec![line(p1, 1, price(100)), line(p2, 100, price(50))],
                price(5100),
            ),
        )
        .await;

        assert!(matches!(outcome, PlacementOutcome::Rejected { .. }));
        assert_eq!(store.stock_of(p1), 5);
        assert!(store.items.lock().unwrap().is_empty());
        assert!(store.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn item_insert_failure_aborts_with_generic_message() {
        let p1 = Uuid::new_v4();
        let mut store = MemStore::with_products(vec![(p1, "Keyboard", 5, price(100))]);
        store.fail_item_insert_for = Some(p1);

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(vec![line(p1, 1, price(100))], price(100)),
        )
        .await;

        let PlacementOutcome::Rejected { error } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(error, GENERIC_ORDER_ERROR);
        // Aborted before the decrement.
        assert_eq!(store.stock_of(p1), 5);
    }

    #[tokio::test]
    async fn lost_decrement_race_reports_insufficient_stock() {
        let p1 = Uuid::new_v4();
        let mut store = MemStore::with_products(vec![(p1, "Keyboard", 5, price(100))]);
        store.lose_stock_race = true;

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(vec![line(p1, 2, price(100))], price(200)),
        )
        .await;

        let PlacementOutcome::Rejected { error } = outcome else {
            panic!("expected rejection");
        };
        assert!(error.contains("Keyboard has insufficient stock"));
    }

    #[tokio::test]
    async fn captured_price_survives_catalog_price_change() {
        let p1 = Uuid::new_v4();
        let store = MemStore::with_products(vec![(p1, "Keyboard", 5, price(100))]);

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(vec![line(p1, 1, price(100))], price(100)),
        )
        .await;
        assert!(matches!(outcome, PlacementOutcome::Placed { .. }));

        store.products.lock().unwrap().get_mut(&p1).unwrap().price = price(250);

        let items = store.items_for(p1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, price(100));
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_order() {
        let p1 = Uuid::new_v4();
        let mut store = MemStore::with_products(vec![(p1, "Keyboard", 5, price(100))]);
        store.fail_notifications = true;

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(vec![line(p1, 1, price(100))], price(100)),
        )
        .await;

        assert!(matches!(outcome, PlacementOutcome::Placed { .. }));
        assert!(store.notifications.lock().unwrap().is_empty());
        assert_eq!(store.stock_of(p1), 4);
    }

    #[tokio::test]
    async fn missing_product_rejects_whole_flow() {
        let store = MemStore::default();

        let outcome = place_order(
            &store,
            &NoopViewCache,
            FailureMode::Abandon,
            request(vec![line(Uuid::new_v4(), 1, price(100))], price(100)),
        )
        .await;

        let PlacementOutcome::Rejected { error } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(error, GENERIC_ORDER_ERROR);
    }

    #[tokio::test]
    async fn successful_placement_invalidates_both_views() {
        let p1 = Uuid::new_v4();
        let store = MemStore::with_products(vec![(p1, "Keyboard", 5, price(100))]);
        let views = RecordingViewCache::default();

        place_order(
            &store,
            &views,
            FailureMode::Abandon,
            request(vec![line(p1, 1, price(100))], price(100)),
        )
        .await;

        assert_eq!(
            *views.invalidated.lock().unwrap(),
            vec![ViewId::Home, ViewId::Products]
        );
    }

    #[tokio::test]
    async fn failed_placement_leaves_views_alone() {
        let p1 = Uuid::new_v4();
        let store = MemStore::with_products(vec![(p1, "Keyboard", 0, price(100))]);
        let views = RecordingViewCache::default();

        place_order(
            &store,
            &views,
            FailureMode::Abandon,
            request(vec![line(p1, 1, price(100))], price(100)),
        )
        .await;

        assert!(views.invalidated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stock_lookup_is_idempotent_between_orders() {
        let p1 = Uuid::new_v4();
        let store = MemStore::with_products(vec![(p1, "Keyboard", 5, price(100))]);

        let first = get_product_stock(&store, p1).await.unwrap();
        let second = get_product_stock(&store, p1).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.stock, 5);
        assert_eq!(first.name, "Keyboard");
    }

    #[tokio::test]
    async fn stock_lookup_for_unknown_product_errors() {
        let store = MemStore::default();
        let err = get_product_stock(&store, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, "Product not found");
    }
}
