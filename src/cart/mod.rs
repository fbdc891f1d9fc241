//! Client-held cart aggregate: a pure state machine over (product, quantity)
//! pairs. Never touches storage; stock is only enforced at order placement.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::catalog::dto::ProductView;
use crate::orders::dto::OrderLine;

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product: ProductView,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Adds `quantity` of a product, merging with an existing entry.
    pub fn add(&mut self, product: ProductView, quantity: u32) {
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity += quantity;
        } else {
            self.items.push(CartItem { product, quantity });
        }
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.items.retain(|i| i.product.id != product_id);
    }

    /// Quantity zero behaves as removal.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.product.price * Decimal::from(i.quantity))
            .sum()
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Snapshot of the cart as checkout submission lines, prices captured as
    /// they are in the cart.
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|i| OrderLine {
                product_id: i.product.id,
                quantity: i.quantity as i32,
                price: i.product.price,
            })
            .collect()
    }
}
