use thiserror::Error;
use uuid::Uuid;

/// The message end users see for anything other than an insufficient-stock
/// rejection; operator detail only goes to the log.
pub const GENERIC_ORDER_ERROR: &str = "an error occurred while ordering";

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("failed to create order: {cause}")]
    OrderCreate { cause: anyhow::Error },

    #[error("product {product_id} lookup failed: {cause}")]
    ProductLookup {
        product_id: Uuid,
        cause: anyhow::Error,
    },

    #[error("{name} has insufficient stock (remaining: {remaining})")]
    InsufficientStock { name: String, remaining: i32 },

    #[error("failed to create order item for product {product_id}: {cause}")]
    OrderItemInsert {
        product_id: Uuid,
        cause: anyhow::Error,
    },

    #[error("failed to update stock for product {product_id}: {cause}")]
    StockUpdate {
        product_id: Uuid,
        cause: anyhow::Error,
    },
}

impl OrderError {
    /// Only the insufficient-stock rejection is distinguishable to the end
    /// user; everything else collapses to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            OrderError::InsufficientStock { .. } => self.to_string(),
            _ => GENERIC_ORDER_ERROR.to_string(),
        }
    }
}
