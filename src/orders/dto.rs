use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::services::PlacementOutcome;

/// One cart line as submitted at checkout. The price is the cart's snapshot,
/// not the catalog's current price; it is what gets recorded on the order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl CustomerInfo {
    /// The flattened form persisted on the order; the structured fields are
    /// not stored.
    pub fn shipping_address(&self) -> String {
        format!("{}, {} {}", self.address, self.city, self.postal_code)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub customer_info: CustomerInfo,
}

/// Tagged checkout result. The placement flow never raises past its
/// boundary, so this is always returned with HTTP 200.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PlacementOutcome> for PlaceOrderResponse {
    fn from(outcome: PlacementOutcome) -> Self {
        match outcome {
            PlacementOutcome::Placed { order_id, message } => Self {
                success: true,
                order_id: Some(order_id),
                message: Some(message),
                error: None,
            },
            PlacementOutcome::Rejected { error } => Self {
                success: false,
                order_id: None,
                message: None,
                error: Some(error),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
