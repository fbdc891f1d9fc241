use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A product as the storefront pages consume it: catalog row enriched with a
/// resolved display image and category name. Computed at read time, never
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub category: String,
    pub image: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}
