use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub stock: i32,
    pub created_at: OffsetDateTime,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
}

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.price, p.image_url, p.category_id,
           p.stock, p.created_at, c.name AS category_name
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<ProductRow>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE p.is_active = true ORDER BY p.created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_active_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ProductRow>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE p.id = $1 AND p.is_active = true"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_by_category(db: &PgPool, category_id: Uuid) -> anyhow::Result<Vec<ProductRow>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE p.category_id = $1 AND p.is_active = true
         ORDER BY p.created_at DESC"
    ))
    .bind(category_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Case-insensitive substring match over name or description.
pub async fn search_active(db: &PgPool, term: &str) -> anyhow::Result<Vec<ProductRow>> {
    let pattern = format!("%{term}%");
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE (p.name ILIKE $1 OR p.description ILIKE $1)
           AND p.is_active = true
         ORDER BY p.created_at DESC"
    ))
    .bind(pattern)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_categories(db: &PgPool) -> anyhow::Result<Vec<CategoryRow>> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        r#"
        SELECT id, name, description, image_url, created_at
        FROM categories
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
