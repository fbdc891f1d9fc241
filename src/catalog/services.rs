use tracing::error;
use uuid::Uuid;

use crate::state::AppState;
use crate::views::ViewId;

use super::dto::{CategoryView, ProductView};
use super::repo::{self, CategoryRow, ProductRow};

const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=400&h=400&fit=crop";

const UNCATEGORIZED: &str = "uncategorized";

/// Default display images keyed by category name, for products without an
/// explicit image_url.
const CATEGORY_IMAGES: &[(&str, &str)] = &[
    (
        "Smartphones",
        "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=400&h=400&fit=crop",
    ),
    (
        "Laptops",
        "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=400&h=400&fit=crop",
    ),
    (
        "Headphones",
        "https://images.unsplash.com/photo-1583394838336-acd977736f90?w=400&h=400&fit=crop",
    ),
    (
        "Shoes",
        "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=400&h=400&fit=crop",
    ),
    (
        "Watches",
        "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400&h=400&fit=crop",
    ),
    (
        "Sunglasses",
        "https://images.unsplash.com/photo-1572635196237-14b3f281503f?w=400&h=400&fit=crop",
    ),
    (
        "Cameras",
        "https://images.unsplash.com/photo-1560472354-b33ff0c44a43?w=400&h=400&fit=crop",
    ),
    (
        "Clothing",
        "https://images.unsplash.com/photo-1484704849700-f032a568e944?w=400&h=400&fit=crop",
    ),
    (
        "Bags",
        "https://images.unsplash.com/photo-1441986300917-64674bd600d8?w=400&h=400&fit=crop",
    ),
];

/// Fallback chain: explicit image_url, then the category default, then the
/// generic placeholder.
fn resolve_image(image_url: Option<&str>, category: Option<&str>) -> String {
    if let Some(url) = image_url {
        return url.to_string();
    }
    category
        .and_then(|name| CATEGORY_IMAGES.iter().find(|(key, _)| *key == name))
        .map(|(_, url)| url.to_string())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

fn to_view(row: ProductRow) -> ProductView {
    let image = resolve_image(row.image_url.as_deref(), row.category_name.as_deref());
    ProductView {
        id: row.id,
        name: row.name,
        description: row.description,
        price: row.price,
        stock: row.stock,
        category_id: row.category_id,
        category: row.category_name.unwrap_or_else(|| UNCATEGORIZED.to_string()),
        image,
        created_at: row.created_at,
    }
}

fn to_category_view(row: CategoryRow) -> CategoryView {
    CategoryView {
        id: row.id,
        name: row.name,
        description: row.description,
        image_url: row.image_url,
        created_at: row.created_at,
    }
}

/// Active products, newest first. Read through the view cache; a storage
/// error degrades to an empty listing.
pub async fn list_products(state: &AppState) -> Vec<ProductView> {
    if let Some(cached) = state.views.cached_listing(ViewId::Products) {
        return cached;
    }
    match repo::list_active(&state.db).await {
        Ok(rows) => {
            let products: Vec<ProductView> = rows.into_iter().map(to_view).collect();
            state
                .views
                .store_listing(ViewId::Products, products.clone());
            products
        }
        Err(e) => {
            error!(error = %e, "listing products failed");
            Vec::new()
        }
    }
}

pub async fn get_product(state: &AppState, id: Uuid) -> Option<ProductView> {
    match repo::get_active_by_id(&state.db, id).await {
        Ok(row) => row.map(to_view),
        Err(e) => {
            error!(error = %e, %id, "product lookup failed");
            None
        }
    }
}

pub async fn products_by_category(state: &AppState, category_id: Uuid) -> Vec<ProductView> {
    match repo::list_by_category(&state.db, category_id).await {
        Ok(rows) => rows.into_iter().map(to_view).collect(),
        Err(e) => {
            error!(error = %e, %category_id, "listing products by category failed");
            Vec::new()
        }
    }
}

pub async fn search_products(state: &AppState, term: &str) -> Vec<ProductView> {
    match repo::search_active(&state.db, term).await {
        Ok(rows) => rows.into_iter().map(to_view).collect(),
        Err(e) => {
            error!(error = %e, term, "product search failed");
            Vec::new()
        }
    }
}

pub async fn list_categories(state: &AppState) -> Vec<CategoryView> {
    match repo::list_categories(&state.db).await {
        Ok(rows) => rows.into_iter().map(to_category_view).collect(),
        Err(e) => {
            error!(error = %e, "listing categories failed");
            Vec::new()
        }
    }
}
