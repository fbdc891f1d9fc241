use std::collections::HashMap;
use std::sync::RwLock;

use crate::catalog::dto::ProductView;

/// Cached page-level views that go stale when stock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Home,
    Products,
}

/// Explicit collaborator for the catalog view cache. The order placement
/// flow only ever calls `invalidate`; the catalog read path populates and
/// consults the cached listings.
pub trait ViewCache: Send + Sync {
    fn cached_listing(&self, view: ViewId) -> Option<Vec<ProductView>>;
    fn store_listing(&self, view: ViewId, products: Vec<ProductView>);
    fn invalidate(&self, view: ViewId);
}

/// In-process cache of product listings keyed by view.
pub struct CatalogViewCache {
    listings: RwLock<HashMap<ViewId, Vec<ProductView>>>,
}

impl CatalogViewCache {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for CatalogViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCache for CatalogViewCache {
    fn cached_listing(&self, view: ViewId) -> Option<Vec<ProductView>> {
        self.listings
            .read()
            .ok()
            .and_then(|guard| guard.get(&view).cloned())
    }

    fn store_listing(&self, view: ViewId, products: Vec<ProductView>) {
        if let Ok(mut guard) = self.listings.write() {
            guard.insert(view, products);
        }
    }

    fn invalidate(&self, view: ViewId) {
        if let Ok(mut guard) = self.listings.write() {
            guard.remove(&view);
        }
    }
}

/// Cache that remembers nothing; used in tests.
pub struct NoopViewCache;

impl ViewCache for NoopViewCache {
    fn cached_listing(&self, _view: ViewId) -> Option<Vec<ProductView>> {
        None
    }

    fn store_listing(&self, _view: ViewId, _products: Vec<ProductView>) {}

    fn invalidate(&self, _view: ViewId) {}
}
