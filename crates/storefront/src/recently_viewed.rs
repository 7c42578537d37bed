//! Recently viewed products.
//!
//! A bounded, most-recent-first list of product summaries persisted under
//! `recently-viewed-storage`. Entries are trimmed projections of the catalog
//! record (one image, one category) to keep the stored value small.

use freshcart_core::{Category, Image, Price, Product, ProductId};
use serde::{Deserialize, Serialize};

use crate::storage::RECENTLY_VIEWED_STORAGE_KEY;
use crate::store::{Reducer, Store};

/// Maximum number of remembered products.
pub const RECENTLY_VIEWED_LIMIT: usize = 10;

/// Minimal projection of a viewed product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Price,
    #[serde(default)]
    pub regular_price: Option<Price>,
    #[serde(default)]
    pub sale_price: Option<Price>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl From<&Product> for RecentProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            regular_price: product.regular_price,
            sale_price: product.sale_price,
            image: product.primary_image().cloned(),
            category: product.primary_category().cloned(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RecentlyViewedAction {
    AddProduct(Box<RecentProduct>),
    ClearAll,
}

/// Viewing history, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentlyViewed {
    products: Vec<RecentProduct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentlyViewedSnapshot {
    #[serde(default)]
    pub products: Vec<RecentProduct>,
}

impl RecentlyViewed {
    /// Products, most recently viewed first.
    #[must_use]
    pub fn products(&self) -> &[RecentProduct] {
        &self.products
    }

    fn add(&mut self, product: RecentProduct) -> bool {
        if self.products.first() == Some(&product) {
            return false;
        }
        self.products.retain(|existing| existing.id != product.id);
        self.products.insert(0, product);
        self.products.truncate(RECENTLY_VIEWED_LIMIT);
        true
    }

    fn clear(&mut self) -> bool {
        if self.products.is_empty() {
            return false;
        }
        self.products.clear();
        true
    }
}

impl Reducer for RecentlyViewed {
    const STORAGE_KEY: &'static str = RECENTLY_VIEWED_STORAGE_KEY;
    type Action = RecentlyViewedAction;
    type Snapshot = RecentlyViewedSnapshot;

    fn reduce(&mut self, action: Self::Action) -> bool {
        match action {
            RecentlyViewedAction::AddProduct(product) => self.add(*product),
            RecentlyViewedAction::ClearAll => self.clear(),
        }
    }

    fn snapshot(&self) -> Self::Snapshot {
        RecentlyViewedSnapshot {
            products: self.products.clone(),
        }
    }

    fn restore(snapshot: Self::Snapshot) -> Self {
        let mut products: Vec<RecentProduct> = Vec::with_capacity(RECENTLY_VIEWED_LIMIT);
        for product in snapshot.products {
            if products.len() == RECENTLY_VIEWED_LIMIT {
                break;
            }
            if !products.iter().any(|p| p.id == product.id) {
                products.push(product);
            }
        }
        Self { products }
    }
}

impl Store<RecentlyViewed> {
    /// Record a product view, moving it to the front.
    pub fn add_product(&mut self, product: &Product) -> bool {
        self.dispatch(RecentlyViewedAction::AddProduct(Box::new(
            RecentProduct::from(product),
        )))
    }

    /// Forget all viewed products.
    pub fn clear_all(&mut self) -> bool {
        self.dispatch(RecentlyViewedAction::ClearAll)
    }

    /// Products, most recently viewed first.
    #[must_use]
    pub fn get_products(&self) -> &[RecentProduct] {
        self.get_state().products()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use freshcart_core::ProductPayload;

    use super::*;
    use crate::storage::{ClientStorage, MemoryStorage};

    fn product(id: i64) -> Product {
        let payload: ProductPayload = serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Produkt {id}"),
            "slug": format!("produkt-{id}"),
            "price": "10.00",
            "images": [
                {"src": format!("https://cdn.example.se/{id}-a.jpg")},
                {"src": format!("https://cdn.example.se/{id}-b.jpg")}
            ],
            "categories": [
                {"id": 1, "name": "Skafferi", "slug": "skafferi"},
                {"id": 2, "name": "Dryck", "slug": "dryck"}
            ]
        }))
        .unwrap();
        Product::try_from(payload).unwrap()
    }

    fn ids(store: &Store<RecentlyViewed>) -> Vec<i64> {
        store.get_products().iter().map(|p| p.id.as_i64()).collect()
    }

    fn store() -> Store<RecentlyViewed> {
        Store::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_most_recent_first() {
        let mut store = store();
        store.add_product(&product(1));
        store.add_product(&product(2));
        store.add_product(&product(3));
        assert_eq!(ids(&store), vec![3, 2, 1]);
    }

    #[test]
    fn test_readd_moves_to_front_without_growing() {
        let mut store = store();
        for id in 1..=3 {
            store.add_product(&product(id));
        }
        store.add_product(&product(1));
        assert_eq!(ids(&store), vec![1, 3, 2]);
    }

    #[test]
    fn test_readd_front_is_noop() {
        let mut store = store();
        store.add_product(&product(1));
        assert!(!store.add_product(&product(1)));
    }

    #[test]
    fn test_bounded_to_limit() {
        let mut store = store();
        for id in 1..=11 {
            store.add_product(&product(id));
        }
        assert_eq!(store.get_products().len(), RECENTLY_VIEWED_LIMIT);
        assert_eq!(ids(&store).first(), Some(&11));
        // The oldest (1) was evicted
        assert!(!ids(&store).contains(&1));
    }

    #[test]
    fn test_projection_keeps_single_image_and_category() {
        let recent = RecentProduct::from(&product(4));
        assert_eq!(recent.image.unwrap().src, "https://cdn.example.se/4-a.jpg");
        assert_eq!(recent.category.unwrap().slug, "skafferi");
    }

    #[test]
    fn test_clear_all() {
        let mut store = store();
        store.add_product(&product(1));
        assert!(store.clear_all());
        assert!(store.get_products().is_empty());
        assert!(!store.clear_all());
    }

    #[test]
    fn test_persisted_and_hydrated() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = Store::<RecentlyViewed>::new(storage.clone());
        store.add_product(&product(1));
        store.add_product(&product(2));

        let raw = storage.get_item(RECENTLY_VIEWED_STORAGE_KEY).unwrap().unwrap();
        assert!(raw.contains("produkt-2"));
        // Only the trimmed projection is stored
        assert!(!raw.contains("2-b.jpg"));
        assert!(!raw.contains("dryck"));

        let hydrated = Store::<RecentlyViewed>::hydrate(storage);
        assert_eq!(ids(&hydrated), vec![2, 1]);
    }

    #[test]
    fn test_restore_dedupes_and_truncates() {
        let mut products: Vec<RecentProduct> =
            (1..=12).map(|id| RecentProduct::from(&product(id))).collect();
        products.insert(1, RecentProduct::from(&product(1)));

        let state = RecentlyViewed::restore(RecentlyViewedSnapshot { products });
        let ids: Vec<i64> = state.products().iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }
}
