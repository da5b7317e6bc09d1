use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use storefront_catalog::{Category, Photo, Product};
use storefront_core::{CategoryId, OrderId, ProductId, Slug};
use storefront_orders::Order;

use super::r#trait::{
    CatalogStore, ImageBlobStore, OrderStore, PriceRange, StoreError,
};

fn poisoned(_: impl std::fmt::Debug) -> StoreError {
    StoreError::backend("lock poisoned")
}

/// Newest-first ordering shared by every listing primitive.
fn sort_newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<ProductId, Product>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        self.products
            .write()
            .map_err(poisoned)?
            .insert(product.id, product);
        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(poisoned)?;
        match products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.products
            .write()
            .map_err(poisoned)?
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .read()
            .map_err(poisoned)?
            .values()
            .find(|p| &p.slug == slug)
            .cloned())
    }

    async fn list_products(&self, limit: u32) -> Result<Vec<Product>, StoreError> {
        let mut all: Vec<Product> = self
            .products
            .read()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        sort_newest_first(&mut all);
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn page_products(&self, offset: u64, limit: u32) -> Result<Vec<Product>, StoreError> {
        let mut all: Vec<Product> = self
            .products
            .read()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        sort_newest_first(&mut all);
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn filter_products(
        &self,
        categories: &[CategoryId],
        price: Option<PriceRange>,
    ) -> Result<Vec<Product>, StoreError> {
        let mut hits: Vec<Product> = self
            .products
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|p| categories.is_empty() || categories.contains(&p.category))
            .filter(|p| price.is_none_or(|r| p.price >= r.min && p.price <= r.max))
            .cloned()
            .collect();
        sort_newest_first(&mut hits);
        Ok(hits)
    }

    async fn search_products(&self, keyword: &str) -> Result<Vec<Product>, StoreError> {
        let needle = keyword.to_lowercase();
        let mut hits: Vec<Product> = self
            .products
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        sort_newest_first(&mut hits);
        Ok(hits)
    }

    async fn related_products(
        &self,
        product: ProductId,
        category: CategoryId,
        limit: u32,
    ) -> Result<Vec<Product>, StoreError> {
        let mut hits: Vec<Product> = self
            .products
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|p| p.category == category && p.id != product)
            .cloned()
            .collect();
        sort_newest_first(&mut hits);
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        Ok(self.products.read().map_err(poisoned)?.len() as u64)
    }

    async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, StoreError> {
        Ok(self
            .categories
            .read()
            .map_err(poisoned)?
            .values()
            .find(|c| &c.slug == slug)
            .cloned())
    }

    async fn products_in_category(&self, id: CategoryId) -> Result<Vec<Product>, StoreError> {
        let mut hits: Vec<Product> = self
            .products
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|p| p.category == id)
            .cloned()
            .collect();
        sort_newest_first(&mut hits);
        Ok(hits)
    }

    async fn upsert_category(&self, category: Category) -> Result<(), StoreError> {
        self.categories
            .write()
            .map_err(poisoned)?
            .insert(category.id, category);
        Ok(())
    }
}

/// In-memory order store. Appends only; exposes the full log for tests.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every persisted order, in insertion order.
    pub fn all(&self) -> Vec<Order> {
        self.orders.read().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        self.orders.write().map_err(poisoned)?.push(order);
        Ok(())
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }
}

/// In-memory blob store, keyed by product id with index-addressed photos.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    photos: RwLock<HashMap<ProductId, Vec<Photo>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageBlobStore for InMemoryBlobStore {
    async fn put_photos(&self, product: ProductId, photos: Vec<Photo>) -> Result<(), StoreError> {
        self.photos.write().map_err(poisoned)?.insert(product, photos);
        Ok(())
    }

    async fn photo(&self, product: ProductId, index: u32) -> Result<Option<Photo>, StoreError> {
        Ok(self
            .photos
            .read()
            .map_err(poisoned)?
            .get(&product)
            .and_then(|seq| seq.get(index as usize))
            .cloned())
    }

    async fn photos(&self, product: ProductId) -> Result<Vec<Photo>, StoreError> {
        Ok(self
            .photos
            .read()
            .map_err(poisoned)?
            .get(&product)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear(&self, product: ProductId) -> Result<(), StoreError> {
        self.photos.write().map_err(poisoned)?.remove(&product);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use storefront_catalog::ProductDraft;

    fn product(name: &str, category: CategoryId, price: u64, age_secs: i64) -> Product {
        let draft = ProductDraft {
            name: Some(name.to_string()),
            description: Some(format!("{name} description")),
            price: Some(price),
            category: Some(category),
            quantity: Some(5),
            shipping: false,
        };
        Product::create(
            ProductId::new(),
            &draft,
            &[],
            Utc::now() - Duration::seconds(age_secs),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn update_and_delete_unknown_product_report_not_found() {
        let store = InMemoryCatalogStore::new();
        let ghost = product("Ghost", CategoryId::new(), 10, 0);
        assert!(matches!(
            store.update_product(ghost.clone()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete_product(ghost.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_bounded() {
        let store = InMemoryCatalogStore::new();
        let cat = CategoryId::new();
        for (i, name) in ["Oldest", "Middle", "Newest"].iter().enumerate() {
            // Larger age = older record.
            store
                .insert_product(product(name, cat, 10, 100 - i as i64 * 10))
                .await
                .unwrap();
        }
        let listed = store.list_products(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Newest");
        assert_eq!(listed[1].name, "Middle");
    }

    #[tokio::test]
    async fn filter_combines_category_and_inclusive_price() {
        let store = InMemoryCatalogStore::new();
        let wanted = CategoryId::new();
        let other = CategoryId::new();
        store.insert_product(product("In both", wanted, 15, 0)).await.unwrap();
        store.insert_product(product("Low edge", wanted, 10, 1)).await.unwrap();
        store.insert_product(product("High edge", wanted, 20, 2)).await.unwrap();
        store.insert_product(product("Too cheap", wanted, 9, 3)).await.unwrap();
        store.insert_product(product("Wrong category", other, 15, 4)).await.unwrap();

        let hits = store
            .filter_products(&[wanted], Some(PriceRange { min: 10, max: 20 }))
            .await
            .unwrap();
        let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["In both", "Low edge", "High edge"]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_name_and_description() {
        let store = InMemoryCatalogStore::new();
        let cat = CategoryId::new();
        store.insert_product(product("Laptop Stand", cat, 10, 0)).await.unwrap();
        store.insert_product(product("Desk Mat", cat, 10, 1)).await.unwrap();

        let by_name = store.search_products("LAPTOP").await.unwrap();
        assert_eq!(by_name.len(), 1);

        // "description" appears in every generated description.
        let by_description = store.search_products("DESCRIPTION").await.unwrap();
        assert_eq!(by_description.len(), 2);
    }

    #[tokio::test]
    async fn related_excludes_the_anchor_product() {
        let store = InMemoryCatalogStore::new();
        let cat = CategoryId::new();
        let anchor = product("Anchor", cat, 10, 0);
        let anchor_id = anchor.id;
        store.insert_product(anchor).await.unwrap();
        for i in 0..5 {
            store
                .insert_product(product(&format!("Sibling {i}"), cat, 10, i + 1))
                .await
                .unwrap();
        }
        let related = store.related_products(anchor_id, cat, 3).await.unwrap();
        assert_eq!(related.len(), 3);
        assert!(related.iter().all(|p| p.id != anchor_id));
    }

    #[tokio::test]
    async fn blob_store_round_trips_and_replaces() {
        let store = InMemoryBlobStore::new();
        let pid = ProductId::new();
        let first = Photo::new(vec![1, 2, 3], "image/png");
        let second = Photo::new(vec![4, 5], "image/jpeg");
        store
            .put_photos(pid, vec![first.clone(), second.clone()])
            .await
            .unwrap();

        assert_eq!(store.photo(pid, 0).await.unwrap(), Some(first));
        assert_eq!(store.photo(pid, 1).await.unwrap(), Some(second.clone()));
        assert_eq!(store.photo(pid, 2).await.unwrap(), None);

        store.put_photos(pid, vec![second.clone()]).await.unwrap();
        assert_eq!(store.photos(pid).await.unwrap(), vec![second]);

        store.clear(pid).await.unwrap();
        assert_eq!(store.photo(pid, 0).await.unwrap(), None);
    }
}
