use async_trait::async_trait;
use thiserror::Error;

use storefront_catalog::{Category, Photo, Product};
use storefront_core::{CategoryId, ProductId, Slug};
use storefront_orders::Order;

/// Store operation error.
///
/// These are **infrastructure** failures. Domain outcomes (a lookup that
/// legitimately finds nothing) are modeled as `Ok(None)` / `NotFound` where
/// the operation targets a specific record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted record does not exist (update/delete of a missing id).
    #[error("record not found")]
    NotFound,

    /// The storage backend failed (connection, query, serialization).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Inclusive price bounds in smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

/// Persistence boundary for product and category records.
///
/// Query primitives only; validation and orchestration live in the service
/// layer. "Newest first" means descending `created_at`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError>;

    /// Full replace of an existing record. `NotFound` if the id is unknown.
    async fn update_product(&self, product: Product) -> Result<(), StoreError>;

    /// Hard delete. `NotFound` if the id is unknown.
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, StoreError>;

    /// Up to `limit` products, newest first.
    async fn list_products(&self, limit: u32) -> Result<Vec<Product>, StoreError>;

    /// Newest-first window for pagination.
    async fn page_products(&self, offset: u64, limit: u32) -> Result<Vec<Product>, StoreError>;

    /// Category and price constraints, AND-combined. An empty category set
    /// applies no category constraint; `None` price range applies none.
    async fn filter_products(
        &self,
        categories: &[CategoryId],
        price: Option<PriceRange>,
    ) -> Result<Vec<Product>, StoreError>;

    /// Case-insensitive substring match over name OR description.
    async fn search_products(&self, keyword: &str) -> Result<Vec<Product>, StoreError>;

    /// Products sharing `category`, excluding `product`, up to `limit`.
    async fn related_products(
        &self,
        product: ProductId,
        category: CategoryId,
        limit: u32,
    ) -> Result<Vec<Product>, StoreError>;

    /// Total product count. Approximate counts are acceptable.
    async fn count_products(&self) -> Result<u64, StoreError>;

    async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, StoreError>;

    async fn products_in_category(&self, id: CategoryId) -> Result<Vec<Product>, StoreError>;

    /// Seed or refresh a category record (categories are otherwise owned by
    /// an external collaborator).
    async fn upsert_category(&self, category: Category) -> Result<(), StoreError>;
}

/// Order-persistence counterpart of [`CatalogStore`].
///
/// Orders are written exactly once per successful checkout attempt and are
/// never updated or deleted by this core.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: Order) -> Result<(), StoreError>;

    async fn order_by_id(
        &self,
        id: storefront_core::OrderId,
    ) -> Result<Option<Order>, StoreError>;
}

/// Binary image payloads keyed to a product, with content-type metadata.
///
/// The sequence is index-addressed; index 0 is the "main" photo.
#[async_trait]
pub trait ImageBlobStore: Send + Sync {
    /// Replace the product's entire photo sequence.
    async fn put_photos(&self, product: ProductId, photos: Vec<Photo>) -> Result<(), StoreError>;

    /// One photo by index; `Ok(None)` when the index is out of range.
    async fn photo(&self, product: ProductId, index: u32) -> Result<Option<Photo>, StoreError>;

    /// The full stored sequence (empty if the product has no photos).
    async fn photos(&self, product: ProductId) -> Result<Vec<Photo>, StoreError>;

    /// Drop all photos for a product. Clearing an unknown product is a no-op.
    async fn clear(&self, product: ProductId) -> Result<(), StoreError>;
}
