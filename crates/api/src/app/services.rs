use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use storefront_catalog::{Category, Photo, Product, ProductDraft};
use storefront_core::{BuyerId, CategoryId, DomainError, OrderId, ProductId, Slug};
use storefront_infra::gateway::{ClientToken, GatewayError, PaymentGateway};
use storefront_infra::store::{
    CatalogStore, ImageBlobStore, OrderStore, PriceRange, StoreError,
};
use storefront_orders::{
    CartLine, CheckoutState, Order, PaymentMethod, cart_total,
};

/// Number of products a "related products" query returns.
pub const RELATED_LIMIT: u32 = 3;

/// Products per page for `GET /products/list/:page`.
pub const PAGE_SIZE: u32 = 6;

/// Summary cap for `GET /products`.
pub const LIST_LIMIT: u32 = 12;

/// Failure of a service operation, resolved to an HTTP status at the
/// handler boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Validates and mutates products, orchestrating blob writes around the
/// catalog record.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    blobs: Arc<dyn ImageBlobStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, blobs: Arc<dyn ImageBlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Validate, store photos, persist the record.
    ///
    /// Validation runs before any write, so a rejected request leaves zero
    /// photos and zero records behind. Blob and record writes are not
    /// transactional across stores; a record-insert failure can strand the
    /// just-written blobs (accepted gap, logged).
    pub async fn create(
        &self,
        draft: &ProductDraft,
        photos: Vec<Photo>,
    ) -> Result<Product, ServiceError> {
        let product = Product::create(ProductId::new(), draft, &photos, Utc::now())?;

        if !photos.is_empty() {
            self.blobs.put_photos(product.id, photos).await?;
        }
        if let Err(e) = self.store.insert_product(product.clone()).await {
            tracing::warn!(product_id = %product.id, error = %e, "record insert failed after blob write");
            return Err(e.into());
        }

        tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    /// Full replace of the mutable fields; a non-empty photo set replaces
    /// the entire stored sequence.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        photos: Vec<Photo>,
    ) -> Result<Product, ServiceError> {
        let mut product = self
            .store
            .product_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)?;

        product.apply_update(draft, &photos)?;

        if !photos.is_empty() {
            self.blobs.put_photos(id, photos).await?;
        }
        self.store.update_product(product.clone()).await?;

        tracing::info!(product_id = %id, slug = %product.slug, "product updated");
        Ok(product)
    }

    /// Hard delete of the record. Photo blobs are cleared best-effort;
    /// failures there are logged, not surfaced.
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        self.store.delete_product(id).await?;
        if let Err(e) = self.blobs.clear(id).await {
            tracing::warn!(product_id = %id, error = %e, "photo cleanup failed after delete");
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn get_by_id(
        &self,
        id: ProductId,
        include_photos: bool,
    ) -> Result<(Product, Option<Vec<Photo>>), ServiceError> {
        let product = self
            .store
            .product_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let photos = if include_photos {
            Some(self.blobs.photos(id).await?)
        } else {
            None
        };
        Ok((product, photos))
    }

    /// Product plus its category, photos excluded.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<(Product, Option<Category>), ServiceError> {
        let product = self
            .store
            .product_by_slug(slug)
            .await?
            .ok_or(DomainError::NotFound)?;
        let category = self.store.category_by_id(product.category).await?;
        Ok((product, category))
    }

    /// Up to [`LIST_LIMIT`] products, newest first, photos excluded.
    pub async fn list_summaries(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list_products(LIST_LIMIT).await?)
    }

    /// Photo by index; index 0 is the main photo. An unknown product or an
    /// out-of-range index is `NotFound`, never an empty body.
    pub async fn photo(&self, id: ProductId, index: u32) -> Result<Photo, ServiceError> {
        if self.store.product_by_id(id).await?.is_none() {
            return Err(DomainError::NotFound.into());
        }
        self.blobs
            .photo(id, index)
            .await?
            .ok_or_else(|| DomainError::NotFound.into())
    }
}

/// Category/price filters, free-text search, related products, pagination.
pub struct SearchFilterService {
    store: Arc<dyn CatalogStore>,
}

impl SearchFilterService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// AND-combination of an optional category set and an optional
    /// inclusive price range.
    pub async fn filter(
        &self,
        categories: &[CategoryId],
        price: Option<PriceRange>,
    ) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.filter_products(categories, price).await?)
    }

    /// Case-insensitive substring search over name OR description. An
    /// empty keyword is rejected rather than matching everything.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Product>, ServiceError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(DomainError::validation("Keyword is Required").into());
        }
        Ok(self.store.search_products(keyword).await?)
    }

    /// Up to [`RELATED_LIMIT`] products of the same category, excluding the
    /// product itself.
    pub async fn related_to(
        &self,
        product: ProductId,
        category: CategoryId,
    ) -> Result<Vec<Product>, ServiceError> {
        Ok(self
            .store
            .related_products(product, category, RELATED_LIMIT)
            .await?)
    }

    /// 1-indexed page of [`PAGE_SIZE`] products, newest first. Page 0 or
    /// below is normalized to page 1.
    pub async fn page(&self, page: i64) -> Result<Vec<Product>, ServiceError> {
        let page = page.max(1) as u64;
        let offset = (page - 1) * PAGE_SIZE as u64;
        Ok(self.store.page_products(offset, PAGE_SIZE).await?)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.store.count_products().await?)
    }

    pub async fn by_category_slug(
        &self,
        slug: &Slug,
    ) -> Result<(Category, Vec<Product>), ServiceError> {
        let category = self
            .store
            .category_by_slug(slug)
            .await?
            .ok_or(DomainError::NotFound)?;
        let products = self.store.products_in_category(category.id).await?;
        Ok((category, products))
    }
}

/// Outcome of a settled checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleOutcome {
    pub order: Order,
    pub state: CheckoutState,
}

/// Reconciles a checkout attempt: computes the total, routes COD past the
/// gateway, submits card payments for settlement, and persists exactly one
/// order on success.
pub struct CheckoutService {
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CheckoutService {
    pub fn new(orders: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { orders, gateway }
    }

    pub async fn client_token(&self) -> Result<ClientToken, ServiceError> {
        Ok(self.gateway.generate_token().await?)
    }

    /// Settle one checkout attempt.
    ///
    /// COD strictly terminates the flow: the gateway is never invoked and
    /// one pending order is persisted. The card path submits exactly one
    /// sale; a gateway failure is terminal and persists nothing.
    pub async fn settle(
        &self,
        lines: Vec<CartLine>,
        buyer: BuyerId,
        method: PaymentMethod,
        nonce: Option<&str>,
    ) -> Result<SettleOutcome, ServiceError> {
        if lines.is_empty() {
            return Err(DomainError::validation("Cart is Empty").into());
        }

        let total = cart_total(&lines);
        let state = CheckoutState::Received;

        match method {
            PaymentMethod::CashOnDelivery => {
                let state = state.transition(CheckoutState::CodPending)?;
                let order = Order::cash_on_delivery(OrderId::new(), lines, buyer, Utc::now())?;
                if let Err(e) = self.orders.insert_order(order.clone()).await {
                    state.transition(CheckoutState::Failed)?;
                    return Err(e.into());
                }
                let state = state.transition(CheckoutState::Settled)?;
                tracing::info!(order_id = %order.id, total, "cash-on-delivery order placed");
                Ok(SettleOutcome { order, state })
            }
            PaymentMethod::Card => {
                let state = state.transition(CheckoutState::GatewaySubmitted)?;
                let receipt = match self.gateway.sale(total, nonce.unwrap_or_default()).await {
                    Ok(receipt) => receipt,
                    Err(e) => {
                        state.transition(CheckoutState::Failed)?;
                        tracing::warn!(total, error = %e, "gateway sale failed");
                        return Err(e.into());
                    }
                };
                let order = Order::card(OrderId::new(), lines, receipt, buyer, Utc::now())?;
                if let Err(e) = self.orders.insert_order(order.clone()).await {
                    state.transition(CheckoutState::Failed)?;
                    return Err(e.into());
                }
                let state = state.transition(CheckoutState::Settled)?;
                tracing::info!(order_id = %order.id, total, "card order settled");
                Ok(SettleOutcome { order, state })
            }
        }
    }
}

/// Service facade shared by every handler.
pub struct AppServices {
    pub catalog: CatalogService,
    pub search: SearchFilterService,
    pub checkout: CheckoutService,
}

impl AppServices {
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        blob_store: Arc<dyn ImageBlobStore>,
        order_store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            catalog: CatalogService::new(catalog_store.clone(), blob_store),
            search: SearchFilterService::new(catalog_store),
            checkout: CheckoutService::new(order_store, gateway),
        }
    }
}
