//! Postgres-backed stores.
//!
//! Schema is applied idempotently via [`ensure_schema`]; every query binds
//! typed parameters and maps rows by column name.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use storefront_catalog::{Category, Photo, Product};
use storefront_core::{CategoryId, OrderId, ProductId, Slug};
use storefront_orders::{CartLine, Order, PaymentRecord};

use super::r#trait::{
    CatalogStore, ImageBlobStore, OrderStore, PriceRange, StoreError,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS products (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL,
    description TEXT NOT NULL,
    price       BIGINT NOT NULL,
    category_id UUID NOT NULL,
    quantity    INTEGER NOT NULL,
    shipping    BOOLEAN NOT NULL,
    photo_count INTEGER NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS products_created_at_idx ON products (created_at DESC);
CREATE INDEX IF NOT EXISTS products_category_idx ON products (category_id);

CREATE TABLE IF NOT EXISTS product_photos (
    product_id   UUID NOT NULL,
    idx          INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    data         BYTEA NOT NULL,
    PRIMARY KEY (product_id, idx)
);

CREATE TABLE IF NOT EXISTS orders (
    id         UUID PRIMARY KEY,
    buyer_id   UUID NOT NULL,
    lines      JSONB NOT NULL,
    payment    JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
"#;

/// Apply the schema (idempotent).
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| StoreError::backend(e.to_string()))?;
    Ok(())
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::backend(e.to_string())
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id").map_err(backend)?),
        name: row.try_get("name").map_err(backend)?,
        slug: Slug::from_raw(row.try_get::<String, _>("slug").map_err(backend)?),
        description: row.try_get("description").map_err(backend)?,
        price: row.try_get::<i64, _>("price").map_err(backend)? as u64,
        category: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id").map_err(backend)?),
        quantity: row.try_get::<i32, _>("quantity").map_err(backend)? as u32,
        shipping: row.try_get("shipping").map_err(backend)?,
        photo_count: row.try_get::<i32, _>("photo_count").map_err(backend)? as u32,
        created_at: row.try_get("created_at").map_err(backend)?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, name, slug, description, price, category_id, quantity, shipping, photo_count, created_at";

/// Postgres catalog store.
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, slug, description, price, category_id, quantity, shipping, photo_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.price as i64)
        .bind(product.category.as_uuid())
        .bind(product.quantity as i32)
        .bind(product.shipping)
        .bind(product.photo_count as i32)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2, slug = $3, description = $4, price = $5,
                category_id = $6, quantity = $7, shipping = $8, photo_count = $9
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.price as i64)
        .bind(product.category.as_uuid())
        .bind(product.quantity as i32)
        .bind(product.shipping)
        .bind(product.photo_count as i32)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self, limit: u32) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(product_from_row).collect()
    }

    async fn page_products(&self, offset: u64, limit: u32) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC OFFSET $1 LIMIT $2"
        ))
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(product_from_row).collect()
    }

    async fn filter_products(
        &self,
        categories: &[CategoryId],
        price: Option<PriceRange>,
    ) -> Result<Vec<Product>, StoreError> {
        let category_uuids: Vec<Uuid> = categories.iter().map(|c| *c.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE (cardinality($1::uuid[]) = 0 OR category_id = ANY($1))
              AND ($2::bigint IS NULL OR price >= $2)
              AND ($3::bigint IS NULL OR price <= $3)
            ORDER BY created_at DESC
            "#
        ))
        .bind(&category_uuids)
        .bind(price.map(|r| r.min as i64))
        .bind(price.map(|r| r.max as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(product_from_row).collect()
    }

    async fn search_products(&self, keyword: &str) -> Result<Vec<Product>, StoreError> {
        // ILIKE pattern; escape the LIKE metacharacters in user input.
        let escaped = keyword.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE name ILIKE $1 OR description ILIKE $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(format!("%{escaped}%"))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(product_from_row).collect()
    }

    async fn related_products(
        &self,
        product: ProductId,
        category: CategoryId,
        limit: u32,
    ) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE category_id = $1 AND id <> $2
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(category.as_uuid())
        .bind(product.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(product_from_row).collect()
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        let total: i64 = row.try_get("total").map_err(backend)?;
        Ok(total as u64)
    }

    async fn category_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name, slug FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(|r| {
            Ok(Category {
                id: CategoryId::from_uuid(r.try_get::<Uuid, _>("id").map_err(backend)?),
                name: r.try_get("name").map_err(backend)?,
                slug: Slug::from_raw(r.try_get::<String, _>("slug").map_err(backend)?),
            })
        })
        .transpose()
    }

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name, slug FROM categories WHERE slug = $1")
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(|r| {
            Ok(Category {
                id: CategoryId::from_uuid(r.try_get::<Uuid, _>("id").map_err(backend)?),
                name: r.try_get("name").map_err(backend)?,
                slug: Slug::from_raw(r.try_get::<String, _>("slug").map_err(backend)?),
            })
        })
        .transpose()
    }

    async fn products_in_category(&self, id: CategoryId) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 ORDER BY created_at DESC"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(product_from_row).collect()
    }

    async fn upsert_category(&self, category: Category) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, slug = EXCLUDED.slug
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(category.slug.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

/// Postgres order store. Insert-only, matching the order lifecycle.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let lines = serde_json::to_value(&order.lines)
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let payment = serde_json::to_value(&order.payment)
            .map_err(|e| StoreError::backend(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, lines, payment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.buyer.as_uuid())
        .bind(lines)
        .bind(payment)
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            "SELECT id, buyer_id, lines, payment, created_at FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|r| {
            let lines: Vec<CartLine> = serde_json::from_value(
                r.try_get::<serde_json::Value, _>("lines").map_err(backend)?,
            )
            .map_err(|e| StoreError::backend(e.to_string()))?;
            let payment: PaymentRecord = serde_json::from_value(
                r.try_get::<serde_json::Value, _>("payment").map_err(backend)?,
            )
            .map_err(|e| StoreError::backend(e.to_string()))?;
            Ok(Order {
                id: OrderId::from_uuid(r.try_get::<Uuid, _>("id").map_err(backend)?),
                buyer: storefront_core::BuyerId::from_uuid(
                    r.try_get::<Uuid, _>("buyer_id").map_err(backend)?,
                ),
                lines,
                payment,
                created_at: r.try_get("created_at").map_err(backend)?,
            })
        })
        .transpose()
    }
}

/// Postgres blob store for product photos.
pub struct PostgresBlobStore {
    pool: PgPool,
}

impl PostgresBlobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageBlobStore for PostgresBlobStore {
    async fn put_photos(&self, product: ProductId, photos: Vec<Photo>) -> Result<(), StoreError> {
        // Replace the whole sequence atomically.
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query("DELETE FROM product_photos WHERE product_id = $1")
            .bind(product.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        for (idx, photo) in photos.into_iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_photos (product_id, idx, content_type, data) VALUES ($1, $2, $3, $4)",
            )
            .bind(product.as_uuid())
            .bind(idx as i32)
            .bind(&photo.content_type)
            .bind(&photo.data)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn photo(&self, product: ProductId, index: u32) -> Result<Option<Photo>, StoreError> {
        let row = sqlx::query(
            "SELECT content_type, data FROM product_photos WHERE product_id = $1 AND idx = $2",
        )
        .bind(product.as_uuid())
        .bind(index as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(|r| {
            Ok(Photo {
                content_type: r.try_get("content_type").map_err(backend)?,
                data: r.try_get("data").map_err(backend)?,
            })
        })
        .transpose()
    }

    async fn photos(&self, product: ProductId) -> Result<Vec<Photo>, StoreError> {
        let rows = sqlx::query(
            "SELECT content_type, data FROM product_photos WHERE product_id = $1 ORDER BY idx",
        )
        .bind(product.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter()
            .map(|r| {
                Ok(Photo {
                    content_type: r.try_get("content_type").map_err(backend)?,
                    data: r.try_get("data").map_err(backend)?,
                })
            })
            .collect()
    }

    async fn clear(&self, product: ProductId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM product_photos WHERE product_id = $1")
            .bind(product.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
