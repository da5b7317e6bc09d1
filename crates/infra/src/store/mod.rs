pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
mod r#trait;

pub use in_memory::{InMemoryBlobStore, InMemoryCatalogStore, InMemoryOrderStore};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresBlobStore, PostgresCatalogStore, PostgresOrderStore, ensure_schema};
pub use r#trait::{CatalogStore, ImageBlobStore, OrderStore, PriceRange, StoreError};
