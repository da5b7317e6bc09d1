//! `storefront-catalog` — product and category domain model.
//!
//! Pure domain logic: input validation, slug derivation, photo size limits.
//! Persistence and blob storage live in `storefront-infra`.

pub mod category;
pub mod product;

pub use category::Category;
pub use product::{MAX_PHOTO_BYTES, Photo, Product, ProductDraft};
