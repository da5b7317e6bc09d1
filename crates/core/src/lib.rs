//! `storefront-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod slug;

pub use error::{DomainError, DomainResult};
pub use id::{BuyerId, CategoryId, OrderId, ProductId};
pub use slug::Slug;
