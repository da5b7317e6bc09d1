use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, Slug};

/// Category record.
///
/// Categories are owned by an external collaborator (category CRUD is out of
/// scope); the catalog only reads them and references them from products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>, slug: Slug) -> Self {
        Self {
            id,
            name: name.into(),
            slug,
        }
    }
}
