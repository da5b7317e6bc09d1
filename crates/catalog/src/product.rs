use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, ProductId, Slug};

/// Per-photo size ceiling at ingestion time, in bytes.
pub const MAX_PHOTO_BYTES: usize = 1_000_000;

/// A binary image payload with its content-type metadata.
///
/// Photos are validated here but stored through the blob store boundary,
/// not inline with the product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl Photo {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    pub fn is_oversized(&self) -> bool {
        self.data.len() > MAX_PHOTO_BYTES
    }
}

/// Raw product input as it arrives at the service boundary.
///
/// Every field the caller may omit is an `Option`; `Product::create` and
/// `Product::apply_update` run the presence checks in a fixed order and
/// short-circuit on the first failure, so callers receive exactly one error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Price in smallest currency unit (e.g. cents). Must be positive.
    pub price: Option<u64>,
    pub category: Option<CategoryId>,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub shipping: bool,
}

/// Validated draft fields, produced only by [`ProductDraft::validate`].
struct ValidatedDraft {
    name: String,
    description: String,
    price: u64,
    category: CategoryId,
    quantity: u32,
    shipping: bool,
}

impl ProductDraft {
    /// Ordered validation: field presence first (name, description, price,
    /// category, quantity), then the oversized-photo check. The first
    /// failing check wins; errors are never aggregated.
    fn validate(&self, photos: &[Photo]) -> Result<ValidatedDraft, DomainError> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => return Err(DomainError::validation("Name is Required")),
        };
        let description = match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => return Err(DomainError::validation("Description is Required")),
        };
        let price = match self.price {
            Some(p) if p > 0 => p,
            _ => return Err(DomainError::validation("Price is Required")),
        };
        let category = self
            .category
            .ok_or_else(|| DomainError::validation("Category is Required"))?;
        let quantity = self
            .quantity
            .ok_or_else(|| DomainError::validation("Quantity is Required"))?;

        if photos.iter().any(Photo::is_oversized) {
            return Err(DomainError::validation(
                "Each photo should be less than 1mb",
            ));
        }

        Ok(ValidatedDraft {
            name,
            description,
            price,
            category,
            quantity,
            shipping: self.shipping,
        })
    }
}

/// Product record.
///
/// Photo payloads live in the blob store; the record only tracks how many
/// photos exist so listings never drag binary data along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    /// Price in smallest currency unit (e.g. cents).
    pub price: u64,
    pub category: CategoryId,
    pub quantity: u32,
    pub shipping: bool,
    pub photo_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Validate a draft and build a new product.
    ///
    /// The slug is derived from the name; `photos` are validated here but
    /// persisted by the caller through the blob store.
    pub fn create(
        id: ProductId,
        draft: &ProductDraft,
        photos: &[Photo],
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let v = draft.validate(photos)?;
        let slug = Slug::derive(&v.name)?;

        Ok(Self {
            id,
            name: v.name,
            slug,
            description: v.description,
            price: v.price,
            category: v.category,
            quantity: v.quantity,
            shipping: v.shipping,
            photo_count: photos.len() as u32,
            created_at: now,
        })
    }

    /// Full replace of the mutable fields from a validated draft.
    ///
    /// The slug is re-derived from the (possibly unchanged) name on every
    /// update. A non-empty `photos` set replaces the entire stored sequence;
    /// an empty set leaves the existing photos untouched.
    pub fn apply_update(
        &mut self,
        draft: &ProductDraft,
        photos: &[Photo],
    ) -> Result<(), DomainError> {
        let v = draft.validate(photos)?;
        let slug = Slug::derive(&v.name)?;

        self.name = v.name;
        self.slug = slug;
        self.description = v.description;
        self.price = v.price;
        self.category = v.category;
        self.quantity = v.quantity;
        self.shipping = v.shipping;
        if !photos.is_empty() {
            self.photo_count = photos.len() as u32;
        }
        Ok(())
    }
}
