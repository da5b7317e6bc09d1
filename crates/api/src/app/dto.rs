use serde::Deserialize;
use serde_json::json;

use storefront_catalog::{Category, Product};
use storefront_core::{CategoryId, ProductId};
use storefront_infra::store::PriceRange;
use storefront_orders::{CartLine, Order, PaymentRecord};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /products/filter`.
///
/// `checked` is the set of category ids (empty = no category constraint);
/// `radio` is an inclusive `[min, max]` price pair, or empty for no price
/// constraint.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub checked: Vec<CategoryId>,
    #[serde(default)]
    pub radio: Vec<u64>,
}

impl FilterRequest {
    /// `radio` of fewer than two values means no price constraint.
    pub fn price_range(&self) -> Option<PriceRange> {
        match self.radio[..] {
            [min, max, ..] => Some(PriceRange { min, max }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Price snapshot in smallest currency unit.
    pub price: u64,
}

fn one() -> u32 {
    1
}

impl From<CartLineRequest> for CartLine {
    fn from(line: CartLineRequest) -> Self {
        CartLine {
            product_id: line.product_id,
            quantity: line.quantity,
            price: line.price,
        }
    }
}

/// Body of `POST /payment`.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub nonce: Option<String>,
    #[serde(default)]
    pub cart: Vec<CartLineRequest>,
    pub payment_method: Option<String>,
}

// -------------------------
// Response shapes
// -------------------------

/// Product record as JSON. Photo bytes never appear here; clients fetch
/// them from the photo routes using `photo_count`.
pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id,
        "name": product.name,
        "slug": product.slug,
        "description": product.description,
        "price": product.price,
        "category": product.category,
        "quantity": product.quantity,
        "shipping": product.shipping,
        "photo_count": product.photo_count,
        "created_at": product.created_at,
    })
}

pub fn product_with_category_to_json(
    product: &Product,
    category: Option<&Category>,
) -> serde_json::Value {
    let mut value = product_to_json(product);
    value["category"] = match category {
        Some(c) => json!({ "id": c.id, "name": c.name, "slug": c.slug }),
        None => json!(product.category),
    };
    value
}

pub fn products_to_json(products: &[Product]) -> serde_json::Value {
    json!({
        "products": products.iter().map(product_to_json).collect::<Vec<_>>(),
    })
}

pub fn order_to_json(order: &Order) -> serde_json::Value {
    let payment = match &order.payment {
        PaymentRecord::CashOnDelivery { status } => json!({
            "method": "cash_on_delivery",
            "status": status,
        }),
        PaymentRecord::Card { receipt } => json!({
            "method": "card",
            "transaction_id": receipt.transaction_id,
            "amount": receipt.amount,
        }),
    };
    json!({
        "id": order.id,
        "buyer": order.buyer,
        "lines": order.lines,
        "total": order.total(),
        "payment": payment,
        "created_at": order.created_at,
    })
}
