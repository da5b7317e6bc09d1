use axum::Router;

pub mod payments;
pub mod products;

/// Router for every storefront endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/payment", payments::router())
}
