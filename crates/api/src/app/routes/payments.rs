use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use storefront_orders::{CartLine, PaymentMethod};

use crate::app::services::{AppServices, ServiceError};
use crate::app::{dto, errors};
use crate::context::BuyerContext;

pub fn router() -> Router {
    Router::new()
        .route("/token", get(client_token))
        .route(
            "/",
            post(settle).layer(axum::middleware::from_fn(crate::middleware::buyer_middleware)),
        )
}

pub async fn client_token(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.checkout.client_token().await {
        Ok(token) => Json(json!({ "client_token": token })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn settle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Json(body): Json<dto::PaymentRequest>,
) -> axum::response::Response {
    let method = PaymentMethod::from_label(body.payment_method.as_deref());
    let lines: Vec<CartLine> = body.cart.into_iter().map(CartLine::from).collect();

    match services
        .checkout
        .settle(lines, buyer.buyer_id(), method, body.nonce.as_deref())
        .await
    {
        Ok(outcome) => Json(json!({
            "ok": true,
            "order": dto::order_to_json(&outcome.order),
        }))
        .into_response(),
        // Payment failures keep the storefront's `ok` envelope so the UI can
        // show the gateway's reason without parsing status codes.
        Err(ServiceError::Gateway(e)) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "ok": false,
                "message": "payment failed",
                "error": e.to_string(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
