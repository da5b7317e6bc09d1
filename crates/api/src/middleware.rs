use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use storefront_core::BuyerId;

use crate::context::BuyerContext;

/// Header carrying the authenticated buyer id, set by the upstream auth
/// collaborator.
pub const BUYER_HEADER: &str = "x-buyer-id";

/// Require an authenticated buyer identity on the request.
pub async fn buyer_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let buyer_id = extract_buyer(req.headers())?;
    req.extensions_mut().insert(BuyerContext::new(buyer_id));
    Ok(next.run(req).await)
}

fn extract_buyer(headers: &HeaderMap) -> Result<BuyerId, StatusCode> {
    let header = headers.get(BUYER_HEADER).ok_or(StatusCode::UNAUTHORIZED)?;
    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
    header
        .trim()
        .parse::<BuyerId>()
        .map_err(|_| StatusCode::UNAUTHORIZED)
}
