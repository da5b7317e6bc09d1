use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, Path},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use storefront_catalog::{Photo, ProductDraft};
use storefront_core::{CategoryId, ProductId, Slug};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/count", get(count_products))
        .route("/filter", post(filter_products))
        .route("/list/:page", get(page_products))
        .route("/search/:keyword", get(search_products))
        .route("/related/:pid/:cid", get(related_products))
        .route("/category/:slug", get(products_by_category))
        .route("/:key/photo", get(main_photo))
        .route("/:key/photo/:index", get(photo_by_index))
        .route(
            "/:key",
            get(get_product).put(update_product).delete(delete_product),
        )
        // The per-photo ceiling is 1_000_000 bytes; a multipart body may
        // carry several photos plus the text fields, so the whole-body cap
        // has to sit well above axum's 2 MB default.
        .layer(DefaultBodyLimit::max(MAX_MULTIPART_BYTES))
}

/// Whole-request cap for multipart uploads (16 photos at the per-photo
/// ceiling, with headroom for the text fields).
const MAX_MULTIPART_BYTES: usize = 16 * 1024 * 1024;

/// Pull `ProductDraft` fields and photo parts out of a multipart form.
///
/// A field that is absent or fails to parse is left as `None` so the domain
/// validation reports the canonical "<Field> is Required" message instead of
/// a transport-level parse error.
async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(ProductDraft, Vec<Photo>), axum::response::Response> {
    let mut draft = ProductDraft::default();
    let mut photos = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(errors::json_error(StatusCode::BAD_REQUEST, e.to_string()));
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "photos" | "photos[]" | "photo" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => photos.push(Photo::new(bytes.to_vec(), content_type)),
                    Err(e) => {
                        return Err(errors::json_error(StatusCode::BAD_REQUEST, e.to_string()));
                    }
                }
            }
            _ => {
                let Ok(text) = field.text().await else {
                    continue;
                };
                let text = text.trim();
                match name.as_str() {
                    "name" if !text.is_empty() => draft.name = Some(text.to_string()),
                    "description" if !text.is_empty() => {
                        draft.description = Some(text.to_string());
                    }
                    "price" => draft.price = text.parse().ok(),
                    "category" => draft.category = text.parse::<CategoryId>().ok(),
                    "quantity" => draft.quantity = text.parse().ok(),
                    "shipping" => {
                        draft.shipping = matches!(text, "true" | "1" | "yes" | "on");
                    }
                    _ => {}
                }
            }
        }
    }

    Ok((draft, photos))
}

fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse::<ProductId>()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid product id"))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Multipart,
) -> axum::response::Response {
    let (draft, photos) = match read_product_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    match services.catalog.create(&draft, photos).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(dto::product_to_json(&product)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list_summaries().await {
        Ok(products) => Json(dto::products_to_json(&products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `GET /products/:slug` — product with its category embedded.
pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let slug = Slug::from_raw(key);
    match services.catalog.get_by_slug(&slug).await {
        Ok((product, category)) => {
            Json(dto::product_with_category_to_json(&product, category.as_ref())).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
    multipart: Multipart,
) -> axum::response::Response {
    let id = match parse_product_id(&key) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (draft, photos) = match read_product_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    match services.catalog.update(id, &draft, photos).await {
        Ok(product) => Json(dto::product_to_json(&product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&key) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.catalog.delete(id).await {
        Ok(()) => Json(json!({ "deleted": id })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Raw photo bytes with the stored content type. Index 0 is the main photo.
async fn serve_photo(
    services: &AppServices,
    pid: &str,
    index: u32,
) -> axum::response::Response {
    let id = match parse_product_id(pid) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.catalog.photo(id, index).await {
        Ok(photo) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, photo.content_type)],
            photo.data,
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn main_photo(
    Extension(services): Extension<Arc<AppServices>>,
    Path(pid): Path<String>,
) -> axum::response::Response {
    serve_photo(&services, &pid, 0).await
}

pub async fn photo_by_index(
    Extension(services): Extension<Arc<AppServices>>,
    Path((pid, index)): Path<(String, u32)>,
) -> axum::response::Response {
    serve_photo(&services, &pid, index).await
}

pub async fn filter_products(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::FilterRequest>,
) -> axum::response::Response {
    match services
        .search
        .filter(&body.checked, body.price_range())
        .await
    {
        Ok(products) => Json(dto::products_to_json(&products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn count_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.search.count().await {
        Ok(total) => Json(json!({ "total": total })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn page_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path(page): Path<i64>,
) -> axum::response::Response {
    match services.search.page(page).await {
        Ok(products) => Json(dto::products_to_json(&products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path(keyword): Path<String>,
) -> axum::response::Response {
    match services.search.search(&keyword).await {
        Ok(products) => Json(dto::products_to_json(&products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn related_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path((pid, cid)): Path<(String, String)>,
) -> axum::response::Response {
    let pid = match parse_product_id(&pid) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let cid = match cid.parse::<CategoryId>() {
        Ok(id) => id,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid category id"),
    };
    match services.search.related_to(pid, cid).await {
        Ok(products) => Json(dto::products_to_json(&products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn products_by_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> axum::response::Response {
    let slug = Slug::from_raw(slug);
    match services.search.by_category_slug(&slug).await {
        Ok((category, products)) => Json(json!({
            "category": category,
            "products": products.iter().map(dto::product_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
