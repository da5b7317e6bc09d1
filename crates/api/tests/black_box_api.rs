use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use storefront_api::app::services::AppServices;
use storefront_api::app::{build_in_memory_services, build_router};
use storefront_core::BuyerId;
use storefront_infra::gateway::{SaleOutcome, SandboxGateway};
use storefront_infra::store::{InMemoryBlobStore, InMemoryCatalogStore, InMemoryOrderStore};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: Arc<AppServices>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_router(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Observable wiring: the server shares its order store and gateway with the
/// test so assertions can inspect what was persisted and charged.
struct Harness {
    srv: TestServer,
    client: reqwest::Client,
    orders: Arc<InMemoryOrderStore>,
    gateway: Arc<SandboxGateway>,
}

async fn harness() -> Harness {
    let orders = Arc::new(InMemoryOrderStore::new());
    let gateway = Arc::new(SandboxGateway::approving());
    let services = Arc::new(AppServices::new(
        Arc::new(InMemoryCatalogStore::new()),
        Arc::new(InMemoryBlobStore::new()),
        orders.clone(),
        gateway.clone(),
    ));
    Harness {
        srv: TestServer::spawn(services).await,
        client: reqwest::Client::new(),
        orders,
        gateway,
    }
}

fn product_form(name: &str, category: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("description", format!("{name} description"))
        .text("price", "2500")
        .text("category", category.to_string())
        .text("quantity", "10")
        .text("shipping", "true")
}

fn photo_part(bytes: Vec<u8>) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name("photo.png")
        .mime_str("image/png")
        .expect("valid mime")
}

async fn create_product(
    h: &Harness,
    name: &str,
    category: &str,
    photo: Option<Vec<u8>>,
) -> serde_json::Value {
    let mut form = product_form(name, category);
    if let Some(bytes) = photo {
        form = form.part("photos", photo_part(bytes));
    }
    let res = h
        .client
        .post(format!("{}/products", h.srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let h = harness().await;
    let res = h
        .client
        .get(format!("{}/health", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn created_product_is_fetchable_by_slug() {
    let h = harness().await;
    let category = uuid::Uuid::now_v7().to_string();
    let created = create_product(&h, "Blue Widget", &category, None).await;
    assert_eq!(created["slug"], "blue-widget");

    let res = h
        .client
        .get(format!("{}/products/blue-widget", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Blue Widget");
    assert_eq!(body["price"], 2500);
}

#[tokio::test]
async fn missing_category_reports_exactly_that_and_persists_nothing() {
    let h = harness().await;
    // Every field present except category.
    let form = reqwest::multipart::Form::new()
        .text("name", "Widget")
        .text("description", "A widget")
        .text("price", "100")
        .text("quantity", "5");
    let res = h
        .client
        .post(format!("{}/products", h.srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Category is Required");

    let res = h
        .client
        .get(format!("{}/products", h.srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn photo_round_trips_with_content_type() {
    let h = harness().await;
    let category = uuid::Uuid::now_v7().to_string();
    let bytes = vec![0x89, 0x50, 0x4e, 0x47];
    let created = create_product(&h, "Camera", &category, Some(bytes.clone())).await;
    let pid = created["id"].as_str().unwrap();

    let res = h
        .client
        .get(format!("{}/products/{pid}/photo", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap(),
        "image/png"
    );
    assert_eq!(res.bytes().await.unwrap().to_vec(), bytes);

    // Out-of-range index is a 404, never an empty body.
    let res = h
        .client
        .get(format!("{}/products/{pid}/photo/5", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn indexed_photo_route_serves_each_photo() {
    let h = harness().await;
    let category = uuid::Uuid::now_v7().to_string();
    let first = vec![1u8; 64];
    let second = vec![2u8; 64];
    let form = product_form("Album", &category)
        .part("photos", photo_part(first.clone()))
        .part("photos", photo_part(second.clone()));
    let res = h
        .client
        .post(format!("{}/products", h.srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let pid = created["id"].as_str().unwrap();

    // Index 0 is the main photo and is also what the index-less route serves.
    let main = h
        .client
        .get(format!("{}/products/{pid}/photo", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(main.bytes().await.unwrap().to_vec(), first);

    let indexed = h
        .client
        .get(format!("{}/products/{pid}/photo/1", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(indexed.status(), StatusCode::OK);
    assert_eq!(indexed.bytes().await.unwrap().to_vec(), second);
}

#[tokio::test]
async fn several_sub_ceiling_photos_fit_in_one_upload() {
    let h = harness().await;
    let category = uuid::Uuid::now_v7().to_string();
    // Three photos just under the per-photo ceiling; the combined body far
    // exceeds axum's default 2 MB body limit and must still be accepted.
    let mut form = product_form("Gallery", &category);
    for fill in 1u8..=3 {
        form = form.part("photos", photo_part(vec![fill; 900_000]));
    }
    let res = h
        .client
        .post(format!("{}/products", h.srv.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["photo_count"], 3);

    let pid = created["id"].as_str().unwrap();
    let res = h
        .client
        .get(format!("{}/products/{pid}/photo/2", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().to_vec(), vec![3u8; 900_000]);
}

#[tokio::test]
async fn page_zero_equals_page_one() {
    let h = harness().await;
    let category = uuid::Uuid::now_v7().to_string();
    for i in 0..8 {
        create_product(&h, &format!("Item {i}"), &category, None).await;
    }

    let page = |n: u32| {
        let h = &h;
        async move {
            let res = h
                .client
                .get(format!("{}/products/list/{n}", h.srv.base_url))
                .send()
                .await
                .unwrap();
            res.json::<serde_json::Value>().await.unwrap()["products"]
                .as_array()
                .unwrap()
                .clone()
        }
    };

    let page0 = page(0).await;
    let page1 = page(1).await;
    assert_eq!(page0, page1);
    assert_eq!(page1.len(), 6);
    assert_eq!(page(2).await.len(), 2);
}

#[tokio::test]
async fn filter_combines_categories_and_inclusive_price() {
    let h = harness().await;
    let wanted = uuid::Uuid::now_v7().to_string();
    let other = uuid::Uuid::now_v7().to_string();
    create_product(&h, "In Range", &wanted, None).await; // price 2500
    create_product(&h, "Wrong Category", &other, None).await;

    let res = h
        .client
        .post(format!("{}/products/filter", h.srv.base_url))
        .json(&json!({ "checked": [wanted], "radio": [2500, 2500] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "In Range");
}

#[tokio::test]
async fn payment_requires_buyer_identity() {
    let h = harness().await;
    let res = h
        .client
        .post(format!("{}/payment", h.srv.base_url))
        .json(&json!({ "nonce": "fake-nonce", "cart": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

fn cart_body(payment_method: Option<&str>) -> serde_json::Value {
    let cart = json!([
        { "product_id": uuid::Uuid::now_v7(), "quantity": 1, "price": 25 },
        { "product_id": uuid::Uuid::now_v7(), "quantity": 2, "price": 15 },
    ]);
    json!({
        "nonce": "fake-valid-nonce",
        "cart": cart,
        "payment_method": payment_method,
    })
}

#[tokio::test]
async fn cod_checkout_persists_one_pending_order_without_charging() {
    let h = harness().await;
    let res = h
        .client
        .post(format!("{}/payment", h.srv.base_url))
        .header("x-buyer-id", BuyerId::new().to_string())
        .json(&cart_body(Some("Cash On Delivery")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["order"]["total"], 40);
    assert_eq!(body["order"]["payment"]["method"], "cash_on_delivery");
    assert_eq!(body["order"]["payment"]["status"], "pending");

    assert_eq!(h.orders.all().len(), 1);
    assert_eq!(h.gateway.sale_calls(), 0);
}

#[tokio::test]
async fn card_checkout_persists_one_order_with_receipt() {
    let h = harness().await;
    let res = h
        .client
        .post(format!("{}/payment", h.srv.base_url))
        .header("x-buyer-id", BuyerId::new().to_string())
        .json(&cart_body(None))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["order"]["payment"]["method"], "card");
    assert_eq!(body["order"]["payment"]["amount"], 40);

    assert_eq!(h.orders.all().len(), 1);
    assert_eq!(h.gateway.sale_calls(), 1);
}

#[tokio::test]
async fn declined_card_persists_no_order() {
    let h = harness().await;
    h.gateway.script(SaleOutcome::Decline("card declined".to_string()));

    let res = h
        .client
        .post(format!("{}/payment", h.srv.base_url))
        .header("x-buyer-id", BuyerId::new().to_string())
        .json(&cart_body(None))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ok"], false);

    assert!(h.orders.all().is_empty());
    assert_eq!(h.gateway.sale_calls(), 1);
}

#[tokio::test]
async fn client_token_is_issued_without_auth() {
    let h = harness().await;
    let res = h
        .client
        .get(format!("{}/payment/token", h.srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["client_token"].as_str().unwrap().starts_with("sandbox-"));
}

#[tokio::test]
async fn update_rederives_slug_and_404s_on_unknown_id() {
    let h = harness().await;
    let category = uuid::Uuid::now_v7().to_string();
    let created = create_product(&h, "Old Name", &category, None).await;
    let pid = created["id"].as_str().unwrap();

    let res = h
        .client
        .put(format!("{}/products/{pid}", h.srv.base_url))
        .multipart(product_form("New Name", &category))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["slug"], "new-name");

    let res = h
        .client
        .put(format!(
            "{}/products/{}",
            h.srv.base_url,
            uuid::Uuid::now_v7()
        ))
        .multipart(product_form("Ghost", &category))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn default_build_serves_requests() {
    // Smoke test for the wiring main() uses (in-memory when the postgres
    // feature is off).
    let services = Arc::new(build_in_memory_services());
    let srv = TestServer::spawn(services).await;
    let res = reqwest::Client::new()
        .get(format!("{}/products/count", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total"], 0);
}
