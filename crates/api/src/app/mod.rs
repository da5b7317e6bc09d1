//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: domain orchestration over the store and gateway boundaries
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, http::StatusCode, routing::get};
use tower::ServiceBuilder;

use storefront_infra::gateway::SandboxGateway;
use storefront_infra::store::{InMemoryBlobStore, InMemoryCatalogStore, InMemoryOrderStore};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// In-memory wiring for dev and tests: RwLock-backed stores plus the
/// deterministic sandbox gateway.
pub fn build_in_memory_services() -> AppServices {
    AppServices::new(
        Arc::new(InMemoryCatalogStore::new()),
        Arc::new(InMemoryBlobStore::new()),
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(SandboxGateway::approving()),
    )
}

/// Postgres-backed wiring. Connects with `DATABASE_URL` and applies the
/// schema on startup; the gateway stays the sandbox until a live gateway
/// client lands.
#[cfg(feature = "postgres")]
pub async fn build_postgres_services() -> anyhow::Result<AppServices> {
    use anyhow::Context;
    use storefront_infra::store::{
        PostgresBlobStore, PostgresCatalogStore, PostgresOrderStore, ensure_schema,
    };

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set with the postgres feature")?;
    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    ensure_schema(&pool).await.context("failed to apply schema")?;

    Ok(AppServices::new(
        Arc::new(PostgresCatalogStore::new(pool.clone())),
        Arc::new(PostgresBlobStore::new(pool.clone())),
        Arc::new(PostgresOrderStore::new(pool)),
        Arc::new(SandboxGateway::approving()),
    ))
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app() -> anyhow::Result<Router> {
    #[cfg(feature = "postgres")]
    let services = build_postgres_services().await?;
    #[cfg(not(feature = "postgres"))]
    let services = build_in_memory_services();

    Ok(build_router(Arc::new(services)))
}

/// Assemble the router around an already-wired service set. Tests use this
/// to inject scripted gateways and observable stores.
pub fn build_router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::router().layer(Extension(services)))
        .layer(ServiceBuilder::new())
}

async fn health() -> StatusCode {
    StatusCode::OK
}
