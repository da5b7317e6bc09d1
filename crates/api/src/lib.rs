//! `storefront-api` — HTTP application: services, routes, DTOs.

pub mod app;
pub mod context;
pub mod middleware;
