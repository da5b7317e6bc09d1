//! `storefront-infra` — persistence and external-collaborator boundaries.
//!
//! Store traits plus in-memory implementations (dev/test) and Postgres
//! implementations behind the `postgres` feature. The payment gateway
//! contract and its sandbox double live here as well.

pub mod gateway;
pub mod store;
