//! Payment gateway collaborator contract.
//!
//! The gateway's settlement logic is external; this module defines only the
//! contract the checkout flow requires: tokenize (client token generation)
//! and charge (a sale submitted for settlement). One long-lived gateway
//! instance is shared across concurrent requests, so implementations must be
//! stateless with respect to individual calls.

mod sandbox;

pub use sandbox::{SaleOutcome, SandboxGateway};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_orders::GatewayReceipt;

/// Opaque client-side token handed to the storefront UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientToken(String);

impl ClientToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Gateway operation error. Never retried by this core; failures are
/// terminal for the request that triggered them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("client token generation failed: {0}")]
    Token(String),

    #[error("sale rejected: {0}")]
    Sale(String),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Credentials for the external gateway, read from the environment at
/// startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub merchant_id: String,
    pub public_key: String,
    pub private_key: String,
}

impl GatewayConfig {
    /// Read `GATEWAY_MERCHANT_ID` / `GATEWAY_PUBLIC_KEY` /
    /// `GATEWAY_PRIVATE_KEY`, falling back to sandbox placeholders.
    pub fn from_env() -> Self {
        let var = |key: &str, fallback: &str| {
            std::env::var(key).unwrap_or_else(|_| fallback.to_string())
        };
        Self {
            merchant_id: var("GATEWAY_MERCHANT_ID", "sandbox-merchant"),
            public_key: var("GATEWAY_PUBLIC_KEY", "sandbox-public"),
            private_key: var("GATEWAY_PRIVATE_KEY", "sandbox-private"),
        }
    }
}

/// External payment gateway: token generation and sale submission.
///
/// `sale` submits for settlement in one shot; there is no separate capture
/// step in this contract and at most one attempt is made per checkout.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn generate_token(&self) -> Result<ClientToken, GatewayError>;

    /// Charge `amount` (smallest currency unit) against `nonce`, settlement
    /// requested.
    async fn sale(&self, amount: u64, nonce: &str) -> Result<GatewayReceipt, GatewayError>;
}
