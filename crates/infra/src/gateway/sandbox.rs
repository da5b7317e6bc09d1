use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use storefront_orders::GatewayReceipt;

use super::{ClientToken, GatewayConfig, GatewayError, PaymentGateway};

/// Scripted result for the next `sale` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleOutcome {
    Approve,
    Decline(String),
    Unavailable(String),
}

/// Deterministic in-process gateway for dev and tests.
///
/// Approves every sale by default; tests can script declines or outages and
/// observe how many sale attempts were made.
pub struct SandboxGateway {
    config: GatewayConfig,
    outcome: RwLock<SaleOutcome>,
    token_seq: AtomicU64,
    sale_calls: AtomicU64,
}

impl SandboxGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            outcome: RwLock::new(SaleOutcome::Approve),
            token_seq: AtomicU64::new(0),
            sale_calls: AtomicU64::new(0),
        }
    }

    pub fn approving() -> Self {
        Self::new(GatewayConfig::from_env())
    }

    pub fn declining(reason: impl Into<String>) -> Self {
        let gateway = Self::approving();
        gateway.script(SaleOutcome::Decline(reason.into()));
        gateway
    }

    /// Script the outcome of subsequent `sale` calls.
    pub fn script(&self, outcome: SaleOutcome) {
        *self.outcome.write().expect("outcome lock poisoned") = outcome;
    }

    /// Number of `sale` attempts made so far.
    pub fn sale_calls(&self) -> u64 {
        self.sale_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn generate_token(&self) -> Result<ClientToken, GatewayError> {
        let seq = self.token_seq.fetch_add(1, Ordering::SeqCst);
        Ok(ClientToken::new(format!(
            "sandbox-{}-{seq}",
            self.config.merchant_id
        )))
    }

    async fn sale(&self, amount: u64, nonce: &str) -> Result<GatewayReceipt, GatewayError> {
        let call = self.sale_calls.fetch_add(1, Ordering::SeqCst);

        if nonce.trim().is_empty() {
            return Err(GatewayError::Sale("payment method nonce is required".to_string()));
        }

        let outcome = self.outcome.read().expect("outcome lock poisoned").clone();
        match outcome {
            SaleOutcome::Approve => Ok(GatewayReceipt {
                transaction_id: format!("sandbox-txn-{call}"),
                amount,
                raw: serde_json::json!({
                    "transaction": {
                        "id": format!("sandbox-txn-{call}"),
                        "amount": amount,
                        "status": "submitted_for_settlement",
                        "merchant_id": self.config.merchant_id,
                    }
                }),
            }),
            SaleOutcome::Decline(reason) => Err(GatewayError::Sale(reason)),
            SaleOutcome::Unavailable(reason) => Err(GatewayError::Unavailable(reason)),
        }
    }
}
