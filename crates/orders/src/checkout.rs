use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// Payment method chosen at checkout.
///
/// The wire label for COD is "Cash On Delivery" (the storefront UI sends it
/// verbatim); anything else is treated as a card payment backed by a
/// gateway nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
}

impl PaymentMethod {
    pub const COD_LABEL: &'static str = "Cash On Delivery";

    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(l) if l == Self::COD_LABEL => Self::CashOnDelivery,
            _ => Self::Card,
        }
    }
}

/// Checkout attempt lifecycle.
///
/// ```text
/// Received ──► CodPending ───────► Settled | Failed
///     │
///     └─────► GatewaySubmitted ──► Settled | Failed
/// ```
///
/// Cash-On-Delivery strictly terminates the flow: once an attempt moves to
/// `CodPending` the gateway is never involved. `Settled` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Received,
    CodPending,
    GatewaySubmitted,
    Settled,
    Failed,
}

impl CheckoutState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Failed)
    }

    /// Validated transition. An illegal edge is a programming error in the
    /// checkout flow and surfaces as an invariant violation.
    pub fn transition(self, to: CheckoutState) -> Result<CheckoutState, DomainError> {
        use CheckoutState::*;
        let legal = matches!(
            (self, to),
            (Received, CodPending)
                | (Received, GatewaySubmitted)
                | (CodPending, Settled)
                | (CodPending, Failed)
                | (GatewaySubmitted, Settled)
                | (GatewaySubmitted, Failed)
        );
        if !legal {
            return Err(DomainError::invariant(format!(
                "illegal checkout transition {self:?} -> {to:?}"
            )));
        }
        Ok(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CheckoutState::*;

    #[test]
    fn cod_path_reaches_settled_without_gateway_states() {
        let state = Received.transition(CodPending).unwrap();
        let state = state.transition(Settled).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn card_path_settles_or_fails() {
        let submitted = Received.transition(GatewaySubmitted).unwrap();
        assert!(submitted.transition(Settled).unwrap().is_terminal());

        let submitted = Received.transition(GatewaySubmitted).unwrap();
        assert!(submitted.transition(Failed).unwrap().is_terminal());
    }

    #[test]
    fn cod_pending_cannot_enter_the_gateway() {
        // A COD attempt must never reach the gateway; that would charge
        // the buyer twice.
        let err = CodPending.transition(GatewaySubmitted).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for from in [Settled, Failed] {
            for to in [Received, CodPending, GatewaySubmitted, Settled, Failed] {
                assert!(from.transition(to).is_err());
            }
        }
    }

    #[test]
    fn payment_method_label_parsing() {
        assert_eq!(
            PaymentMethod::from_label(Some("Cash On Delivery")),
            PaymentMethod::CashOnDelivery
        );
        // Unknown labels and absence both fall back to the card path.
        assert_eq!(PaymentMethod::from_label(Some("Braintree")), PaymentMethod::Card);
        assert_eq!(PaymentMethod::from_label(None), PaymentMethod::Card);
    }

    #[test]
    fn received_cannot_settle_directly() {
        assert!(Received.transition(Settled).is_err());
        assert!(Received.transition(Failed).is_err());
    }
}
