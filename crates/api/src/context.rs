use storefront_core::BuyerId;

/// Buyer context for a checkout request.
///
/// Authentication is an external collaborator; the upstream proxy injects
/// the authenticated buyer id and the middleware turns it into this context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuyerContext {
    buyer_id: BuyerId,
}

impl BuyerContext {
    pub fn new(buyer_id: BuyerId) -> Self {
        Self { buyer_id }
    }

    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }
}
