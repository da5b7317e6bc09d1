use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{BuyerId, DomainError, OrderId, ProductId};

/// A single product entry submitted at checkout, carrying a price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price snapshot in smallest currency unit (e.g. cents), taken at the
    /// time the line entered the cart.
    pub price: u64,
}

/// Sum of the cart's price snapshots.
///
/// Each line contributes its snapshot once; quantity does not multiply in
/// (the snapshot is the line total as submitted by the cart).
pub fn cart_total(lines: &[CartLine]) -> u64 {
    lines.iter().map(|l| l.price).sum()
}

/// Cash-On-Delivery collection status.
///
/// Only `Pending` is ever written by this core: the charge is collected at
/// delivery, outside the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodStatus {
    Pending,
}

/// Result payload returned by the payment gateway for a settled sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReceipt {
    pub transaction_id: String,
    /// Charged amount in smallest currency unit.
    pub amount: u64,
    /// Raw gateway payload, stored verbatim for reconciliation.
    pub raw: serde_json::Value,
}

/// Payment outcome recorded on an order. Fixed at creation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum PaymentRecord {
    CashOnDelivery { status: CodStatus },
    Card { receipt: GatewayReceipt },
}

/// Order record: created at most once per checkout attempt, never updated
/// or deleted by this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<CartLine>,
    pub payment: PaymentRecord,
    pub buyer: BuyerId,
    pub created_at: DateTime<Utc>,
}

impl Order {
    fn new(
        id: OrderId,
        lines: Vec<CartLine>,
        payment: PaymentRecord,
        buyer: BuyerId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::validation("Cart is Empty"));
        }
        Ok(Self {
            id,
            lines,
            payment,
            buyer,
            created_at: now,
        })
    }

    /// Order deferring charge collection until delivery.
    pub fn cash_on_delivery(
        id: OrderId,
        lines: Vec<CartLine>,
        buyer: BuyerId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Self::new(
            id,
            lines,
            PaymentRecord::CashOnDelivery {
                status: CodStatus::Pending,
            },
            buyer,
            now,
        )
    }

    /// Order backed by a settled gateway transaction.
    pub fn card(
        id: OrderId,
        lines: Vec<CartLine>,
        receipt: GatewayReceipt,
        buyer: BuyerId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Self::new(id, lines, PaymentRecord::Card { receipt }, buyer, now)
    }

    pub fn total(&self) -> u64 {
        cart_total(&self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: u64) -> CartLine {
        CartLine {
            product_id: ProductId::new(),
            quantity: 1,
            price,
        }
    }

    #[test]
    fn cart_total_sums_price_snapshots() {
        assert_eq!(cart_total(&[line(25), line(15)]), 40);
        assert_eq!(cart_total(&[]), 0);
    }

    #[test]
    fn cod_order_starts_pending() {
        let order =
            Order::cash_on_delivery(OrderId::new(), vec![line(100)], BuyerId::new(), Utc::now())
                .unwrap();
        assert_eq!(
            order.payment,
            PaymentRecord::CashOnDelivery {
                status: CodStatus::Pending
            }
        );
        assert_eq!(order.total(), 100);
    }

    #[test]
    fn card_order_carries_the_receipt_verbatim() {
        let receipt = GatewayReceipt {
            transaction_id: "txn-1".to_string(),
            amount: 40,
            raw: serde_json::json!({"status": "submitted_for_settlement"}),
        };
        let order = Order::card(
            OrderId::new(),
            vec![line(25), line(15)],
            receipt.clone(),
            BuyerId::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(order.payment, PaymentRecord::Card { receipt });
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = Order::cash_on_delivery(OrderId::new(), vec![], BuyerId::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Total is invariant under line order.
            #[test]
            fn cart_total_is_order_independent(prices in proptest::collection::vec(0u64..100_000, 1..20)) {
                let lines: Vec<CartLine> = prices.iter().map(|p| line(*p)).collect();
                let mut reversed = lines.clone();
                reversed.reverse();
                prop_assert_eq!(cart_total(&lines), cart_total(&reversed));
                prop_assert_eq!(cart_total(&lines), prices.iter().sum::<u64>());
            }
        }
    }
}
