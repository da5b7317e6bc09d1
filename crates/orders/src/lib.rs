//! `storefront-orders` — order records and the checkout state machine.

pub mod checkout;
pub mod order;

pub use checkout::{CheckoutState, PaymentMethod};
pub use order::{CartLine, CodStatus, GatewayReceipt, Order, PaymentRecord, cart_total};
