//! Checkout page order summary.

use rust_decimal::Decimal;

use crate::models::Cart;

use super::money;

/// One summary row, e.g. "Aviator x 2" / "$20.00".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLineView {
    pub label: String,
    pub subtotal: String,
}

/// Order summary beside the shipping form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummaryView {
    pub lines: Vec<SummaryLineView>,
    pub subtotal: String,
    /// "Flat rate: $10.00".
    pub shipping: String,
    pub total: String,
    /// The place-order button is disabled for an empty cart.
    pub can_place_order: bool,
    pub button_label: &'static str,
}

impl CheckoutSummaryView {
    #[must_use]
    pub fn new(cart: &Cart, shipping: Decimal) -> Self {
        let totals = cart.totals(shipping);
        let can_place_order = !cart.is_empty();
        Self {
            lines: cart
                .lines()
                .map(|line| SummaryLineView {
                    label: format!("{} x {}", line.name, line.quantity),
                    subtotal: money(line.subtotal()),
                })
                .collect(),
            subtotal: money(totals.subtotal),
            shipping: format!("Flat rate: {}", money(totals.shipping)),
            total: money(totals.total),
            can_place_order,
            button_label: if can_place_order { "Place order" } else { "Cart Empty" },
        }
    }
}
