//! Locally persisted cart.

use std::collections::BTreeMap;

use ruya_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::ProductSnapshot;

/// One product in the cart, with the name, price and image captured when it
/// was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl CartLine {
    /// A new line for `quantity` units of a product.
    #[must_use]
    pub fn new(snapshot: &ProductSnapshot, quantity: u32) -> Self {
        Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            price: snapshot.price,
            image: snapshot.image.clone(),
            quantity,
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Cart contents keyed by product id.
///
/// Serializes as a JSON object mapping product id to line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: BTreeMap<ProductId, CartLine>,
}

/// Money totals of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Lines in product id order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ProductId) -> Option<&mut CartLine> {
        self.lines.get_mut(id)
    }

    pub(crate) fn insert(&mut self, line: CartLine) {
        self.lines.insert(line.id.clone(), line);
    }

    pub(crate) fn remove(&mut self, id: &ProductId) -> Option<CartLine> {
        self.lines.remove(id)
    }

    /// Drop lines that cannot be checked out.
    pub(crate) fn retain_valid(&mut self) -> usize {
        let before = self.lines.len();
        self.lines.retain(|id, line| line.quantity > 0 && *id == line.id);
        before - self.lines.len()
    }

    /// Total units across all lines (the navbar badge).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.values().map(CartLine::subtotal).sum()
    }

    /// Totals with a flat shipping fee.
    #[must_use]
    pub fn totals(&self, shipping: Decimal) -> CartTotals {
        let subtotal = self.subtotal();
        CartTotals {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line(id: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            price: Decimal::new(price, 0),
            image: String::new(),
            quantity,
        }
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::default();
        cart.insert(line("a", 10, 2));
        cart.insert(line("b", 5, 1));
        assert_eq!(cart.item_count(), 3);
        let totals = cart.totals(Decimal::new(10, 0));
        assert_eq!(totals.subtotal, Decimal::new(25, 0));
        assert_eq!(totals.total, Decimal::new(35, 0));
    }

    #[test]
    fn test_wire_format_is_object_keyed_by_id() {
        let mut cart = Cart::default();
        cart.insert(line("p1", 12, 1));
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            json!({"p1": {"id": "p1", "name": "P1", "price": 12.0, "image": "", "quantity": 1}})
        );
        let back: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_retain_valid_drops_zero_quantities() {
        let mut cart = Cart::default();
        cart.insert(line("a", 1, 0));
        cart.insert(line("b", 1, 2));
        assert_eq!(cart.retain_valid(), 1);
        assert_eq!(cart.len(), 1);
    }
}
