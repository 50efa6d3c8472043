//! Cart page and navbar badge.

use askama::Template;
use rust_decimal::Decimal;

use crate::models::{Cart, CartLine};

use super::money;

/// Cart line display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            image: line.image.clone(),
            quantity: line.quantity,
            price: money(line.price),
            line_price: money(line.subtotal()),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub item_count: u64,
}

impl CartView {
    /// Cart contents with a flat shipping fee.
    #[must_use]
    pub fn new(cart: &Cart, shipping: Decimal) -> Self {
        let totals = cart.totals(shipping);
        Self {
            items: cart.lines().map(CartItemView::from).collect(),
            subtotal: money(totals.subtotal),
            shipping: money(totals.shipping),
            total: money(totals.total),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart line list with totals.
#[derive(Template)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Navbar cart badge.
#[derive(Template)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Parse a quantity input. Anything that is not a whole number of at least
/// one becomes one.
#[must_use]
pub fn parse_quantity_input(input: &str) -> u32 {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|&n| n >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ruya_core::ProductId;

    use super::*;
    use crate::models::ProductSnapshot;

    fn cart() -> Cart {
        let mut cart = Cart::default();
        let snapshot = ProductSnapshot {
            id: ProductId::new("p1"),
            name: "Aviator".to_owned(),
            price: Decimal::new(1250, 2),
            image: "/img/aviator.webp".to_owned(),
            image_webp_url: "/img/aviator.webp".to_owned(),
            image_fallback_url: String::new(),
            category: "men".to_owned(),
        };
        cart.insert(CartLine::new(&snapshot, 2));
        cart
    }

    #[test]
    fn test_parse_quantity_input() {
        assert_eq!(parse_quantity_input("3"), 3);
        assert_eq!(parse_quantity_input(" 2 "), 2);
        assert_eq!(parse_quantity_input("0"), 1);
        assert_eq!(parse_quantity_input("-4"), 1);
        assert_eq!(parse_quantity_input("abc"), 1);
        assert_eq!(parse_quantity_input(""), 1);
    }

    #[test]
    fn test_cart_view_totals() {
        let view = CartView::new(&cart(), Decimal::new(1000, 2));
        assert_eq!(view.items[0].line_price, "$25.00");
        assert_eq!(view.subtotal, "$25.00");
        assert_eq!(view.total, "$35.00");
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_cart_items_render() {
        let html = CartItemsTemplate {
            cart: CartView::new(&cart(), Decimal::new(1000, 2)),
        }
        .render()
        .unwrap();
        assert!(html.contains("Aviator"));
        assert!(html.contains("data-product-id=\"p1\""));
        assert!(html.contains("$35.00"));

        let empty = CartItemsTemplate {
            cart: CartView::new(&Cart::default(), Decimal::ZERO),
        }
        .render()
        .unwrap();
        assert!(empty.contains("Your cart is empty."));
    }

    #[test]
    fn test_cart_count_render() {
        let html = CartCountTemplate { count: 4 }.render().unwrap();
        assert!(html.contains('4'));
    }
}
