//! Placed orders.

use chrono::{DateTime, Utc};
use ruya_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartLine;

/// An order document in the `orders` collection.
///
/// Orders are written once at checkout and never modified by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Document id (not stored in the document body).
    #[serde(skip)]
    pub id: OrderId,
    pub user_id: UserId,
    /// Stamped by the store on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<DateTime<Utc>>,
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub order_notes: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

impl Order {
    #[must_use]
    pub fn display_total(&self) -> Price {
        Price::usd(self.total_amount)
    }
}

/// A cart line frozen into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub item_subtotal: Decimal,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.id.clone(),
            name: line.name.clone(),
            price: line.price,
            quantity: line.quantity,
            image: line.image.clone(),
            item_subtotal: line.subtotal(),
        }
    }
}

/// Where and to whom an order ships.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub street_address: String,
    pub city: String,
    pub country: String,
}

impl ShippingAddress {
    /// `street, city, country`.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!("{}, {}, {}", self.street_address, self.city, self.country)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_document_layout() {
        let order = Order {
            id: OrderId::new("ignored"),
            user_id: UserId::new("u1"),
            order_date: None,
            items: vec![OrderLine {
                product_id: ProductId::new("p1"),
                name: "Round".to_owned(),
                price: Decimal::new(1250, 2),
                quantity: 2,
                image: "/r.webp".to_owned(),
                item_subtotal: Decimal::new(2500, 2),
            }],
            shipping_address: ShippingAddress::default(),
            order_notes: String::new(),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            total_amount: Decimal::new(3500, 2),
        };
        let doc = serde_json::to_value(&order).unwrap();
        assert!(doc.get("id").is_none());
        assert!(doc.get("orderDate").is_none());
        assert_eq!(doc["paymentMethod"], json!("Cash on Delivery"));
        assert_eq!(doc["status"], json!("Pending"));
        assert_eq!(doc["totalAmount"], json!(35.0));
        assert_eq!(doc["items"][0]["itemSubtotal"], json!(25.0));
        assert_eq!(doc["shippingAddress"]["streetAddress"], json!(""));
    }

    #[test]
    fn test_decodes_stamped_order() {
        let order: Order = serde_json::from_value(json!({
            "userId": "u1",
            "orderDate": "2025-01-05T15:04:00.000Z",
            "items": [],
            "shippingAddress": {"streetAddress": "1 Main", "city": "Beirut", "country": "Lebanon"},
            "paymentMethod": "Cash on Delivery",
            "status": "Shipped",
            "totalAmount": 10
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(order.order_date.is_some());
        assert_eq!(order.shipping_address.one_line(), "1 Main, Beirut, Lebanon");
        assert_eq!(order.display_total().display(), "$10.00");
    }
}
