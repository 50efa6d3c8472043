//! Checkout flows over the in-memory backend: cart, stored order and the
//! WhatsApp hand-off.

#![allow(clippy::unwrap_used)]

use ruya_core::{Email, ProductId};
use ruya_integration_tests::TestContext;
use ruya_storefront::models::orders;
use ruya_storefront::services::{
    CheckoutError, CheckoutFlow, ProductCatalog, ProfileService, ShippingForm,
};
use ruya_storefront::views::{CartView, CheckoutSummaryView};
use rust_decimal::Decimal;

fn shipping_form() -> ShippingForm {
    let mut form = ShippingForm::default();
    form.first_name = "Layla".to_owned();
    form.last_name = "Haddad".to_owned();
    form.phone = "+961 70 123 456".to_owned();
    form.email = "layla@example.com".to_owned();
    form.street_address = "Hamra St 12".to_owned();
    form.city = "Beirut".to_owned();
    form.country = "Lebanon".to_owned();
    form
}

#[tokio::test]
async fn test_cart_to_order() {
    let ctx = TestContext::new();
    ctx.seed_product("aviator", "Aviator", 10.0, "men", 1);
    ctx.seed_product("round", "Round", 5.0, "women", 2);
    let catalog = ProductCatalog::new(ctx.store.clone());

    let aviator = catalog.product(&ProductId::new("aviator")).await.unwrap();
    let round = catalog.product(&ProductId::new("round")).await.unwrap();
    ctx.cart.add(&aviator.snapshot(), 1).unwrap();
    ctx.cart.add(&aviator.snapshot(), 1).unwrap();
    ctx.cart.add(&round.snapshot(), 1).unwrap();
    assert_eq!(ctx.cart.item_count().unwrap(), 3);

    let summary = CheckoutSummaryView::new(&ctx.cart.get().unwrap(), ctx.config.shipping_fee);
    assert_eq!(summary.total, "$35.00");
    assert!(summary.can_place_order);

    let user = ctx
        .sign_in(&Email::parse("layla@example.com").unwrap())
        .await
        .unwrap();
    let checkout = CheckoutFlow::new(ctx.store.clone(), ctx.cart.clone(), ctx.config.clone());
    let receipt = checkout
        .place_order(&shipping_form(), Some(&user))
        .await
        .unwrap();

    assert_eq!(receipt.totals.total, Decimal::new(35, 0));
    assert!(receipt.message.contains("- Aviator x 2 ($20.00)"));
    assert!(receipt.message.contains("*Total: $35.00*"));
    assert!(
        receipt
            .message
            .ends_with(&format!("Order ID: {}\nPlease confirm this order.", receipt.order_id))
    );
    assert!(receipt.compose_link.starts_with("https://wa.me/96176829297?text="));
    assert!(receipt.confirmation().contains(receipt.order_id.as_str()));

    // Cart is cleared and the badge drops to zero.
    assert_eq!(ctx.cart.item_count().unwrap(), 0);
    assert!(CartView::new(&ctx.cart.get().unwrap(), ctx.config.shipping_fee).is_empty());

    // The order shows up in the profile history.
    let history = ProfileService::new(ctx.store.clone()).orders(&user).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, receipt.order_id);
    assert_eq!(history[0].items.len(), 2);
    assert!(history[0].order_date.is_some());
}

#[tokio::test]
async fn test_signed_out_checkout_keeps_cart() {
    let ctx = TestContext::new();
    ctx.seed_product("aviator", "Aviator", 10.0, "men", 1);
    let aviator = ProductCatalog::new(ctx.store.clone())
        .product(&ProductId::new("aviator"))
        .await
        .unwrap();
    ctx.cart.add(&aviator.snapshot(), 2).unwrap();

    let checkout = CheckoutFlow::new(ctx.store.clone(), ctx.cart.clone(), ctx.config.clone());
    let err = checkout.place_order(&shipping_form(), None).await.unwrap_err();
    assert!(matches!(err, CheckoutError::SignInRequired));
    assert_eq!(ctx.cart.item_count().unwrap(), 2);
    assert!(ctx.store.documents(&orders()).is_empty());
}

#[tokio::test]
async fn test_quantity_edits_before_checkout() {
    let ctx = TestContext::new();
    ctx.seed_product("aviator", "Aviator", 12.5, "men", 1);
    let aviator = ProductCatalog::new(ctx.store.clone())
        .product(&ProductId::new("aviator"))
        .await
        .unwrap();

    ctx.cart.add(&aviator.snapshot(), 1).unwrap();
    ctx.cart.set_quantity(&aviator.id, 4).unwrap();
    let view = CartView::new(&ctx.cart.get().unwrap(), ctx.config.shipping_fee);
    assert_eq!(view.items[0].line_price, "$50.00");
    assert_eq!(view.total, "$60.00");

    ctx.cart.set_quantity(&aviator.id, 0).unwrap();
    let checkout = CheckoutFlow::new(ctx.store.clone(), ctx.cart.clone(), ctx.config.clone());
    let err = checkout.place_order(&shipping_form(), None).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}
