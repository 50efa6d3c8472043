//! The Firebase adapters against a local emulator.
//!
//! These tests require:
//! - `firebase emulators:start` with the auth and firestore emulators
//! - `FIREBASE_PROJECT_ID`, `FIREBASE_API_KEY`, `STOREFRONT_WHATSAPP_NUMBER`,
//!   `FIRESTORE_BASE_URL` and `IDENTITY_TOOLKIT_BASE_URL` pointing at it
//!
//! Run with: cargo test -p ruya-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use ruya_core::{Email, SortOption};
use ruya_storefront::models::products;
use ruya_storefront::services::{CheckoutError, ShippingForm, SignUpForm};
use ruya_storefront::{Storefront, StorefrontConfig};
use serde_json::json;
use uuid::Uuid;

fn storefront() -> Storefront {
    let mut config = StorefrontConfig::from_env().expect("emulator configuration");
    config.data_dir = std::env::temp_dir().join(format!("ruya-{}", Uuid::new_v4().simple()));
    Storefront::connect(&config)
}

fn unique_email() -> Email {
    Email::parse(&format!("test-{}@example.com", Uuid::new_v4().simple())).unwrap()
}

#[tokio::test]
#[ignore = "Requires the Firebase emulator"]
async fn test_sign_up_and_checkout() {
    let storefront = storefront();
    let email = unique_email();
    let form = SignUpForm {
        first_name: "Test".to_owned(),
        last_name: "Shopper".to_owned(),
        email: email.to_string(),
        phone: "+96170123456".to_owned(),
        street_address: "Hamra St 12".to_owned(),
        city: "Beirut".to_owned(),
        country: "Lebanon".to_owned(),
        password: "secret-password".to_owned(),
        confirm_password: "secret-password".to_owned(),
    };
    let user = storefront.accounts().sign_up(&form).await.unwrap();

    let id = format!("emulator-{}", Uuid::new_v4().simple());
    let doc = json!({"name": "Emulator Frame", "price": 19.99, "category": "kids", "stock": 2});
    let path = products().doc(id.as_str());
    // Security rules may forbid client writes to products; checkout is then
    // only exercised up to the empty-cart check.
    let seeded = storefront
        .store()
        .set(&path, doc.as_object().unwrap().clone())
        .await
        .is_ok();

    let mut shop = storefront.shop();
    shop.set_sort(SortOption::PriceAsc).await.unwrap();

    let mut session = storefront.session();
    session.sync().await;
    let mut shipping = ShippingForm::default();
    session.apply_to_form(&mut shipping);
    assert!(shipping.is_locked());

    let checkout = storefront.checkout();
    let err = checkout.place_order(&shipping, Some(&user)).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));

    if seeded {
        let product = storefront.catalog().product(&id.as_str().into()).await.unwrap();
        storefront.cart().add(&product.snapshot(), 1).unwrap();
        let receipt = checkout.place_order(&shipping, Some(&user)).await.unwrap();
        assert!(!receipt.order_id.as_str().is_empty());
    }

    storefront.accounts().sign_out().await.unwrap();
}
