//! Account flows over the in-memory backend: sign-up, the session stream,
//! favorites and the profile page.

#![allow(clippy::unwrap_used)]

use ruya_core::ProductId;
use ruya_integration_tests::TestContext;
use ruya_storefront::services::{
    AccountService, FavoriteToggle, FavoritesController, ProductCatalog, ProfileService,
    SessionChange, SessionController, ShippingForm, SignUpForm,
};
use ruya_storefront::views::{NavbarView, ProfileView, Section};

fn sign_up_form() -> SignUpForm {
    SignUpForm {
        first_name: "Layla".to_owned(),
        last_name: "Haddad".to_owned(),
        email: "layla@example.com".to_owned(),
        phone: "+96170123456".to_owned(),
        street_address: "Hamra St 12".to_owned(),
        city: "Beirut".to_owned(),
        country: "Lebanon".to_owned(),
        password: "secret1".to_owned(),
        confirm_password: "secret1".to_owned(),
    }
}

#[tokio::test]
async fn test_sign_up_updates_session_and_checkout_form() {
    let ctx = TestContext::new();
    let accounts = AccountService::new(ctx.auth.clone(), ctx.store.clone());
    let mut session = SessionController::new(ctx.auth.as_ref(), ctx.store.clone());

    assert_eq!(session.sync().await, Some(SessionChange::SignedOut));
    assert_eq!(NavbarView::from(&session), NavbarView::signed_out());

    accounts.sign_up(&sign_up_form()).await.unwrap();
    assert_eq!(session.sync().await, Some(SessionChange::SignedIn));

    let navbar = NavbarView::from(&session);
    assert_eq!(navbar.label, "Profile");
    assert_eq!(navbar.greeting.as_deref(), Some("Hello, Layla"));

    let mut form = ShippingForm::default();
    session.apply_to_form(&mut form);
    assert!(form.is_locked());
    assert_eq!(form.city, "Beirut");
    assert!(form.validate().is_ok());

    accounts.sign_out().await.unwrap();
    assert_eq!(session.sync().await, Some(SessionChange::SignedOut));
    session.apply_to_form(&mut form);
    assert!(!form.is_locked());
    assert_eq!(NavbarView::from(&session).label, "Login");
}

#[tokio::test]
async fn test_favorites_show_on_profile() {
    let ctx = TestContext::new();
    ctx.seed_product("aviator", "Aviator", 49.99, "men", 1);
    ctx.seed_product("cat-eye", "Cat Eye", 35.0, "women", 2);
    let catalog = ProductCatalog::new(ctx.store.clone());
    let accounts = AccountService::new(ctx.auth.clone(), ctx.store.clone());
    let user = accounts.sign_up(&sign_up_form()).await.unwrap();

    let mut favorites = FavoritesController::new(ctx.store.clone());
    favorites.refresh(Some(&user)).await.unwrap();
    for id in ["aviator", "cat-eye"] {
        let product = catalog.product(&ProductId::new(id)).await.unwrap();
        let outcome = favorites.toggle(Some(&user), &product.snapshot()).await.unwrap();
        assert_eq!(outcome, FavoriteToggle::Favorited);
    }

    let profiles = ProfileService::new(ctx.store.clone());
    let view = ProfileView::new(&profiles.load(&user).await, user.email.as_str());
    assert_eq!(view.display_name, "Layla");
    let Section::Items(cards) = &view.favorites else {
        panic!("favorites should load");
    };
    assert_eq!(cards[0].name, "Cat Eye");
    assert_eq!(cards[1].price, "$49.99");
    assert_eq!(view.orders, Section::Message("You have no past orders."));

    let remaining = profiles
        .remove_favorite(&user, &ProductId::new("cat-eye"))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    favorites.refresh(Some(&user)).await.unwrap();
    assert!(!favorites.is_favorited(&ProductId::new("cat-eye")));
    assert!(favorites.is_favorited(&ProductId::new("aviator")));

    favorites.refresh(None).await.unwrap();
    assert!(favorites.favorited().is_empty());
}

#[tokio::test]
async fn test_sign_in_errors_use_form_messages() {
    let ctx = TestContext::new();
    let accounts = AccountService::new(ctx.auth.clone(), ctx.store.clone());
    accounts.sign_up(&sign_up_form()).await.unwrap();

    let err = accounts.sign_in("layla@example.com", "nope123").await.unwrap_err();
    assert_eq!(err.user_message(), "Invalid email or password.");
    let err = accounts.sign_in("layla", "secret1").await.unwrap_err();
    assert_eq!(err.user_message(), "Invalid email format.");
}
