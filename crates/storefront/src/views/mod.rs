//! View models and askama partials.
//!
//! Every view is a plain function of storefront state; templates receive
//! pre-formatted strings and flags only.

pub mod carousel;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod navbar;
pub mod product;
pub mod profile;

pub use carousel::Carousel;
pub use cart::{CartCountTemplate, CartItemsTemplate, CartView, parse_quantity_input};
pub use catalog::{PaginationTemplate, PaginationView, ProductCardView, ProductGridTemplate};
pub use checkout::CheckoutSummaryView;
pub use navbar::NavbarView;
pub use product::ProductDetailView;
pub use profile::{ProfileView, Section, format_order_date};

use ruya_core::Price;
use rust_decimal::Decimal;

/// `$12.50`.
fn money(amount: Decimal) -> String {
    Price::usd(amount).display()
}
