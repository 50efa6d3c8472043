//! Checkout: shipping form validation, order persistence and the WhatsApp
//! hand-off.
//!
//! Placing an order runs in this order:
//!
//! 1. Local preconditions, no remote calls: the cart has lines, every
//!    required shipping field is filled (and the email parses), a user is
//!    signed in.
//! 2. The order is written to `orders` with a store-resolved `orderDate`.
//! 3. The confirmation message and `wa.me` compose link are built with the
//!    new order id, then the cart is cleared.
//!
//! If the write fails nothing else happens and the cart is kept, so the
//! shopper can retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ruya_core::{Email, OrderId, Price};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::backend::{AuthUser, DocumentStore, StoreError, document, server_timestamp};
use crate::config::StoreConfig;
use crate::error::add_breadcrumb;
use crate::models::{
    Cart, CartTotals, Order, OrderLine, ShippingAddress, UserProfile, orders,
};
use crate::services::cart::{CartError, CartStore};

// =============================================================================
// Shipping form
// =============================================================================

/// A required checkout field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    FirstName,
    LastName,
    Phone,
    Email,
    StreetAddress,
    City,
    Country,
}

impl FormField {
    /// All required fields in form order.
    pub const ALL: [Self; 7] = [
        Self::FirstName,
        Self::LastName,
        Self::Phone,
        Self::Email,
        Self::StreetAddress,
        Self::City,
        Self::Country,
    ];

    /// The input's `id` attribute.
    #[must_use]
    pub const fn input_id(self) -> &'static str {
        match self {
            Self::FirstName => "first-name",
            Self::LastName => "last-name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::StreetAddress => "street-address",
            Self::City => "city",
            Self::Country => "country",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Phone => "Phone",
            Self::Email => "Email address",
            Self::StreetAddress => "Street address",
            Self::City => "Town / City",
            Self::Country => "Country",
        }
    }
}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// The billing and shipping form on the checkout page.
///
/// When a signed-in user's profile is known the contact and address fields
/// are pre-filled and locked; notes always stay editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub street_address: String,
    pub city: String,
    pub country: String,
    pub notes: String,
    locked: bool,
}

impl ShippingForm {
    /// Whether the profile-backed fields are read-only.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Fill the form from a profile and lock it. Blank profile values leave
    /// the typed value in place; the email falls back to the sign-in email.
    pub fn prefill(&mut self, profile: &UserProfile, sign_in_email: &Email) {
        fn take(slot: &mut String, value: &str) {
            let value = value.trim();
            if !value.is_empty() {
                value.clone_into(slot);
            }
        }

        take(&mut self.first_name, &profile.first_name);
        take(&mut self.last_name, &profile.last_name);
        take(&mut self.phone, &profile.phone);
        take(&mut self.street_address, &profile.address.street);
        take(&mut self.city, &profile.address.city);
        take(&mut self.country, &profile.address.country);
        if profile.email.trim().is_empty() {
            sign_in_email.as_str().clone_into(&mut self.email);
        } else {
            take(&mut self.email, &profile.email);
        }
        self.locked = true;
    }

    /// Make the profile-backed fields editable again (sign-out).
    pub const fn unlock(&mut self) {
        self.locked = false;
    }

    fn value(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Phone => &self.phone,
            FormField::Email => &self.email,
            FormField::StreetAddress => &self.street_address,
            FormField::City => &self.city,
            FormField::Country => &self.country,
        }
    }

    /// Check every required field and collect all failures.
    ///
    /// # Errors
    ///
    /// Returns one [`FieldError`] per failing field, in form order.
    pub fn validate(&self) -> Result<ShippingAddress, Vec<FieldError>> {
        let errors: Vec<FieldError> = FormField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = self.value(field).trim();
                if value.is_empty() {
                    return Some(FieldError {
                        field,
                        message: format!("{} is required.", field.label()),
                    });
                }
                if field == FormField::Email && Email::parse(value).is_err() {
                    return Some(FieldError {
                        field,
                        message: "Please enter a valid email address.".to_owned(),
                    });
                }
                None
            })
            .collect();

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ShippingAddress {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            email: self.email.trim().to_owned(),
            street_address: self.street_address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            country: self.country.trim().to_owned(),
        })
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("{} shipping field(s) invalid", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("sign-in required to place an order")]
    SignInRequired,

    /// Another submit of the same checkout has not finished.
    #[error("an order is already being placed")]
    InFlight,

    #[error(transparent)]
    Cart(#[from] CartError),

    /// Writing the order failed.
    #[error("order could not be saved: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => {
                "Your cart is empty. Please add items before placing an order.".to_owned()
            }
            Self::Invalid(_) => {
                "Please fill in all required fields and correct any errors.".to_owned()
            }
            Self::SignInRequired => {
                "You must be logged in to place an order. Please log in or sign up.".to_owned()
            }
            Self::InFlight => "Your order is already being placed.".to_owned(),
            Self::Cart(_) | Self::Store(_) => "There was an error placing your order. Please \
                 try again. If the problem persists, contact support."
                .to_owned(),
        }
    }
}

// =============================================================================
// Hand-off
// =============================================================================

/// Result of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub order_id: OrderId,
    pub totals: CartTotals,
    /// The confirmation message, plain text.
    pub message: String,
    /// `https://wa.me/{number}?text=...` with the message pre-filled.
    pub compose_link: String,
}

impl Receipt {
    /// Success notice shown after the hand-off opens.
    #[must_use]
    pub fn confirmation(&self) -> String {
        format!(
            "Your order (Order ID: {}) has been placed and details prepared for WhatsApp! \
             Please send the message to confirm your order. We will contact you shortly.",
            self.order_id
        )
    }
}

fn money(amount: Decimal) -> String {
    Price::usd(amount).display()
}

/// Order confirmation message sent to the store over WhatsApp.
#[must_use]
pub fn handoff_message(
    store_name: &str,
    order_id: &OrderId,
    address: &ShippingAddress,
    notes: &str,
    lines: &[OrderLine],
    totals: &CartTotals,
) -> String {
    let mut message = vec![
        format!("*New Order from {store_name}!*"),
        String::new(),
        "*Customer Details:*".to_owned(),
        format!("Name: {} {}", address.first_name, address.last_name),
        format!("Phone: {}", address.phone),
        format!("Email: {}", address.email),
        format!("Address: {}", address.one_line()),
    ];
    if !notes.is_empty() {
        message.push(format!("Notes: {notes}"));
    }
    message.push(String::new());
    message.push("*Order Summary:*".to_owned());
    message.extend(lines.iter().map(|line| {
        format!(
            "- {} x {} ({})",
            line.name,
            line.quantity,
            money(line.item_subtotal)
        )
    }));
    message.extend([
        String::new(),
        format!("Subtotal: {}", money(totals.subtotal)),
        format!("Shipping: {}", money(totals.shipping)),
        format!("*Total: {}*", money(totals.total)),
        String::new(),
        "*Payment Method: Cash on Delivery*".to_owned(),
        format!("Order ID: {order_id}"),
        "Please confirm this order.".to_owned(),
    ]);
    message.join("\n")
}

/// `wa.me` link with `message` pre-filled for `number` (digits only).
#[must_use]
pub fn compose_link(number: &str, message: &str) -> String {
    format!(
        "https://wa.me/{number}?text={}",
        urlencoding::encode(message)
    )
}

// =============================================================================
// CheckoutFlow
// =============================================================================

/// Clears the in-flight flag when a placement attempt ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Turns the cart and shipping form into a stored order and a hand-off link.
pub struct CheckoutFlow {
    store: Arc<dyn DocumentStore>,
    cart: CartStore,
    config: StoreConfig,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("store_name", &self.config.name)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, cart: CartStore, config: StoreConfig) -> Self {
        Self {
            store,
            cart,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Order summary for the checkout page.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Cart` if the cart cannot be read.
    pub fn summary(&self) -> Result<(Cart, CartTotals), CheckoutError> {
        let cart = self.cart.get()?;
        let totals = cart.totals(self.config.shipping_fee);
        Ok((cart, totals))
    }

    /// Place the order.
    ///
    /// # Errors
    ///
    /// - `EmptyCart`, `Invalid` or `SignInRequired` when a precondition
    ///   fails (checked in that order, before any remote call)
    /// - `InFlight` while another placement is running
    /// - `Store` if the order could not be written; the cart is kept
    /// - `Cart` if the cart could not be read
    #[instrument(skip(self, form, user), fields(uid = user.map(|u| u.uid.as_str())))]
    pub async fn place_order(
        &self,
        form: &ShippingForm,
        user: Option<&AuthUser>,
    ) -> Result<Receipt, CheckoutError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(CheckoutError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let cart = self.cart.get()?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let address = form.validate().map_err(CheckoutError::Invalid)?;
        let user = user.ok_or(CheckoutError::SignInRequired)?;

        let lines: Vec<OrderLine> = cart.lines().map(OrderLine::from).collect();
        let totals = cart.totals(self.config.shipping_fee);
        let notes = form.notes.trim().to_owned();
        let order = Order {
            id: OrderId::default(),
            user_id: user.uid.clone(),
            order_date: None,
            items: lines,
            shipping_address: address,
            order_notes: notes,
            payment_method: ruya_core::PaymentMethod::CashOnDelivery,
            status: ruya_core::OrderStatus::Pending,
            total_amount: totals.total,
        };

        let mut doc = document::to_document(orders().as_str(), &order)?;
        doc.insert("orderDate".to_owned(), server_timestamp());
        let order_id = match self.store.add(&orders(), doc).await {
            Ok(id) => OrderId::new(id),
            Err(e) => {
                error!(error = %e, "Failed to save order");
                return Err(e.into());
            }
        };

        let message = handoff_message(
            &self.config.name,
            &order_id,
            &order.shipping_address,
            &order.order_notes,
            &order.items,
            &totals,
        );
        let compose_link = compose_link(&self.config.whatsapp_number, &message);

        // The order exists now; a stale cart is better than a second order.
        if let Err(e) = self.cart.clear() {
            warn!(error = %e, "Order saved but cart could not be cleared");
        }

        info!(order_id = %order_id, total = %totals.total, "Order placed");
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_id", order_id.as_str())]),
        );

        Ok(Receipt {
            order_id,
            totals,
            message,
            compose_link,
        })
    }
}
