//! Cart store over a client-local key-value slot.
//!
//! The whole cart lives under one slot key as a JSON object keyed by product
//! id. Every mutation reads the slot, applies the change and writes the full
//! cart back, so the slot is always the single source of truth.

use std::sync::Arc;

use ruya_core::ProductId;
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::{KeyValueSlot, SlotError};
use crate::error::add_breadcrumb;
use crate::models::{Cart, CartLine, ProductSnapshot};

/// Slot key holding the cart.
pub const CART_KEY: &str = "cart";

/// Errors from the cart store.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reading or writing the slot failed.
    #[error("cart storage error: {0}")]
    Slot(#[from] SlotError),

    /// The cart could not be serialized.
    #[error("cart encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Client-local shopping cart.
#[derive(Clone)]
pub struct CartStore {
    slot: Arc<dyn KeyValueSlot>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").finish_non_exhaustive()
    }
}

impl CartStore {
    #[must_use]
    pub fn new(slot: Arc<dyn KeyValueSlot>) -> Self {
        Self { slot }
    }

    /// Current cart contents.
    ///
    /// Unreadable stored data is treated as an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Slot` if the slot cannot be read.
    pub fn get(&self) -> Result<Cart, CartError> {
        let Some(raw) = self.slot.read(CART_KEY)? else {
            return Ok(Cart::default());
        };
        match serde_json::from_str::<Cart>(&raw) {
            Ok(mut cart) => {
                let dropped = cart.retain_valid();
                if dropped > 0 {
                    warn!(dropped, "Ignoring invalid cart lines");
                }
                Ok(cart)
            }
            Err(e) => {
                warn!(error = %e, "Stored cart is malformed, starting empty");
                Ok(Cart::default())
            }
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), CartError> {
        let raw = serde_json::to_string(cart)?;
        self.slot.write(CART_KEY, &raw)?;
        Ok(())
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line keeps its position, gains the quantity and takes the
    /// snapshot's name, price and image. Adding zero units changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the slot cannot be read or written.
    pub fn add(&self, snapshot: &ProductSnapshot, quantity: u32) -> Result<Cart, CartError> {
        let mut cart = self.get()?;
        if quantity == 0 {
            return Ok(cart);
        }

        if let Some(line) = cart.get_mut(&snapshot.id) {
            let merged = CartLine::new(snapshot, line.quantity.saturating_add(quantity));
            *line = merged;
        } else {
            cart.insert(CartLine::new(snapshot, quantity));
        }
        self.save(&cart)?;

        debug!(product_id = %snapshot.id, quantity, "Added to cart");
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", snapshot.id.as_str())]),
        );
        Ok(cart)
    }

    /// Set a line's quantity. Zero or less removes the line; unknown products
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the slot cannot be read or written.
    pub fn set_quantity(&self, id: &ProductId, quantity: i64) -> Result<Cart, CartError> {
        let Ok(quantity) = u32::try_from(quantity) else {
            return if quantity <= 0 {
                self.remove(id)
            } else {
                self.set_quantity(id, i64::from(u32::MAX))
            };
        };
        if quantity == 0 {
            return self.remove(id);
        }

        let mut cart = self.get()?;
        let Some(line) = cart.get_mut(id) else {
            return Ok(cart);
        };
        line.quantity = quantity;
        self.save(&cart)?;
        debug!(product_id = %id, quantity, "Cart quantity changed");
        Ok(cart)
    }

    /// Remove a product's line. Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the slot cannot be read or written.
    pub fn remove(&self, id: &ProductId) -> Result<Cart, CartError> {
        let mut cart = self.get()?;
        if cart.remove(id).is_some() {
            self.save(&cart)?;
            debug!(product_id = %id, "Removed from cart");
        }
        Ok(cart)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Slot` if the slot cannot be written.
    pub fn clear(&self) -> Result<(), CartError> {
        self.slot.remove(CART_KEY)?;
        debug!("Cart cleared");
        Ok(())
    }

    /// Total units in the cart, for the navbar badge.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Slot` if the slot cannot be read.
    pub fn item_count(&self) -> Result<u64, CartError> {
        Ok(self.get()?.item_count())
    }
}
