//! Unified error handling with Sentry integration.
//!
//! Every area has its own error enum; `AppError` wraps them so the host can
//! show one message and report one event. Remote and internal failures are
//! captured to Sentry by [`AppError::report`]; user mistakes (form errors,
//! missing sign-in) are not.

use ruya_core::{Email, UserId};
use thiserror::Error;

use crate::backend::{AuthError, SlotError, StoreError};
use crate::config::ConfigError;
use crate::services::account::AccountError;
use crate::services::cart::CartError;
use crate::services::catalog::CatalogError;
use crate::services::checkout::CheckoutError;
use crate::services::favorites::FavoriteError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Sign-up or sign-in form rejected.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Cart storage failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog query failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Favorite toggle failed.
    #[error("Favorite error: {0}")]
    Favorite(#[from] FavoriteError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Slot(#[from] SlotError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Whether this is a remote or internal failure worth reporting, as
    /// opposed to something the shopper can fix.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Store(_) | Self::Cart(_) | Self::Slot(_) | Self::Config(_) => true,
            Self::Auth(e) | Self::Account(AccountError::Auth(e)) => e.is_remote_failure(),
            Self::Account(AccountError::PasswordTooShort) => false,
            Self::Catalog(e) => matches!(e, CatalogError::Store(_)),
            Self::Favorite(e) => matches!(e, FavoriteError::Store(_)),
            Self::Checkout(e) => matches!(e, CheckoutError::Store(_) | CheckoutError::Cart(_)),
        }
    }

    /// Message for the page. Never includes internal detail.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) | Self::Slot(_) | Self::Config(_) => {
                "Something went wrong. Please try again later.".to_owned()
            }
            Self::Auth(e) => e.user_message(),
            Self::Account(e) => e.user_message(),
            Self::Cart(_) => "Your cart could not be updated. Please try again.".to_owned(),
            Self::Catalog(e) => e.user_message(),
            Self::Favorite(e) => e.user_message(),
            Self::Checkout(e) => e.user_message(),
        }
    }

    /// Capture reportable errors to Sentry and log them. Returns the message
    /// to show.
    pub fn report(&self) -> String {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, "Rejected user action");
        }
        self.user_message()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with users.
pub fn set_sentry_user(user_id: &UserId, email: &Email) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_owned(),
                serde_json::Value::String((*value).to_owned()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use ruya_core::ProductId;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(CatalogError::ProductNotFound(ProductId::new("p-123")));
        assert_eq!(err.to_string(), "Catalog error: product not found: p-123");
    }

    #[test]
    fn test_user_errors_are_not_reported() {
        assert!(!AppError::from(CheckoutError::EmptyCart).is_reportable());
        assert!(!AppError::from(FavoriteError::SignInRequired).is_reportable());
        assert!(!AppError::from(AuthError::InvalidCredentials).is_reportable());
        assert!(!AppError::from(AccountError::PasswordTooShort).is_reportable());
    }

    #[test]
    fn test_remote_failures_are_reported_without_detail() {
        let err = AppError::from(StoreError::Service("503 from upstream".to_owned()));
        assert!(err.is_reportable());
        assert!(!err.user_message().contains("503"));

        let err = AppError::from(CheckoutError::Store(StoreError::Network(
            "connection reset".to_owned(),
        )));
        assert!(err.is_reportable());
        assert_eq!(
            err.report(),
            "There was an error placing your order. Please try again. If the problem \
             persists, contact support."
        );
    }

    #[test]
    fn test_user_message_passthrough() {
        let err = AppError::from(FavoriteError::SignInRequired);
        assert_eq!(err.user_message(), "Please log in to add items to your favorites.");
    }
}
