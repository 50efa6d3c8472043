//! Authentication service contract.

use async_trait::async_trait;
use ruya_core::{Email, EmailError};
use thiserror::Error;

use super::document::StoreError;
use super::session::{AuthUser, SessionSubscription};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong password or unknown account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// Password rejected by the password policy.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Sign-up password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The service is throttling this client.
    #[error("too many requests")]
    TooManyRequests,

    /// The account has been disabled.
    #[error("account disabled")]
    AccountDisabled,

    /// Profile document read or write failed.
    #[error("profile store error: {0}")]
    Profile(#[from] StoreError),

    /// Any other answer from the service.
    #[error("auth service error: {0}")]
    Service(String),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Message to show next to the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email format.".to_owned(),
            Self::InvalidCredentials => "Invalid email or password.".to_owned(),
            Self::EmailAlreadyInUse => "This email address is already in use.".to_owned(),
            Self::WeakPassword(_) => {
                "Password is too weak. Please choose a stronger one.".to_owned()
            }
            Self::PasswordMismatch => "Passwords do not match.".to_owned(),
            Self::TooManyRequests => {
                "Too many login attempts. Please try again later.".to_owned()
            }
            Self::AccountDisabled => "This account has been disabled.".to_owned(),
            Self::Profile(_) | Self::Service(_) | Self::Http(_) => {
                "Authentication failed. Please try again.".to_owned()
            }
        }
    }

    /// Whether this came from the remote side rather than user input.
    #[must_use]
    pub const fn is_remote_failure(&self) -> bool {
        matches!(self, Self::Profile(_) | Self::Service(_) | Self::Http(_))
    }
}

/// Remote authentication service.
///
/// Successful `create_account` and `sign_in` calls sign the user in and
/// publish the new session to subscribers; `sign_out` publishes `None`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a new account and sign it in.
    async fn create_account(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Email a password reset link.
    async fn send_password_reset(&self, email: &Email) -> Result<(), AuthError>;

    /// Subscribe to session changes; fires immediately with the current session.
    fn subscribe(&self) -> SessionSubscription;
}
