//! Sign-up, sign-in, sign-out and password reset.

use std::sync::Arc;

use ruya_core::Email;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::backend::{AuthError, AuthProvider, AuthUser, DocumentStore, document, server_timestamp};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{Address, UserProfile, users};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Notice shown after a successful sign-up.
pub const SIGN_UP_SUCCESS: &str = "Account created successfully! You are now logged in.";

/// Notice shown after a reset link was sent.
pub const RESET_SENT: &str = "Password reset email sent! Please check your inbox (and spam folder).";

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AccountError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PasswordTooShort => {
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long.")
            }
            Self::Auth(e) => e.user_message(),
        }
    }
}

/// Sign-up form fields.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street_address: String,
    pub city: String,
    pub country: String,
    pub password: String,
    pub confirm_password: String,
}

/// Account operations over an auth provider and the profile collection.
#[derive(Clone)]
pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

impl AccountService {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { auth, store }
    }

    /// Create an account, sign it in and write its profile.
    ///
    /// Password confirmation, length and email format are checked before
    /// any remote call.
    ///
    /// # Errors
    ///
    /// - `Auth(PasswordMismatch)`, `PasswordTooShort` or `Auth(InvalidEmail)`
    ///   for form errors
    /// - `Auth(..)` for rejections from the auth service
    /// - `Auth(Profile(..))` if the account was created but the profile write
    ///   failed
    #[instrument(skip(self, form))]
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<AuthUser, AccountError> {
        if form.password != form.confirm_password {
            return Err(AuthError::PasswordMismatch.into());
        }
        if form.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AccountError::PasswordTooShort);
        }
        let email = Email::parse(&form.email).map_err(AuthError::from)?;

        let user = self.auth.create_account(&email, &form.password).await?;

        let profile = UserProfile {
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
            email: email.as_str().to_owned(),
            phone: form.phone.trim().to_owned(),
            address: Address {
                street: form.street_address.trim().to_owned(),
                city: form.city.trim().to_owned(),
                country: form.country.trim().to_owned(),
            },
            created_at: None,
        };
        let path = users().doc(user.uid.as_str());
        let mut doc = document::to_document(&path.to_string(), &profile).map_err(AuthError::from)?;
        doc.insert("createdAt".to_owned(), server_timestamp());
        if let Err(e) = self.store.set(&path, doc).await {
            warn!(uid = %user.uid, error = %e, "Account created without a profile");
            return Err(AuthError::from(e).into());
        }

        info!(uid = %user.uid, "Account created");
        set_sentry_user(&user.uid, &user.email);
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `Auth(InvalidEmail)` for a malformed email, otherwise whatever
    /// the auth service rejects with.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AccountError> {
        let email = Email::parse(email).map_err(AuthError::from)?;
        let user = self.auth.sign_in(&email, password).await?;
        info!(uid = %user.uid, "Signed in");
        set_sentry_user(&user.uid, &user.email);
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `Auth(..)` if the provider fails to end the session.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AccountError> {
        self.auth.sign_out().await?;
        clear_sentry_user();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Auth(InvalidEmail)` for a malformed email, otherwise whatever
    /// the auth service rejects with.
    #[instrument(skip(self))]
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let email = Email::parse(email).map_err(AuthError::from)?;
        self.auth.send_password_reset(&email).await?;
        info!("Password reset requested");
        Ok(())
    }
}
