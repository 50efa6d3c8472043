//! Session controller: follows the auth provider's session stream and keeps
//! the signed-in user's profile at hand for the navbar and checkout form.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::backend::{AuthProvider, AuthUser, DocumentStore, SessionSubscription, document};
use crate::models::{UserProfile, users};
use crate::services::checkout::ShippingForm;

/// What a session change did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn,
    SignedOut,
}

/// Single source of session truth for the rest of the storefront.
///
/// Call [`sync`](Self::sync) in the host's event loop; every other component
/// reads the user through [`user`](Self::user).
pub struct SessionController {
    subscription: SessionSubscription,
    store: Arc<dyn DocumentStore>,
    user: Option<AuthUser>,
    profile: Option<UserProfile>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("uid", &self.user.as_ref().map(|u| u.uid.as_str()))
            .field("has_profile", &self.profile.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Subscribe to `auth`. Nothing is known until the first [`sync`](Self::sync).
    #[must_use]
    pub fn new(auth: &dyn AuthProvider, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            subscription: auth.subscribe(),
            store,
            user: None,
            profile: None,
        }
    }

    /// Wait for the next session state and apply it. The first call returns
    /// immediately with the current state.
    ///
    /// Returns `None` once the auth provider has gone away.
    #[instrument(skip(self))]
    pub async fn sync(&mut self) -> Option<SessionChange> {
        let next = self.subscription.next().await?;
        Some(self.apply(next).await)
    }

    async fn apply(&mut self, user: Option<AuthUser>) -> SessionChange {
        let Some(user) = user else {
            self.user = None;
            self.profile = None;
            debug!("Signed out");
            return SessionChange::SignedOut;
        };

        let path = users().doc(user.uid.as_str());
        self.profile = match self.store.get(&path).await {
            Ok(Some(doc)) => match document::from_document::<UserProfile>(&path, doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(error = %e, "Unreadable profile document");
                    None
                }
            },
            Ok(None) => {
                debug!("No profile document");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch profile");
                None
            }
        };
        debug!(uid = %user.uid, "Signed in");
        self.user = Some(user);
        SessionChange::SignedIn
    }

    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// First name for greetings, else the sign-in email.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        let email = user.email.as_str();
        Some(
            self.profile
                .as_ref()
                .map_or(email, |p| p.display_name(email)),
        )
    }

    /// Bring an open checkout form in line with the session: pre-fill and
    /// lock it for a signed-in user, unlock it otherwise.
    pub fn apply_to_form(&self, form: &mut ShippingForm) {
        match (&self.user, &self.profile) {
            (Some(user), Some(profile)) => form.prefill(profile, &user.email),
            (Some(user), None) => form.prefill(&UserProfile::default(), &user.email),
            (None, _) => form.unlock(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ruya_core::Email;
    use serde_json::json;

    use super::*;
    use crate::backend::{MemoryAuth, MemoryStore, StoreOperation};

    fn profile_doc() -> crate::backend::Document {
        json!({
            "firstName": "Layla",
            "lastName": "Haddad",
            "email": "layla@example.com",
            "phone": "+96170123456",
            "address": {"street": "Hamra St 12", "city": "Beirut", "country": "Lebanon"}
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[tokio::test]
    async fn test_first_sync_fires_immediately() {
        let auth = MemoryAuth::new();
        let mut session = SessionController::new(&auth, Arc::new(MemoryStore::new()));
        assert_eq!(session.sync().await, Some(SessionChange::SignedOut));
        assert!(session.display_name().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_loads_profile_and_locks_form() {
        let auth = MemoryAuth::new();
        let store = Arc::new(MemoryStore::new());
        let email = Email::parse("layla@example.com").unwrap();
        let uid = auth.register(&email, "secret1");
        store.insert(&users(), uid.as_str(), profile_doc());

        let mut session = SessionController::new(&auth, store);
        session.sync().await;
        auth.sign_in(&email, "secret1").await.unwrap();
        assert_eq!(session.sync().await, Some(SessionChange::SignedIn));
        assert_eq!(session.display_name(), Some("Layla"));

        let mut form = ShippingForm::default();
        session.apply_to_form(&mut form);
        assert!(form.is_locked());
        assert_eq!(form.street_address, "Hamra St 12");

        auth.sign_out().await.unwrap();
        assert_eq!(session.sync().await, Some(SessionChange::SignedOut));
        session.apply_to_form(&mut form);
        assert!(!form.is_locked());
    }

    #[tokio::test]
    async fn test_profile_failure_falls_back_to_email() {
        let auth = MemoryAuth::new();
        let store = Arc::new(MemoryStore::new());
        let email = Email::parse("omar@example.com").unwrap();
        auth.register(&email, "secret1");
        store.fail(StoreOperation::Get);

        let mut session = SessionController::new(&auth, store);
        auth.sign_in(&email, "secret1").await.unwrap();
        assert_eq!(session.sync().await, Some(SessionChange::SignedIn));
        assert!(session.profile().is_none());
        assert_eq!(session.display_name(), Some("omar@example.com"));
    }
}
