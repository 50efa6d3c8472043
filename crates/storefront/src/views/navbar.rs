//! Navbar account link.

use crate::services::SessionController;

/// Account link and greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavbarView {
    /// "Profile" when signed in, else "Login".
    pub label: &'static str,
    pub href: &'static str,
    /// "Hello, {name}" when signed in.
    pub greeting: Option<String>,
}

impl NavbarView {
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            label: "Login",
            href: "login.html",
            greeting: None,
        }
    }

    #[must_use]
    pub fn signed_in(display_name: &str) -> Self {
        Self {
            label: "Profile",
            href: "profile.html",
            greeting: Some(format!("Hello, {display_name}")),
        }
    }
}

impl From<&SessionController> for NavbarView {
    fn from(session: &SessionController) -> Self {
        session
            .display_name()
            .map_or_else(Self::signed_out, Self::signed_in)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use ruya_core::Email;

    use super::*;
    use crate::backend::{AuthProvider, MemoryAuth, MemoryStore};

    #[tokio::test]
    async fn test_navbar_follows_session() {
        let auth = MemoryAuth::new();
        let email = Email::parse("omar@example.com").unwrap();
        auth.register(&email, "secret1");

        let mut session = SessionController::new(&auth, Arc::new(MemoryStore::new()));
        session.sync().await;
        assert_eq!(NavbarView::from(&session), NavbarView::signed_out());

        auth.sign_in(&email, "secret1").await.unwrap();
        session.sync().await;
        let navbar = NavbarView::from(&session);
        assert_eq!(navbar.label, "Profile");
        assert_eq!(navbar.greeting.as_deref(), Some("Hello, omar@example.com"));
    }
}
