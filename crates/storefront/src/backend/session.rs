//! Session-change stream.
//!
//! An auth provider owns a [`SessionFeed`] and publishes every sign-in and
//! sign-out to it. Consumers hold a [`SessionSubscription`]: the first
//! `next()` resolves immediately with the current session, later calls wait
//! for the next change. Dropping the subscription (or calling
//! [`SessionSubscription::unsubscribe`]) stops delivery.

use ruya_core::{Email, UserId};
use secrecy::SecretString;
use tokio::sync::watch;

/// A signed-in user as reported by the auth service.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Stable user id (also the profile document id).
    pub uid: UserId,
    /// Sign-in email.
    pub email: Email,
    /// Bearer token for document store calls, when the provider issues one.
    pub id_token: Option<SecretString>,
}

impl AuthUser {
    /// A user without a bearer token.
    #[must_use]
    pub const fn new(uid: UserId, email: Email) -> Self {
        Self {
            uid,
            email,
            id_token: None,
        }
    }
}

/// Publisher side of the session stream.
#[derive(Debug)]
pub struct SessionFeed {
    sender: watch::Sender<Option<AuthUser>>,
}

impl SessionFeed {
    /// A feed with no active session.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replace the current session and wake subscribers.
    pub fn publish(&self, user: Option<AuthUser>) {
        tracing::debug!(
            signed_in = user.is_some(),
            uid = user.as_ref().map(|u| u.uid.as_str()),
            "Session changed"
        );
        self.sender.send_replace(user);
    }

    /// Open a subscription.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
            delivered_initial: false,
        }
    }
}

impl Default for SessionFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of the session stream.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: watch::Receiver<Option<AuthUser>>,
    delivered_initial: bool,
}

impl SessionSubscription {
    /// Next session state.
    ///
    /// The first call returns the current state without waiting. Returns
    /// `None` once the provider has gone away. Rapid successive changes may
    /// be coalesced into the latest one.
    pub async fn next(&mut self) -> Option<Option<AuthUser>> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            return Some(self.receiver.borrow_and_update().clone());
        }
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Peek at the current state without consuming a change.
    #[must_use]
    pub fn current(&self) -> Option<AuthUser> {
        self.receiver.borrow().clone()
    }

    /// Stop receiving changes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}
