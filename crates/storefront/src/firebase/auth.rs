//! Identity Toolkit REST implementation of [`AuthProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use ruya_core::{Email, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use crate::backend::{AuthError, AuthProvider, AuthUser, SessionFeed, SessionSubscription};
use crate::config::FirebaseConfig;

/// Successful sign-up / sign-in response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    email: String,
    local_id: String,
}

/// Firebase email/password authentication.
///
/// Sessions live in this process: sign-in publishes the user with their ID
/// token to the session feed, sign-out clears it.
#[derive(Clone)]
pub struct FirebaseAuth {
    inner: Arc<FirebaseAuthInner>,
}

struct FirebaseAuthInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    feed: SessionFeed,
}

impl FirebaseAuth {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(FirebaseAuthInner {
                client: reqwest::Client::new(),
                base_url: config.auth_url.as_str().trim_end_matches('/').to_owned(),
                api_key: config.api_key.clone(),
                feed: SessionFeed::new(),
            }),
        }
    }

    fn url(&self, method: &str) -> Result<Url, AuthError> {
        let mut url = Url::parse(&format!("{}/accounts:{method}", self.inner.base_url))
            .map_err(|e| AuthError::Service(format!("invalid auth URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        Ok(url)
    }

    async fn call(&self, method: &str, body: &Value) -> Result<Value, AuthError> {
        let response = self
            .inner
            .client
            .post(self.url(method)?)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;
        if status.is_success() {
            return Ok(body);
        }

        let code = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        debug!(status = %status, code, "Identity Toolkit rejected request");
        Err(map_error_code(code))
    }

    async fn token_call(&self, method: &str, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        let body = self
            .call(
                method,
                &json!({ "email": email.as_str(), "password": password, "returnSecureToken": true }),
            )
            .await?;
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| AuthError::Service(format!("unreadable token response: {e}")))?;

        let user = AuthUser {
            uid: UserId::new(token.local_id),
            email: Email::parse(&token.email)?,
            id_token: Some(SecretString::from(token.id_token)),
        };
        self.inner.feed.publish(Some(user.clone()));
        Ok(user)
    }
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("base_url", &self.inner.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Map an Identity Toolkit error code (`"WEAK_PASSWORD : Password should..."`).
fn map_error_code(code: &str) -> AuthError {
    let (name, detail) = code
        .split_once(" : ")
        .map_or((code, ""), |(name, detail)| (name.trim(), detail.trim()));
    match name {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
        "WEAK_PASSWORD" => AuthError::WeakPassword(detail.to_owned()),
        "INVALID_EMAIL" => AuthError::InvalidEmail(ruya_core::EmailError::InvalidDomain),
        "USER_DISABLED" => AuthError::AccountDisabled,
        name if name.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") => AuthError::TooManyRequests,
        _ => AuthError::Service(code.to_owned()),
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn create_account(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        self.token_call("signUp", email, password).await
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        self.token_call("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.feed.publish(None);
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn send_password_reset(&self, email: &Email) -> Result<(), AuthError> {
        self.call(
            "sendOobCode",
            &json!({ "requestType": "PASSWORD_RESET", "email": email.as_str() }),
        )
        .await?;
        Ok(())
    }

    fn subscribe(&self) -> SessionSubscription {
        self.inner.feed.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn auth() -> FirebaseAuth {
        FirebaseAuth::new(&FirebaseConfig {
            project_id: "ruya-test".to_owned(),
            api_key: SecretString::from("AIzaSyTestKey0123456789abcdefghijklmno".to_owned()),
            firestore_url: Url::parse("https://firestore.googleapis.com/v1/").unwrap(),
            auth_url: Url::parse("https://identitytoolkit.googleapis.com/v1/").unwrap(),
        })
    }

    #[test]
    fn test_endpoint_urls() {
        let url = auth().url("signInWithPassword").unwrap();
        assert_eq!(url.path(), "/v1/accounts:signInWithPassword");
        assert_eq!(url.query_pairs().next().unwrap().0, "key");
    }

    #[test]
    fn test_error_codes() {
        assert!(matches!(map_error_code("EMAIL_EXISTS"), AuthError::EmailAlreadyInUse));
        assert!(matches!(
            map_error_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            map_error_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled"),
            AuthError::TooManyRequests
        ));
        match map_error_code("WEAK_PASSWORD : Password should be at least 6 characters") {
            AuthError::WeakPassword(detail) => {
                assert_eq!(detail, "Password should be at least 6 characters");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(map_error_code("OPERATION_NOT_ALLOWED"), AuthError::Service(_)));
    }

    #[tokio::test]
    async fn test_sign_out_publishes_none() {
        let auth = auth();
        let mut session = auth.subscribe();
        assert!(session.next().await.unwrap().is_none());
        auth.sign_out().await.unwrap();
        assert!(session.next().await.unwrap().is_none());
    }
}
