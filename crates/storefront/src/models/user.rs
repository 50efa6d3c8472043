//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile document at `users/{uid}`, written at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    /// Stamped by the store on write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Postal address on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub country: String,
}

impl UserProfile {
    /// Name for greetings: first name, else `fallback` (usually the email).
    #[must_use]
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        let first = self.first_name.trim();
        if first.is_empty() { fallback } else { first }
    }
}
