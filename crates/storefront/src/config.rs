//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_PROJECT_ID` - Firebase project hosting the catalog and orders
//! - `FIREBASE_API_KEY` - Web API key of the project (placeholder and entropy checked)
//! - `STOREFRONT_WHATSAPP_NUMBER` - Number orders are handed off to, international format
//!
//! ## Optional
//! - `STOREFRONT_NAME` - Store name used in order messages (default: Ruءya Eyewear)
//! - `STOREFRONT_SHIPPING_FEE` - Flat shipping fee in dollars (default: 10.00)
//! - `STOREFRONT_DATA_DIR` - Directory for the locally persisted cart (default: .storefront)
//! - `FIRESTORE_BASE_URL` - Firestore REST base URL, e.g. for the emulator
//! - `IDENTITY_TOOLKIT_BASE_URL` - Identity Toolkit REST base URL, e.g. for the emulator
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STORE_NAME: &str = "Ruءya Eyewear";
const DEFAULT_SHIPPING_FEE: &str = "10.00";
const DEFAULT_DATA_DIR: &str = ".storefront";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1/";
const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1/";

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shop identity and checkout settings
    pub store: StoreConfig,
    /// Hosted backend settings
    pub firebase: FirebaseConfig,
    /// Directory holding the persisted cart
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Shop identity and checkout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store name shown in order messages
    pub name: String,
    /// Order hand-off number, digits only
    pub whatsapp_number: String,
    /// Flat shipping fee added to every order
    pub shipping_fee: Decimal,
}

impl StoreConfig {
    /// Settings with the default name and shipping fee.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `whatsapp_number` is not a phone number.
    pub fn new(whatsapp_number: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: DEFAULT_STORE_NAME.to_owned(),
            whatsapp_number: parse_phone_number(whatsapp_number, "STOREFRONT_WHATSAPP_NUMBER")?,
            shipping_fee: Decimal::new(1000, 2),
        })
    }
}

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Project id
    pub project_id: String,
    /// Web API key
    pub api_key: SecretString,
    /// Firestore REST base URL
    pub firestore_url: Url,
    /// Identity Toolkit REST base URL
    pub auth_url: Url,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("firestore_url", &self.firestore_url.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration from explicit key/value pairs.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| vars.get(key).cloned())
    }

    fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        let store = StoreConfig {
            name: get_env_or_default(env, "STOREFRONT_NAME", DEFAULT_STORE_NAME),
            whatsapp_number: parse_phone_number(
                &get_required_env(env, "STOREFRONT_WHATSAPP_NUMBER")?,
                "STOREFRONT_WHATSAPP_NUMBER",
            )?,
            shipping_fee: parse_shipping_fee(&get_env_or_default(
                env,
                "STOREFRONT_SHIPPING_FEE",
                DEFAULT_SHIPPING_FEE,
            ))?,
        };

        let firebase = FirebaseConfig {
            project_id: get_required_env(env, "FIREBASE_PROJECT_ID")?,
            api_key: get_validated_secret(env, "FIREBASE_API_KEY")?,
            firestore_url: get_url(env, "FIRESTORE_BASE_URL", DEFAULT_FIRESTORE_URL)?,
            auth_url: get_url(env, "IDENTITY_TOOLKIT_BASE_URL", DEFAULT_IDENTITY_TOOLKIT_URL)?,
        };

        Ok(Self {
            store,
            firebase,
            data_dir: PathBuf::from(get_env_or_default(env, "STOREFRONT_DATA_DIR", DEFAULT_DATA_DIR)),
            sentry_dsn: get_optional_env(env, "SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Get an optional variable, treating blank values as unset.
fn get_optional_env(env: &Lookup<'_>, key: &str) -> Option<String> {
    env(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Get a required variable.
fn get_required_env(env: &Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a variable with a default value.
fn get_env_or_default(env: &Lookup<'_>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

fn get_url(env: &Lookup<'_>, key: &str, default: &str) -> Result<Url, ConfigError> {
    Url::parse(&get_env_or_default(env, key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Keep the digits of an international phone number (`+961 70-123 456` -> `96170123456`).
fn parse_phone_number(raw: &str, var_name: &str) -> Result<String, ConfigError> {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')');
    if !raw.chars().all(allowed) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "phone number may only contain digits, spaces, '+', '-' and parentheses".to_string(),
        ));
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!(
                "phone number must have {MIN_PHONE_DIGITS}-{MAX_PHONE_DIGITS} digits (got {})",
                digits.len()
            ),
        ));
    }
    Ok(digits)
}

fn parse_shipping_fee(raw: &str) -> Result<Decimal, ConfigError> {
    let fee = Decimal::from_str(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("STOREFRONT_SHIPPING_FEE".to_string(), e.to_string())
    })?;
    if fee.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_SHIPPING_FEE".to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(fee)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the Firebase console."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret.
fn get_validated_secret(env: &Lookup<'_>, key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(env, key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const API_KEY: &str = "AIzaSyB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = [
            ("FIREBASE_PROJECT_ID", "ruya-eyewear"),
            ("FIREBASE_API_KEY", API_KEY),
            ("STOREFRONT_WHATSAPP_NUMBER", "+961 70 123 456"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        for (k, v) in pairs {
            vars.insert((*k).to_owned(), (*v).to_owned());
        }
        vars
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_vars(&vars(&[])).unwrap();
        assert_eq!(config.store.name, "Ruءya Eyewear");
        assert_eq!(config.store.whatsapp_number, "96170123456");
        assert_eq!(config.store.shipping_fee, Decimal::new(1000, 2));
        assert_eq!(config.data_dir, PathBuf::from(".storefront"));
        assert_eq!(
            config.firebase.firestore_url.as_str(),
            "https://firestore.googleapis.com/v1/"
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_vars(&vars(&[
            ("STOREFRONT_NAME", "Ruya Test"),
            ("STOREFRONT_SHIPPING_FEE", "4.50"),
            ("FIRESTORE_BASE_URL", "http://127.0.0.1:8080/v1/"),
            ("STOREFRONT_DATA_DIR", "/tmp/ruya"),
        ]))
        .unwrap();
        assert_eq!(config.store.name, "Ruya Test");
        assert_eq!(config.store.shipping_fee, Decimal::new(450, 2));
        assert_eq!(config.firebase.firestore_url.host_str(), Some("127.0.0.1"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ruya"));
    }

    #[test]
    fn test_missing_required() {
        let mut env = vars(&[]);
        env.remove("STOREFRONT_WHATSAPP_NUMBER");
        assert!(matches!(
            StorefrontConfig::from_vars(&env),
            Err(ConfigError::MissingEnvVar(key)) if key == "STOREFRONT_WHATSAPP_NUMBER"
        ));

        let blank = vars(&[("FIREBASE_PROJECT_ID", "  ")]);
        assert!(matches!(
            StorefrontConfig::from_vars(&blank),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("STOREFRONT_SHIPPING_FEE", "ten"),
            ("STOREFRONT_SHIPPING_FEE", "-1"),
            ("STOREFRONT_WHATSAPP_NUMBER", "call me"),
            ("STOREFRONT_WHATSAPP_NUMBER", "+1 23"),
            ("IDENTITY_TOOLKIT_BASE_URL", "not a url"),
        ] {
            assert!(
                matches!(
                    StorefrontConfig::from_vars(&vars(&[(key, value)])),
                    Err(ConfigError::InvalidEnvVar(_, _))
                ),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_api_key_placeholder_rejected() {
        let env = vars(&[("FIREBASE_API_KEY", "your-firebase-api-key")]);
        assert!(matches!(
            StorefrontConfig::from_vars(&env),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(API_KEY) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_firebase_config_debug_redacts_key() {
        let config = StorefrontConfig::from_vars(&vars(&[])).unwrap();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("ruya-eyewear"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(API_KEY));
    }

    #[test]
    fn test_store_config_new() {
        let store = StoreConfig::new("+44 (20) 7946-0958").unwrap();
        assert_eq!(store.whatsapp_number, "442079460958");
        assert_eq!(store.shipping_fee, Decimal::new(1000, 2));
    }
}
