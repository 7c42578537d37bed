//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_STORAGE_DIR` - Directory for persisted client state (default: `.freshcart`)
//! - `STOREFRONT_CURRENCY` - ISO 4217 currency the cart is priced in (default: SEK)
//! - `SHIPPING_API_URL` - Base URL of the shipping-rate service; quoting is
//!   disabled when unset
//! - `SHIPPING_API_KEY` - Bearer token for the shipping-rate service
//! - `SHIPPING_TIMEOUT_SECS` - Rate request timeout in seconds (default: 10)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use freshcart_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".freshcart";
const DEFAULT_SHIPPING_TIMEOUT_SECS: u64 = 10;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory for `FileStorage`
    pub storage_dir: PathBuf,
    /// Currency the cart is priced in
    pub currency: CurrencyCode,
    /// Shipping-rate service, if configured
    pub shipping: Option<ShippingConfig>,
}

/// Shipping-rate service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ShippingConfig {
    /// Service base URL (e.g., `https://rates.example.se/api/`)
    pub api_url: Url,
    /// Bearer token, if the service requires one
    pub api_key: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ShippingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
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
    /// Returns `ConfigError` if a variable is invalid or the API key fails
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage_dir = PathBuf::from(get_env_or_default(
            "STOREFRONT_STORAGE_DIR",
            DEFAULT_STORAGE_DIR,
        ));
        let currency = get_env_or_default("STOREFRONT_CURRENCY", "SEK")
            .parse::<CurrencyCode>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_CURRENCY".to_string(), e.to_string())
            })?;

        let shipping = match get_optional_env("SHIPPING_API_URL") {
            Some(url) => Some(ShippingConfig::from_env(&url)?),
            None => None,
        };

        Ok(Self {
            storage_dir,
            currency,
            shipping,
        })
    }

    /// The shipping configuration, or an error naming the missing variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `SHIPPING_API_URL` was unset.
    pub fn require_shipping(&self) -> Result<&ShippingConfig, ConfigError> {
        self.shipping
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SHIPPING_API_URL".to_string()))
    }
}

impl ShippingConfig {
    fn from_env(raw_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_base_url(raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SHIPPING_API_URL".to_string(), e))?;

        let api_key = match get_optional_env("SHIPPING_API_KEY") {
            Some(key) => {
                validate_secret_strength(&key, "SHIPPING_API_KEY")?;
                Some(SecretString::from(key))
            }
            None => None,
        };

        let timeout_secs = get_env_or_default(
            "SHIPPING_TIMEOUT_SECS",
            &DEFAULT_SHIPPING_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("SHIPPING_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The rate calculation endpoint under the base URL.
    #[must_use]
    pub fn calculate_endpoint(&self) -> Url {
        // Base URLs always end in '/', so joining a relative path cannot fail
        self.api_url
            .join("shipping/calculate")
            .unwrap_or_else(|_| self.api_url.clone())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an http(s) URL and make sure its path ends in `/` so relative joins
/// append rather than replace the last segment.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme: {}", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
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
    let len = s.len() as f64;
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

    // Real API keys have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("https://rates.example.se/api").unwrap();
        assert_eq!(url.as_str(), "https://rates.example.se/api/");
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("ftp://rates.example.se/").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_calculate_endpoint() {
        let config = ShippingConfig {
            api_url: parse_base_url("https://rates.example.se").unwrap(),
            api_key: None,
            timeout: Duration::from_secs(10),
        };
        assert_eq!(
            config.calculate_endpoint().as_str(),
            "https://rates.example.se/shipping/calculate"
        );
    }

    #[test]
    fn test_require_shipping_missing() {
        let config = StorefrontConfig {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            currency: CurrencyCode::SEK,
            shipping: None,
        };
        assert!(matches!(
            config.require_shipping(),
            Err(ConfigError::MissingEnvVar(var)) if var == "SHIPPING_API_URL"
        ));
    }

    #[test]
    fn test_shipping_config_debug_redacts_key() {
        let config = ShippingConfig {
            api_url: parse_base_url("https://rates.example.se").unwrap(),
            api_key: Some(SecretString::from("super_secret_rate_key")),
            timeout: Duration::from_secs(10),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("rates.example.se"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_rate_key"));
    }
}
