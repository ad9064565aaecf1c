//! # Store Configuration
//!
//! Settings for reaching the hosted database, loaded from environment
//! variables (optionally seeded from a `.env` file).
//!
//! ## Variables
//! ```text
//! ┌─────────────────────────────────┬──────────┬────────────────────────────┐
//! │ Variable                        │ Required │ Default                    │
//! ├─────────────────────────────────┼──────────┼────────────────────────────┤
//! │ SUPABASE_URL                    │ yes      │                            │
//! │ SUPABASE_KEY                    │ yes      │                            │
//! │ SHELF_SCHEMA                    │ no       │ public                     │
//! │ SHELF_HTTP_TIMEOUT_SECS         │ no       │ transport default          │
//! │ SHELF_PRODUCTS_TABLE            │ no       │ products                   │
//! │ SHELF_ALLOW_DUPLICATE_LOANS     │ no       │ true                       │
//! │ SHELF_STOCK_RETRY_LIMIT         │ no       │ 3                          │
//! └─────────────────────────────────┴──────────┴────────────────────────────┘
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

/// Default schema exposed by the store.
pub const DEFAULT_SCHEMA: &str = "public";

/// Default product table name.
pub const DEFAULT_PRODUCTS_TABLE: &str = "products";

/// Default number of compare-and-set attempts for a stock change.
pub const DEFAULT_STOCK_RETRY_LIMIT: u32 = 3;

// =============================================================================
// Loan Policy
// =============================================================================

/// Rules applied when lending books.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    /// Whether a member may hold more than one unreturned copy of the same book.
    /// Default: true
    pub allow_duplicate_active: bool,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        LoanPolicy {
            allow_duplicate_active: true,
        }
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Connection and behaviour settings for the hosted database.
///
/// ## Example
/// ```rust,ignore
/// shelf_db::config::load_dotenv();
/// let config = StoreConfig::from_env()?;
/// let shelf = Shelf::connect(config)?;
/// ```
#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the project, e.g. `https://abc.supabase.co`.
    pub url: String,

    /// API key, sent as `apikey` and as the bearer token.
    pub key: String,

    /// Schema selected with `Accept-Profile` / `Content-Profile`.
    pub schema: String,

    /// Per-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,

    /// Name of the product table.
    pub products_table: String,

    pub loan_policy: LoanPolicy,

    /// Attempts for a guarded stock update before giving up.
    pub stock_retry_limit: u32,
}

impl StoreConfig {
    /// Creates a configuration with defaults for everything but the endpoint.
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        StoreConfig {
            url: url.into(),
            key: key.into(),
            schema: DEFAULT_SCHEMA.to_string(),
            timeout: None,
            products_table: DEFAULT_PRODUCTS_TABLE.to_string(),
            loan_policy: LoanPolicy::default(),
            stock_retry_limit: DEFAULT_STOCK_RETRY_LIMIT,
        }
    }

    /// Sets the product table name.
    pub fn products_table(mut self, table: impl Into<String>) -> Self {
        self.products_table = table.into();
        self
    }

    /// Sets the loan policy.
    pub fn loan_policy(mut self, policy: LoanPolicy) -> Self {
        self.loan_policy = policy;
        self
    }

    /// Sets the number of compare-and-set attempts.
    pub fn stock_retry_limit(mut self, attempts: u32) -> Self {
        self.stock_retry_limit = attempts;
        self
    }

    /// Configuration for tests running against `MemoryStore`.
    pub fn in_memory() -> Self {
        StoreConfig::new("memory://", "")
    }

    /// Loads configuration from the process environment.
    ///
    /// ## Errors
    /// * `MissingRequired` - `SUPABASE_URL` or `SUPABASE_KEY` unset or blank
    /// * `InvalidValue` - an optional variable could not be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let url = get("SUPABASE_URL")
            .ok_or_else(|| ConfigError::MissingRequired("SUPABASE_URL".to_string()))?;
        let key = get("SUPABASE_KEY")
            .ok_or_else(|| ConfigError::MissingRequired("SUPABASE_KEY".to_string()))?;

        let mut config = StoreConfig::new(url.trim_end_matches('/'), key);

        if let Some(schema) = get("SHELF_SCHEMA") {
            config.schema = schema;
        }
        if let Some(table) = get("SHELF_PRODUCTS_TABLE") {
            config.products_table = table;
        }
        if let Some(secs) = parse_var::<u64>("SHELF_HTTP_TIMEOUT_SECS", get("SHELF_HTTP_TIMEOUT_SECS"))? {
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(raw) = get("SHELF_ALLOW_DUPLICATE_LOANS") {
            config.loan_policy.allow_duplicate_active = parse_flag(&raw)
                .ok_or_else(|| ConfigError::InvalidValue("SHELF_ALLOW_DUPLICATE_LOANS".to_string()))?;
        }
        if let Some(limit) = parse_var::<u32>("SHELF_STOCK_RETRY_LIMIT", get("SHELF_STOCK_RETRY_LIMIT"))? {
            if limit == 0 {
                return Err(ConfigError::InvalidValue("SHELF_STOCK_RETRY_LIMIT".to_string()));
            }
            config.stock_retry_limit = limit;
        }

        debug!(
            url = %config.url,
            schema = %config.schema,
            products_table = %config.products_table,
            "Store configuration loaded"
        );

        Ok(config)
    }
}

// The key stays out of logs and panic messages.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .field("schema", &self.schema)
            .field("timeout", &self.timeout)
            .field("products_table", &self.products_table)
            .field("loan_policy", &self.loan_policy)
            .field("stock_retry_limit", &self.stock_retry_limit)
            .finish()
    }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads `.env` from the working directory, if there is one.
///
/// Variables already present in the environment are never overwritten.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded .env from {}", path.display()),
        Err(e) => debug!("No .env loaded: {}", e),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.url, "https://abc.supabase.co");
        assert_eq!(config.schema, "public");
        assert_eq!(config.products_table, "products");
        assert_eq!(config.timeout, None);
        assert!(config.loan_policy.allow_duplicate_active);
        assert_eq!(config.stock_retry_limit, 3);
    }

    #[test]
    fn test_missing_required() {
        let err = StoreConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref v) if v == "SUPABASE_KEY"));

        let err = StoreConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "  "),
            ("SUPABASE_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref v) if v == "SUPABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://x"),
            ("SUPABASE_KEY", "k"),
            ("SHELF_SCHEMA", "library"),
            ("SHELF_HTTP_TIMEOUT_SECS", "15"),
            ("SHELF_PRODUCTS_TABLE", "Products"),
            ("SHELF_ALLOW_DUPLICATE_LOANS", "no"),
            ("SHELF_STOCK_RETRY_LIMIT", "5"),
        ]))
        .unwrap();

        assert_eq!(config.schema, "library");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.products_table, "Products");
        assert!(!config.loan_policy.allow_duplicate_active);
        assert_eq!(config.stock_retry_limit, 5);
    }

    #[test]
    fn test_invalid_values() {
        for (var, value) in [
            ("SHELF_HTTP_TIMEOUT_SECS", "soon"),
            ("SHELF_ALLOW_DUPLICATE_LOANS", "maybe"),
            ("SHELF_STOCK_RETRY_LIMIT", "0"),
        ] {
            let err = StoreConfig::from_lookup(lookup(&[
                ("SUPABASE_URL", "https://x"),
                ("SUPABASE_KEY", "k"),
                (var, value),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(ref v) if v == var));
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = StoreConfig::new("https://x", "super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_load_dotenv_doesnt_panic() {
        load_dotenv();
    }
}
