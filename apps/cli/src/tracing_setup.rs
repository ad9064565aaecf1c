//! Tracing setup for the menus.
//!
//! Logs go to stderr so the menu text on stdout stays readable.
//!
//! Usage:
//!   library                           # warnings and errors only
//!   RUST_LOG=shelf_db=debug library   # every store request
//!
//! Environment variables (real environment or `.env`):
//!   RUST_LOG                          # Log filter (default: warn)

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use shelf_db::load_dotenv;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Loads `.env`, then installs the subscriber, so a `RUST_LOG` kept in
/// `.env` is honored.
pub fn init_environment() -> Result<()> {
    load_dotenv();
    init_tracing()
}

/// Installs the global subscriber.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_filter_follows_rust_log_from_env_file() {
        let path = std::env::temp_dir().join(format!("shelf-cli-{}.env", std::process::id()));
        std::fs::write(&path, "RUST_LOG=shelf_db=debug\n").unwrap();

        dotenvy::from_path_override(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(env_filter().max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
