//! # Validation Module
//!
//! Input checks run by the managers before anything is sent to the store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Prompt (apps/cli)                                            │
//! │  └── Numeric parsing ("abc" for an ID → InvalidNumber)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Managers (shelf-db)                                          │
//! │  └── THIS MODULE: required fields, lengths, stock ≥ 0, SKU format      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Hosted database                                              │
//! │  ├── NOT NULL / CHECK (stock >= 0)                                     │
//! │  └── UNIQUE (sku)                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::validation::{validate_sku, validate_stock};
//!
//! validate_sku("MUG-01").unwrap();
//! assert!(validate_stock(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TEXT_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field (name, title, author, ...).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `MAX_TEXT_LEN` characters
pub fn validate_text(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

/// Validates an e-mail address.
///
/// Only the shape is checked (`local@domain`); uniqueness is not enforced.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_text("email", email)?;

    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        });
    }

    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates and normalizes a search term.
///
/// ## Rules
/// - May be empty (matches every book)
/// - At most 100 characters
///
/// ## Returns
/// The trimmed term.
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search term".to_string(),
            max: 100,
        });
    }

    Ok(term.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock count (books or products).
///
/// ## Rules
/// - Must be zero or greater
///
/// ```text
/// set stock to -2
///      │
///      ▼
/// validate_stock(-2) ← THIS FUNCTION
///      │
///      └── Error: "stock must not be negative" (nothing sent to the store)
/// ```
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a product price. Zero is allowed (free items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a report row limit (must be at least one).
pub fn validate_limit(limit: i64) -> ValidationResult<()> {
    if limit <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "limit".to_string(),
        });
    }

    Ok(())
}

/// Validates an overdue threshold in days.
pub fn validate_days(days: i64) -> ValidationResult<()> {
    if days < 0 {
        return Err(ValidationError::Negative {
            field: "days".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert!(validate_text("title", "Dune").is_ok());
        assert_eq!(
            validate_text("title", "   "),
            Err(ValidationError::required("title"))
        );
        assert!(validate_text("title", &"A".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_search_term() {
        assert_eq!(validate_search_term("  sci ").unwrap(), "sci");
        assert_eq!(validate_search_term("").unwrap(), "");
        assert!(validate_search_term(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(12).is_ok());
        assert!(validate_stock(-1).is_err());

        assert!(validate_price(Money::from_cents(0)).is_ok());
        assert!(validate_price(Money::from_cents(-1)).is_err());

        assert!(validate_limit(5).is_ok());
        assert!(validate_limit(0).is_err());

        assert!(validate_days(0).is_ok());
        assert!(validate_days(-3).is_err());
    }
}
