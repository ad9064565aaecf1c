//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule failures (not found, precondition) │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shelf-db errors (separate crate)                                      │
//! │  ├── DbError          - Remote store failures                          │
//! │  └── ShelfError       - CoreError | DbError, returned by managers      │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── CliError         - What the menu prints as "Error: ..."           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ShelfError → CliError → stdout    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error can be classified with [`ErrorKind`], so callers can react
//! to "not found" or "precondition" without matching individual variants.

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification shared by every error in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced member, book, product or loan does not exist.
    NotFound,
    /// A business rule blocks the operation (active loan, no stock, ...).
    Precondition,
    /// The caller supplied invalid input.
    Validation,
    /// The remote store failed (transport, status, decoding, contention).
    Store,
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule failures raised by the managers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No member with this id.
    #[error("Member not found: {0}")]
    MemberNotFound(i64),

    /// No book with this id.
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    /// No product with this SKU.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Book exists but has no copies left.
    ///
    /// ## User Workflow
    /// ```text
    /// Borrow book 12
    ///      │
    ///      ▼
    /// Read stock: 0
    ///      │
    ///      ▼
    /// BookUnavailable { book_id: 12, stock: 0 }
    ///      │
    ///      ▼
    /// Menu prints: "Error: Book 12 is not available (stock 0)"
    /// ```
    #[error("Book {book_id} is not available (stock {stock})")]
    BookUnavailable { book_id: i64, stock: i64 },

    /// Return requested but the member holds no unreturned copy of the book.
    #[error("No active borrow record found for member {member_id} and book {book_id}")]
    NoActiveBorrow { member_id: i64, book_id: i64 },

    /// The member already holds an unreturned copy and duplicate loans are disabled.
    #[error("Member {member_id} already has book {book_id} on loan (record {record_id})")]
    DuplicateActiveBorrow {
        member_id: i64,
        book_id: i64,
        record_id: i64,
    },

    /// Member cannot be deleted while loans are outstanding.
    #[error("Member {member_id} has {active} borrowed book(s) not yet returned")]
    MemberHasActiveLoans { member_id: i64, active: usize },

    /// Book cannot be deleted while a copy is on loan.
    #[error("Book {book_id} is currently borrowed ({active} active loan(s)); cannot delete")]
    BookHasActiveLoans { book_id: i64, active: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::MemberNotFound(_)
            | CoreError::BookNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::NoActiveBorrow { .. } => ErrorKind::NotFound,
            CoreError::BookUnavailable { .. }
            | CoreError::DuplicateActiveBorrow { .. }
            | CoreError::MemberHasActiveLoans { .. }
            | CoreError::BookHasActiveLoans { .. } => ErrorKind::Precondition,
            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any request reaches the store, and by the prompt when the
/// user types something that is not a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed SKU or e-mail).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Text that should have been a number.
    #[error("{field}: '{input}' is not a valid number")]
    InvalidNumber { field: String, input: String },
}

impl ValidationError {
    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates an InvalidNumber error.
    pub fn invalid_number(field: impl Into<String>, input: impl Into<String>) -> Self {
        ValidationError::InvalidNumber {
            field: field.into(),
            input: input.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::BookUnavailable {
            book_id: 12,
            stock: 0,
        };
        assert_eq!(err.to_string(), "Book 12 is not available (stock 0)");

        let err = CoreError::NoActiveBorrow {
            member_id: 7,
            book_id: 3,
        };
        assert_eq!(
            err.to_string(),
            "No active borrow record found for member 7 and book 3"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("title").to_string(), "title is required");
        assert_eq!(
            ValidationError::invalid_number("Member ID", "abc").to_string(),
            "Member ID: 'abc' is not a valid number"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::BookNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::MemberHasActiveLoans {
                member_id: 1,
                active: 2
            }
            .kind(),
            ErrorKind::Precondition
        );
        let core: CoreError = ValidationError::required("sku").into();
        assert_eq!(core.kind(), ErrorKind::Validation);
    }
}
