//! # Store Error Types
//!
//! Error types for requests to the hosted database.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  reqwest::Error / HTTP 4xx-5xx body / serde_json::Error                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ShelfError ← DbError or CoreError, returned by the managers           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Menu loop prints "Error: <message>" and shows the menu again          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use shelf_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

/// Remote store errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a product whose SKU already exists
    /// - Any UNIQUE index violation reported by the store (SQLSTATE 23505)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a borrow record whose member or book does not exist
    ///   (SQLSTATE 23503)
    ///
    /// Deleting a member or book never raises it: their borrow records are
    /// removed with them.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The store could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The store answered with a non-success status.
    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    /// A response body did not have the expected shape.
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// A guarded stock update kept losing to concurrent writers.
    #[error("Stock of {table} row {id} changed concurrently {attempts} times; giving up")]
    Conflict {
        table: String,
        id: String,
        attempts: u32,
    },

    /// The table is not exposed by the store.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// The remote procedure is not exposed by the store.
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    /// Anything else.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds an error from a non-success HTTP response.
    ///
    /// ## Error Mapping
    /// ```text
    /// PostgREST body { code, message, details, hint }
    ///
    /// code 23505               → UniqueViolation (field/value from details)
    /// code 23503               → ForeignKeyViolation
    /// code 42P01 / PGRST205    → UnknownTable
    /// code 42883 / PGRST202    → UnknownProcedure
    /// anything else            → RequestFailed { status, message }
    /// ```
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();

        let Some(api) = parsed else {
            let message = if body.trim().is_empty() {
                "empty response body".to_string()
            } else {
                body.trim().to_string()
            };
            return DbError::RequestFailed { status, message };
        };

        let message = api.message.clone().unwrap_or_else(|| body.to_string());

        match api.code.as_deref() {
            Some("23505") => {
                let (field, value) = api
                    .details
                    .as_deref()
                    .and_then(parse_key_details)
                    .unwrap_or_else(|| ("value".to_string(), "unknown".to_string()));
                DbError::UniqueViolation { field, value }
            }
            Some("23503") => DbError::ForeignKeyViolation {
                message: api.details.unwrap_or(message),
            },
            Some("42P01") | Some("PGRST205") => DbError::UnknownTable(message),
            Some("42883") | Some("PGRST202") => DbError::UnknownProcedure(message),
            _ => DbError::RequestFailed { status, message },
        }
    }
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Extracts `(column, value)` from `Key (sku)=(MUG-01) already exists.`
fn parse_key_details(details: &str) -> Option<(String, String)> {
    let rest = details.strip_prefix("Key (")?;
    let (field, rest) = rest.split_once(")=(")?;
    let (value, _) = rest.split_once(')')?;
    Some((field.to_string(), value.to_string()))
}

/// Convert transport errors to DbError.
///
/// ## Error Mapping
/// ```text
/// connect / timeout   → DbError::ConnectionFailed
/// body decode         → DbError::Decode
/// status (rare here)  → DbError::RequestFailed
/// other               → DbError::Internal
/// ```
impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            DbError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            DbError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            DbError::RequestFailed {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            DbError::Internal(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Decode(err.to_string())
    }
}

/// Result type for store operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Manager Error
// =============================================================================

/// Error returned by the library and inventory managers.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// A domain rule or validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl ShelfError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShelfError::Core(err) => err.kind(),
            ShelfError::Db(_) => ErrorKind::Store,
        }
    }
}

impl From<ValidationError> for ShelfError {
    fn from(err: ValidationError) -> Self {
        ShelfError::Core(CoreError::Validation(err))
    }
}

/// Result type for manager operations.
pub type ShelfResult<T> = Result<T, ShelfError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_from_body() {
        let body = r#"{"code":"23505","details":"Key (sku)=(MUG-01) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"products_sku_key\""}"#;
        match DbError::from_response(409, body) {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "MUG-01");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_codes() {
        let fk = r#"{"code":"23503","details":"Key (member_id)=(99) is not present in table \"members\".","message":"insert or update violates foreign key constraint"}"#;
        assert!(matches!(
            DbError::from_response(409, fk),
            DbError::ForeignKeyViolation { .. }
        ));

        let missing = r#"{"code":"PGRST202","message":"Could not find the function public.top_borrowed_books"}"#;
        assert!(matches!(
            DbError::from_response(404, missing),
            DbError::UnknownProcedure(_)
        ));

        let unknown = r#"{"code":"XX000","message":"boom"}"#;
        match DbError::from_response(500, unknown) {
            DbError::RequestFailed { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body() {
        match DbError::from_response(502, "  Bad Gateway ") {
            DbError::RequestFailed { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_shelf_error_kind() {
        let err: ShelfError = CoreError::BookNotFound(4).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Book not found: 4");

        let err: ShelfError = DbError::Internal("x".into()).into();
        assert_eq!(err.kind(), ErrorKind::Store);

        let err: ShelfError = ValidationError::required("name").into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
