//! # CLI Error Type
//!
//! What a failed menu action turns into before the loop prints it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Source                         CliError          Menu loop             │
//! │  ──────                         ────────          ─────────             │
//! │  "abc" typed for an id   ──►    Input       ──►   Error: ... continue   │
//! │  non-UTF-8 line          ──►    Input       ──►   Error: ... continue   │
//! │  ShelfError (core / db)  ──►    Shelf       ──►   Error: ... continue   │
//! │  stdin closed            ──►    EndOfInput  ──►   leave loop            │
//! │  stdout write failed     ──►    Io          ──►   return to main        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io;

use thiserror::Error;

use shelf_core::{CoreError, ErrorKind, ValidationError};
use shelf_db::{DbError, ShelfError};

/// Failure of one menu action.
#[derive(Debug, Error)]
pub enum CliError {
    /// The user typed something unusable.
    #[error(transparent)]
    Input(#[from] ValidationError),

    /// A manager operation failed.
    #[error(transparent)]
    Shelf(#[from] ShelfError),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input ended while a prompt was waiting.
    #[error("end of input")]
    EndOfInput,
}

impl CliError {
    /// Classifies this error; `None` for terminal conditions.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CliError::Input(_) => Some(ErrorKind::Validation),
            CliError::Shelf(err) => Some(err.kind()),
            CliError::Io(_) | CliError::EndOfInput => None,
        }
    }

    /// True when the menu loop must stop rather than report and continue.
    pub fn ends_session(&self) -> bool {
        matches!(self, CliError::Io(_) | CliError::EndOfInput)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Shelf(ShelfError::Core(err))
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        CliError::Shelf(ShelfError::Db(err))
    }
}

/// Convenience type alias for menu actions.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_pass_through() {
        let err = CliError::from(ValidationError::invalid_number("book id", "abc"));
        assert_eq!(err.to_string(), "book id: 'abc' is not a valid number");
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        let err = CliError::from(CoreError::MemberNotFound(9));
        assert_eq!(err.to_string(), "Member not found: 9");
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(!err.ends_session());
    }

    #[test]
    fn test_store_errors_keep_kind() {
        let err = CliError::from(DbError::ConnectionFailed("refused".into()));
        assert_eq!(err.kind(), Some(ErrorKind::Store));
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_terminal_conditions_end_session() {
        assert!(CliError::EndOfInput.ends_session());
        assert!(CliError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed")).ends_session());
        assert_eq!(CliError::EndOfInput.kind(), None);
    }
}
