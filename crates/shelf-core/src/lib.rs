//! # shelf-core: Pure Domain Logic for Shelf
//!
//! This crate holds the domain model shared by the `library` and `inventory`
//! menus. It has zero I/O dependencies: the hosted database lives behind
//! `shelf-db`, terminal handling lives in the CLI.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    CLI menus (apps/cli)                         │   │
//! │  │    library: members, books, loans, reports                      │   │
//! │  │    inventory: products                                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               shelf-db (managers + repositories)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ validation│  │  present  │  │   │
//! │  │   │  Member   │  │   Money   │  │   rules   │  │ ResultSet │  │   │
//! │  │   │  Book     │  │  parsing  │  │  checks   │  │ Tabular   │  │   │
//! │  │   │  Loan     │  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Member, Book, BorrowRecord, Product, report rows)
//! - [`money`] - Integer-cent money type for product prices
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`present`] - Explicit result shapes for display
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::money::Money;
//!
//! let price: Money = "10.99".parse().unwrap();
//! assert_eq!(price.cents(), 1099);
//! assert_eq!(price.to_string(), "10.99");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod present;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ErrorKind, ValidationError};
pub use money::Money;
pub use present::{ResultSet, Tabular};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Copies registered when a book is added without an explicit stock.
pub const DEFAULT_BOOK_STOCK: i64 = 1;

/// Rows returned by the "top borrowed books" report unless told otherwise.
pub const DEFAULT_TOP_BOOKS_LIMIT: i64 = 5;

/// A loan older than this many days counts as overdue.
pub const DEFAULT_OVERDUE_DAYS: i64 = 14;

/// Maximum length of free-text fields (names, titles, authors).
pub const MAX_TEXT_LEN: usize = 200;
