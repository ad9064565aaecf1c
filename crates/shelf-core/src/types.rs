//! # Domain Types
//!
//! Records exchanged with the hosted database, plus the request shapes used
//! to create and partially update them.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Member      │   │      Book       │   │  BorrowRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  member_id      │◄──┤  book_id        │◄──┤  record_id      │       │
//! │  │  name           │   │  title, author  │   │  member_id (FK) │       │
//! │  │  email          │   │  category?      │   │  book_id (FK)   │       │
//! │  └─────────────────┘   │  stock ≥ 0      │   │  borrow_date    │       │
//! │                        └─────────────────┘   │  return_date?   │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐                                                    │
//! │  │    Product      │   Keyed by SKU, no synthetic id.                  │
//! │  │  sku, name      │                                                    │
//! │  │  price, stock   │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Partial Updates
//! `MemberUpdate`, `BookUpdate` and `ProductUpdate` carry one `Option` per
//! column. `None` means "leave alone"; `Some("")` and `Some(0)` are real
//! values. Absent fields are skipped during serialization, so the JSON body
//! sent to the store only names the columns being changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Member
// =============================================================================

/// A registered library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: i64,
    pub name: String,
    pub email: String,
}

/// Insert payload for a member; the store assigns `member_id`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
}

/// Fields of a member that may be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl MemberUpdate {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalog entry with its number of available copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub stock: i64,
}

/// Insert payload for a book; the store assigns `book_id`.
#[derive(Debug, Clone, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub stock: i64,
}

/// Descriptive fields of a book that may be changed (stock has its own operation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl BookUpdate {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.category.is_none()
    }
}

/// Book columns embedded into a borrow record by the history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub title: String,
    pub author: String,
}

// =============================================================================
// Borrow Record
// =============================================================================

/// Where a loan is in its lifecycle.
///
/// ```text
///   borrow_book()            return_book()
///  ─────────────► Active ─────────────────► Returned
///                (return_date NULL)        (return_date set, final)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanState {
    Active,
    Returned,
}

impl std::fmt::Display for LoanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanState::Active => write!(f, "active"),
            LoanState::Returned => write!(f, "returned"),
        }
    }
}

/// One loan of one book to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub record_id: i64,
    pub member_id: i64,
    pub book_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,

    /// Present only when selected with the `books(title,author)` embed.
    #[serde(rename = "books", default, skip_serializing_if = "Option::is_none")]
    pub book: Option<BookSummary>,
}

impl BorrowRecord {
    /// Derives the lifecycle state from the return date.
    pub fn state(&self) -> LoanState {
        match self.return_date {
            None => LoanState::Active,
            Some(_) => LoanState::Returned,
        }
    }

    /// True while the book has not been returned.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state() == LoanState::Active
    }
}

/// Insert payload for a new loan; `return_date` is left to its NULL default.
#[derive(Debug, Clone, Serialize)]
pub struct NewBorrowRecord {
    pub member_id: i64,
    pub book_id: i64,
    pub borrow_date: DateTime<Utc>,
}

/// Result of a successful return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub record_id: i64,
    pub returned_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// An inventory item, identified by its SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

/// Fields of a product that may be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl ProductUpdate {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

// =============================================================================
// Report Rows
// =============================================================================
// Column contracts of the store-side procedures (see shelf-db/sql/002_reports.sql).

/// Row of `top_borrowed_books(p_limit)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBorrowedBook {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub borrow_count: i64,
}

/// Row of `overdue_members(p_days)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueLoan {
    pub member_id: i64,
    pub name: String,
    pub email: String,
    pub book_id: i64,
    pub title: String,
    pub borrow_date: DateTime<Utc>,
    pub days_borrowed: i64,
}

/// Row of `borrowed_count_per_member()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLoanCount {
    pub member_id: i64,
    pub name: String,
    pub borrowed_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
