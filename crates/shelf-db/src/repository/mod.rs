//! # Repository Module
//!
//! One repository per table (plus one for the report procedures). Each
//! holds a shared handle to the store and turns typed calls into queries.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LibraryManager                                                         │
//! │       │                                                                 │
//! │       │  books.compare_and_set_stock(3, 1, 0)                          │
//! │       ▼                                                                 │
//! │  BookRepository                                                        │
//! │  ├── get / list / search                                               │
//! │  ├── insert / update_info / set_stock                                  │
//! │  ├── compare_and_set_stock                                             │
//! │  └── delete                                                            │
//! │       │                                                                 │
//! │       │  Query / Row / Filter                                          │
//! │       ▼                                                                 │
//! │  dyn DataStore (RestStore or MemoryStore)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`members::MemberRepository`] - Member CRUD
//! - [`books::BookRepository`] - Catalog, search, guarded stock writes
//! - [`borrows::BorrowRepository`] - Loans and their history
//! - [`reports::ReportRepository`] - Store-side aggregate procedures
//! - [`products::ProductRepository`] - Inventory keyed by SKU

pub mod books;
pub mod borrows;
pub mod members;
pub mod products;
pub mod reports;

/// Table of library members.
pub const MEMBERS_TABLE: &str = "members";

/// Table of catalogued books.
pub const BOOKS_TABLE: &str = "books";

/// Table of loans.
pub const BORROW_RECORDS_TABLE: &str = "borrow_records";
