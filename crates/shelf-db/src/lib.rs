//! # shelf-db: Hosted Database Layer for Shelf
//!
//! Everything that talks to the hosted (PostgREST/Supabase) database: the
//! store boundary and its two implementations, per-table repositories, and
//! the managers the menus call.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf Data Flow                                  │
//! │                                                                         │
//! │  Menu choice "10. Borrow book"                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Managers    │    │  Repositories │    │  DataStore   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Library       │───►│ Members       │───►│ RestStore    │  │   │
//! │  │   │ Inventory     │    │ Books, Loans  │    │ MemoryStore  │  │   │
//! │  │   │               │    │ Reports, Prod.│    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │         https://<project>.supabase.co/rest/v1/...               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Store configuration from the environment
//! - [`client`] - The [`Shelf`] handle
//! - [`store`] / [`query`] - Store boundary and query builder
//! - [`rest`] / [`memory`] - HTTP and in-process stores
//! - [`repository`] - Per-table repositories
//! - [`manager`] - Library and inventory operations
//! - [`schema`] - Reference SQL for the hosted database
//! - [`error`] - Store and manager error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_db::{load_dotenv, Shelf, StoreConfig};
//!
//! load_dotenv();
//! let shelf = Shelf::connect(StoreConfig::from_env()?)?;
//!
//! let books = shelf.library().search_books("sci").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod memory;
pub mod query;
pub mod repository;
pub mod rest;
pub mod schema;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::Shelf;
pub use config::{load_dotenv, ConfigError, LoanPolicy, StoreConfig};
pub use error::{DbError, DbResult, ShelfError, ShelfResult};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use store::DataStore;

pub use manager::inventory::InventoryManager;
pub use manager::library::LibraryManager;
