//! # Managers
//!
//! The operations the menus call. Managers validate input, enforce the
//! domain preconditions, and compose repository calls; they never talk to
//! each other.
//!
//! - [`library::LibraryManager`] - members, books, borrow/return, reports
//! - [`inventory::InventoryManager`] - products

pub mod inventory;
pub mod library;
