//! # shelf-cli: Interactive Menus for Shelf
//!
//! The `library` and `inventory` binaries are thin: they load configuration,
//! connect, and hand stdin/stdout to one of the menus in this crate.
//!
//! ## Module Organization
//! ```text
//! shelf_cli/
//! ├── error.rs           # CliError (what "Error: ..." prints)
//! ├── prompt.rs          # Line prompts over any BufRead + Write
//! ├── render.rs          # ResultSet → banner + bordered table
//! ├── tracing_setup.rs   # tracing-subscriber on stderr
//! ├── library_menu.rs    # 13-choice library menu
//! └── inventory_menu.rs  # 5-choice product menu
//! ```
//!
//! ## Menu Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  print menu ──► read choice ──► dispatch ──► render result             │
//! │       ▲                            │                                    │
//! │       │                            ├── Err(domain/store) → "Error: .." │
//! │       └────────────────────────────┘                                    │
//! │                                                                         │
//! │  Exit choice or end of input ──► leave loop                            │
//! │  Terminal I/O failure         ──► propagate to main                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Menus are generic over their input and output so tests can drive them
//! with scripted lines against a `MemoryStore`.

pub mod error;
pub mod inventory_menu;
pub mod library_menu;
pub mod prompt;
pub mod render;
pub mod tracing_setup;

pub use error::{CliError, CliResult};
pub use inventory_menu::InventoryMenu;
pub use library_menu::LibraryMenu;
pub use prompt::Prompt;
