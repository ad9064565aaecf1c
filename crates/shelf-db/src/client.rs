//! # Store Handle
//!
//! [`Shelf`] owns the chosen [`DataStore`] and the configuration, and hands
//! out repositories and managers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main()                                                                 │
//! │    load_dotenv()                                                        │
//! │    StoreConfig::from_env()?  ← fails fast without SUPABASE_URL/KEY     │
//! │    Shelf::connect(config)?   ← RestStore, no request yet               │
//! │       │                                                                 │
//! │       ├── shelf.library()    → LibraryManager                          │
//! │       └── shelf.inventory()  → InventoryManager                        │
//! │                                                                         │
//! │  tests                                                                  │
//! │    Shelf::with_store(Arc::new(MemoryStore::new()), StoreConfig::in_memory())
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::error::DbResult;
use crate::manager::inventory::InventoryManager;
use crate::manager::library::LibraryManager;
use crate::query::Query;
use crate::repository::books::BookRepository;
use crate::repository::borrows::BorrowRepository;
use crate::repository::members::MemberRepository;
use crate::repository::products::ProductRepository;
use crate::repository::reports::ReportRepository;
use crate::repository::MEMBERS_TABLE;
use crate::rest::RestStore;
use crate::store::DataStore;

/// Main handle providing repository and manager access.
///
/// Cloning is cheap; every clone shares the same store.
#[derive(Clone)]
pub struct Shelf {
    store: Arc<dyn DataStore>,
    config: StoreConfig,
}

impl Shelf {
    /// Creates a handle talking to the hosted database over HTTP.
    pub fn connect(config: StoreConfig) -> DbResult<Self> {
        info!(url = %config.url, schema = %config.schema, "Connecting to store");
        let store = RestStore::new(&config)?;
        Ok(Shelf::with_store(Arc::new(store), config))
    }

    /// Creates a handle over any store (tests use `MemoryStore`).
    pub fn with_store(store: Arc<dyn DataStore>, config: StoreConfig) -> Self {
        Shelf { store, config }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn members(&self) -> MemberRepository {
        MemberRepository::new(self.store())
    }

    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.store())
    }

    pub fn borrows(&self) -> BorrowRepository {
        BorrowRepository::new(self.store())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.store())
    }

    /// Returns the product repository for the configured table.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.store(), self.config.products_table.clone())
    }

    /// Returns the member/book/borrow manager.
    pub fn library(&self) -> LibraryManager {
        LibraryManager::new(self)
    }

    /// Returns the product manager.
    pub fn inventory(&self) -> InventoryManager {
        InventoryManager::new(self.products())
    }

    /// Checks that the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        self.store
            .select(&Query::from(MEMBERS_TABLE).select("member_id").limit(1))
            .await
            .is_ok()
    }
}

impl std::fmt::Debug for Shelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shelf").field("config", &self.config).finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
