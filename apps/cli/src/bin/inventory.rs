//! # Inventory Menu Binary
//!
//! ```bash
//! # SUPABASE_URL / SUPABASE_KEY (and RUST_LOG) from the environment or a local .env
//! cargo run -p shelf-cli --bin inventory
//!
//! # Show every store request on stderr
//! RUST_LOG=shelf_db=debug cargo run -p shelf-cli --bin inventory
//! ```

use std::io;

use anyhow::{Context, Result};
use tracing::info;

use shelf_cli::tracing_setup::init_environment;
use shelf_cli::{InventoryMenu, Prompt};
use shelf_db::{Shelf, StoreConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_environment()?;

    let config = StoreConfig::from_env().context("store configuration")?;
    let shelf = Shelf::connect(config).context("store client")?;
    info!("Inventory menu starting");

    let mut prompt = Prompt::new(io::stdin().lock(), io::stdout().lock());
    InventoryMenu::new(shelf.inventory()).run(&mut prompt).await?;
    Ok(())
}
