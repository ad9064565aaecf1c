//! # Inventory Menu
//!
//! Five choices over [`InventoryManager`]: add, update, delete and list
//! products, then exit. Products are addressed by SKU.

use std::io::{BufRead, Write};

use shelf_core::{ProductUpdate, ResultSet};
use shelf_db::InventoryManager;

use crate::error::CliResult;
use crate::prompt::{settle, Flow, Prompt};
use crate::render::render;

const MENU: &str = "
--- Product Management ---
1. Add Product
2. Update Product
3. Delete Product
4. List Products
5. Exit";

/// Interactive product menu.
pub struct InventoryMenu {
    inventory: InventoryManager,
}

impl InventoryMenu {
    /// Creates a new InventoryMenu.
    pub fn new(inventory: InventoryManager) -> Self {
        InventoryMenu { inventory }
    }

    /// Runs until the user exits or input ends.
    pub async fn run<R: BufRead, W: Write>(&self, prompt: &mut Prompt<R, W>) -> CliResult<()> {
        loop {
            prompt.say(MENU)?;
            let outcome = match prompt.ask("Choose an option: ") {
                Ok(choice) => self.dispatch(&choice, prompt).await,
                Err(err) => Err(err),
            };
            if settle(prompt, outcome)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    async fn dispatch<R: BufRead, W: Write>(&self, choice: &str, p: &mut Prompt<R, W>) -> CliResult<Flow> {
        match choice {
            "1" => {
                let name = p.ask("Enter product name: ")?;
                let sku = p.ask("Enter SKU: ")?;
                let price = p.ask_money("Enter price: ")?;
                let stock = p.ask_i64("Enter stock: ", "stock")?;

                let product = self.inventory.add_product(&name, &sku, price, stock).await?;
                render(p.output(), "Inserted", &ResultSet::record(Some(&product)))?;
            }
            "2" => {
                let sku = p.ask("Enter SKU of product to update: ")?;
                let update = ProductUpdate {
                    name: p.ask_optional("Enter new name (leave blank to skip): ")?,
                    price: p.ask_optional_money("Enter new price (leave blank to skip): ")?,
                    stock: p.ask_optional_i64("Enter new stock (leave blank to skip): ", "stock")?,
                };

                let result = match self.inventory.update_product(&sku, update).await? {
                    Some(rows) => ResultSet::records(&rows),
                    None => ResultSet::scalar("Nothing to update!"),
                };
                render(p.output(), "Updated", &result)?;
            }
            "3" => {
                let sku = p.ask("Enter SKU of product to delete: ")?;
                let rows = self.inventory.delete_product(&sku).await?;
                let deleted = rows.iter().map(|product| format!("{} {}", product.sku, product.name));
                render(p.output(), "Deleted", &ResultSet::values(deleted))?;
            }
            "4" => {
                let products = self.inventory.list_products().await?;
                render(p.output(), "Products", &ResultSet::records(&products))?;
            }
            "5" => {
                p.say("Exiting program.")?;
                return Ok(Flow::Exit);
            }
            _ => p.say("Invalid choice. Try again.")?,
        }
        Ok(Flow::Continue)
    }
}
