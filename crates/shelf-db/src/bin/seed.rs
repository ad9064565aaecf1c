//! # Seed Data Loader
//!
//! Prints the reference schema, or fills a freshly created database with a
//! handful of members, books and products for trying out the menus.
//!
//! ## Usage
//! ```bash
//! # Print the SQL to paste into the hosted SQL editor
//! cargo run -p shelf-db --bin seed -- --print-schema
//!
//! # Insert sample rows (needs SUPABASE_URL / SUPABASE_KEY, or a .env)
//! cargo run -p shelf-db --bin seed
//! ```

use std::env;

use shelf_core::Money;
use shelf_db::{load_dotenv, schema, Shelf, StoreConfig};

const MEMBERS: &[(&str, &str)] = &[
    ("Ada Lovelace", "ada@example.com"),
    ("Alan Turing", "alan@example.com"),
    ("Grace Hopper", "grace@example.com"),
];

const BOOKS: &[(&str, &str, Option<&str>, i64)] = &[
    ("Dune", "Frank Herbert", Some("SciFi"), 3),
    ("Neuromancer", "William Gibson", Some("SciFi"), 1),
    ("Emma", "Jane Austen", Some("Classics"), 2),
    ("The Pragmatic Programmer", "Hunt & Thomas", Some("Computing"), 2),
    ("Untitled Notebook", "Anonymous", None, 1),
];

const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("Coffee Mug", "MUG-01", 450, 25),
    ("Bookmark", "BKM-01", 99, 200),
    ("Tote Bag", "TOTE-01", 1250, 12),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("--print-schema") => {
            println!("{}", schema::full_schema());
            return Ok(());
        }
        Some("-h") | Some("--help") => {
            println!("Shelf Seed Data Loader");
            println!();
            println!("Usage: seed [OPTIONS]");
            println!();
            println!("Options:");
            println!("  --print-schema     Print the tables and report procedures SQL");
            println!("  -h, --help         Show this help message");
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown option: {}", other);
            std::process::exit(2);
        }
        None => {}
    }

    load_dotenv();
    let config = StoreConfig::from_env()?;
    println!("Store: {}", config.url);

    let shelf = Shelf::connect(config)?;
    if !shelf.health_check().await {
        return Err("store did not answer; has the schema been created? (seed --print-schema)".into());
    }

    let library = shelf.library();
    if !library.list_books().await?.is_empty() {
        println!("Books already present; skipping seed to avoid duplicates.");
        return Ok(());
    }

    for (name, email) in MEMBERS {
        let member = library.add_member(name, email).await?;
        println!("  member #{} {}", member.member_id, member.name);
    }

    for (title, author, category, stock) in BOOKS {
        let book = library.add_book(title, author, *category, *stock).await?;
        println!("  book   #{} {}", book.book_id, book.title);
    }

    let inventory = shelf.inventory();
    for (name, sku, cents, stock) in PRODUCTS {
        match inventory
            .add_product(name, sku, Money::from_cents(*cents), *stock)
            .await
        {
            Ok(product) => println!("  product {} {}", product.sku, product.name),
            Err(e) => eprintln!("Failed to insert {}: {}", sku, e),
        }
    }

    println!();
    println!("Seed complete.");
    Ok(())
}
