//! # Book Repository
//!
//! Catalog reads and writes, including the guarded stock update used by
//! the borrow/return workflow.
//!
//! ## Compare-and-Set Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client A reads stock 1          Client B reads stock 1                │
//! │       │                               │                                │
//! │       ▼                               ▼                                │
//! │  PATCH books?book_id=eq.3        PATCH books?book_id=eq.3              │
//! │        &stock=eq.1                     &stock=eq.1                     │
//! │  { "stock": 0 }                  { "stock": 0 }                        │
//! │       │                               │                                │
//! │       ▼                               ▼                                │
//! │  1 row → Some(book)              0 rows → None (re-read, retry)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use shelf_core::{Book, BookUpdate, NewBook};

use super::BOOKS_TABLE;
use crate::error::DbResult;
use crate::query::{Filter, Query, Row};
use crate::store::{decode_row, decode_rows, to_row, DataStore};

/// Repository for the `books` table.
#[derive(Clone)]
pub struct BookRepository {
    store: Arc<dyn DataStore>,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        BookRepository { store }
    }

    /// Inserts a book and returns it with its assigned id.
    pub async fn insert(&self, book: &NewBook) -> DbResult<Book> {
        debug!(title = %book.title, stock = book.stock, "Inserting book");
        let row = self.store.insert(BOOKS_TABLE, to_row(book)?).await?;
        decode_row(row)
    }

    /// Gets a book by id.
    pub async fn get(&self, book_id: i64) -> DbResult<Option<Book>> {
        let rows = self
            .store
            .select(&Query::from(BOOKS_TABLE).eq("book_id", book_id))
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    /// Lists every book ordered by title.
    pub async fn list(&self) -> DbResult<Vec<Book>> {
        let rows = self
            .store
            .select(&Query::from(BOOKS_TABLE).order_asc("title"))
            .await?;
        decode_rows(rows)
    }

    /// Books whose title, author or category contains `term` (case-insensitive),
    /// ordered by title.
    ///
    /// ## Example
    /// ```text
    /// search("sci")
    ///   → or=(title.ilike."*sci*",author.ilike."*sci*",category.ilike."*sci*")
    ///   → matches category "SciFi"
    /// ```
    pub async fn search(&self, term: &str) -> DbResult<Vec<Book>> {
        debug!(term = %term, "Searching books");
        let query = Query::from(BOOKS_TABLE)
            .filter(Filter::any([
                Filter::contains("title", term),
                Filter::contains("author", term),
                Filter::contains("category", term),
            ]))
            .order_asc("title");
        let books: Vec<Book> = decode_rows(self.store.select(&query).await?)?;
        debug!(count = books.len(), "Search returned books");
        Ok(books)
    }

    /// Applies the supplied descriptive fields; returns the updated rows.
    pub async fn update_info(&self, book_id: i64, update: &BookUpdate) -> DbResult<Vec<Book>> {
        debug!(book_id, "Updating book info");
        let rows = self
            .store
            .update(BOOKS_TABLE, to_row(update)?, &[Filter::eq("book_id", book_id)])
            .await?;
        decode_rows(rows)
    }

    /// Overwrites the stock count; returns the updated rows.
    pub async fn set_stock(&self, book_id: i64, stock: i64) -> DbResult<Vec<Book>> {
        debug!(book_id, stock, "Setting book stock");
        let rows = self
            .store
            .update(BOOKS_TABLE, stock_row(stock), &[Filter::eq("book_id", book_id)])
            .await?;
        decode_rows(rows)
    }

    /// Sets stock to `new` only if it is still `expected`.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - The guard held and the row was updated
    /// * `Ok(None)` - Stock changed since it was read (or the book is gone)
    pub async fn compare_and_set_stock(&self, book_id: i64, expected: i64, new: i64) -> DbResult<Option<Book>> {
        debug!(book_id, expected, new, "Guarded stock update");
        let rows = self
            .store
            .update(
                BOOKS_TABLE,
                stock_row(new),
                &[Filter::eq("book_id", book_id), Filter::eq("stock", expected)],
            )
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    /// Deletes a book; returns the deleted rows.
    pub async fn delete(&self, book_id: i64) -> DbResult<Vec<Book>> {
        debug!(book_id, "Deleting book");
        let rows = self
            .store
            .delete(BOOKS_TABLE, &[Filter::eq("book_id", book_id)])
            .await?;
        decode_rows(rows)
    }
}

fn stock_row(stock: i64) -> Row {
    let mut row = Row::new();
    row.insert("stock".to_string(), json!(stock));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn new_book(title: &str, author: &str, category: Option<&str>, stock: i64) -> NewBook {
        NewBook {
            title: title.into(),
            author: author.into(),
            category: category.map(Into::into),
            stock,
        }
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_title() {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        repo.insert(&new_book("Neuromancer", "Gibson", None, 1)).await.unwrap();
        repo.insert(&new_book("Dune", "Herbert", Some("SciFi"), 2)).await.unwrap();

        let titles: Vec<String> = repo.list().await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Dune", "Neuromancer"]);
    }

    #[tokio::test]
    async fn test_search_spans_title_author_category() {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        repo.insert(&new_book("Dune", "Herbert", Some("SciFi"), 1)).await.unwrap();
        repo.insert(&new_book("Emma", "Austen", None, 1)).await.unwrap();
        repo.insert(&new_book("Science of Cooking", "Barham", Some("Food"), 1)).await.unwrap();

        let titles: Vec<String> = repo.search("sci").await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Dune", "Science of Cooking"]);

        assert_eq!(repo.search("AUSTEN").await.unwrap().len(), 1);
        assert_eq!(repo.search("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_compare_and_set_stock() {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        let book = repo.insert(&new_book("Dune", "Herbert", None, 1)).await.unwrap();

        assert!(repo.compare_and_set_stock(book.book_id, 2, 1).await.unwrap().is_none());
        let updated = repo.compare_and_set_stock(book.book_id, 1, 0).await.unwrap().unwrap();
        assert_eq!(updated.stock, 0);
        assert!(repo.compare_and_set_stock(book.book_id, 1, 0).await.unwrap().is_none());
    }
}
