//! # Borrow Record Repository
//!
//! Loans are never deleted by the application; a return only fills in
//! `return_date`, and only while it is still NULL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use shelf_core::{BorrowRecord, NewBorrowRecord};

use super::BORROW_RECORDS_TABLE;
use crate::error::DbResult;
use crate::query::{Filter, Query, Row};
use crate::store::{decode_row, decode_rows, to_row, DataStore};

/// Select list joining each loan with its book.
const WITH_BOOK: &str = "*, books(title,author)";

/// Repository for the `borrow_records` table.
#[derive(Clone)]
pub struct BorrowRepository {
    store: Arc<dyn DataStore>,
}

impl BorrowRepository {
    /// Creates a new BorrowRepository.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        BorrowRepository { store }
    }

    /// Inserts a loan and returns it with its assigned id.
    pub async fn insert(&self, record: &NewBorrowRecord) -> DbResult<BorrowRecord> {
        debug!(member_id = record.member_id, book_id = record.book_id, "Inserting borrow record");
        let row = self.store.insert(BORROW_RECORDS_TABLE, to_row(record)?).await?;
        decode_row(row)
    }

    /// Unreturned loans held by a member.
    pub async fn active_for_member(&self, member_id: i64) -> DbResult<Vec<BorrowRecord>> {
        let query = Query::from(BORROW_RECORDS_TABLE)
            .eq("member_id", member_id)
            .is_null("return_date");
        decode_rows(self.store.select(&query).await?)
    }

    /// Unreturned loans of a book.
    pub async fn active_for_book(&self, book_id: i64) -> DbResult<Vec<BorrowRecord>> {
        let query = Query::from(BORROW_RECORDS_TABLE)
            .eq("book_id", book_id)
            .is_null("return_date");
        decode_rows(self.store.select(&query).await?)
    }

    /// Most recent unreturned loan of `book_id` by `member_id`.
    pub async fn latest_active(&self, member_id: i64, book_id: i64) -> DbResult<Option<BorrowRecord>> {
        let query = Query::from(BORROW_RECORDS_TABLE)
            .eq("member_id", member_id)
            .eq("book_id", book_id)
            .is_null("return_date")
            .order_desc("borrow_date")
            .limit(1);
        Ok(decode_rows(self.store.select(&query).await?)?.into_iter().next())
    }

    /// Every loan of a member with the book's title and author, newest first.
    pub async fn history(&self, member_id: i64) -> DbResult<Vec<BorrowRecord>> {
        let query = Query::from(BORROW_RECORDS_TABLE)
            .select(WITH_BOOK)
            .eq("member_id", member_id)
            .order_desc("borrow_date");
        decode_rows(self.store.select(&query).await?)
    }

    /// Sets `return_date` if the loan is still active.
    ///
    /// ## Returns
    /// * `Ok(Some(record))` - This call closed the loan
    /// * `Ok(None)` - The loan was already returned (or does not exist)
    pub async fn mark_returned(&self, record_id: i64, at: DateTime<Utc>) -> DbResult<Option<BorrowRecord>> {
        debug!(record_id, "Marking borrow record returned");
        let mut changes = Row::new();
        changes.insert("return_date".to_string(), json!(at));

        let rows = self
            .store
            .update(
                BORROW_RECORDS_TABLE,
                changes,
                &[Filter::eq("record_id", record_id), Filter::is_null("return_date")],
            )
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::Duration;

    async fn seeded() -> (Arc<MemoryStore>, BorrowRepository) {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("members", to_row(&json!({ "name": "Ada", "email": "a@x" })).unwrap())
            .await
            .unwrap();
        for title in ["Dune", "Emma"] {
            store
                .insert(
                    "books",
                    to_row(&json!({ "title": title, "author": "A", "category": null, "stock": 1 })).unwrap(),
                )
                .await
                .unwrap();
        }
        let repo = BorrowRepository::new(store.clone());
        (store, repo)
    }

    fn loan(book_id: i64, days_ago: i64) -> NewBorrowRecord {
        NewBorrowRecord {
            member_id: 1,
            book_id,
            borrow_date: Utc::now() - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn test_latest_active_prefers_newest() {
        let (_, repo) = seeded().await;
        let older = repo.insert(&loan(1, 3)).await.unwrap();
        let newer = repo.insert(&loan(1, 1)).await.unwrap();
        assert!(older.record_id < newer.record_id);

        let found = repo.latest_active(1, 1).await.unwrap().unwrap();
        assert_eq!(found.record_id, newer.record_id);
        assert!(repo.latest_active(1, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_returned_only_once() {
        let (_, repo) = seeded().await;
        let record = repo.insert(&loan(1, 0)).await.unwrap();

        let now = Utc::now();
        let closed = repo.mark_returned(record.record_id, now).await.unwrap().unwrap();
        assert!(!closed.is_active());
        assert!(repo.mark_returned(record.record_id, now).await.unwrap().is_none());
        assert!(repo.active_for_member(1).await.unwrap().is_empty());
        assert!(repo.active_for_book(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_embeds_book_newest_first() {
        let (_, repo) = seeded().await;
        repo.insert(&loan(1, 5)).await.unwrap();
        repo.insert(&loan(2, 1)).await.unwrap();

        let history = repo.history(1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].book.as_ref().unwrap().title, "Emma");
        assert_eq!(history[1].book.as_ref().unwrap().title, "Dune");
    }
}
