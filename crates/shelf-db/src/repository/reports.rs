//! # Report Repository
//!
//! Read-only aggregates computed by procedures defined in
//! `sql/002_reports.sql`. The client only knows their names, arguments and
//! result columns.
//!
//! ```text
//! ┌──────────────────────────────┬──────────┬──────────────────────────────┐
//! │ Procedure                    │ Args     │ Row type                     │
//! ├──────────────────────────────┼──────────┼──────────────────────────────┤
//! │ top_borrowed_books           │ p_limit  │ TopBorrowedBook              │
//! │ overdue_members              │ p_days   │ OverdueLoan                  │
//! │ borrowed_count_per_member    │ -        │ MemberLoanCount              │
//! └──────────────────────────────┴──────────┴──────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use shelf_core::{MemberLoanCount, OverdueLoan, TopBorrowedBook};

use crate::error::DbResult;
use crate::store::{decode_rows, rpc_rows, DataStore};

pub const TOP_BORROWED_BOOKS: &str = "top_borrowed_books";
pub const OVERDUE_MEMBERS: &str = "overdue_members";
pub const BORROWED_COUNT_PER_MEMBER: &str = "borrowed_count_per_member";

/// Repository for the aggregate report procedures.
#[derive(Clone)]
pub struct ReportRepository {
    store: Arc<dyn DataStore>,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        ReportRepository { store }
    }

    async fn call<T: DeserializeOwned>(&self, function: &str, args: Value) -> DbResult<Vec<T>> {
        let response = self.store.rpc(function, args).await?;
        let rows: Vec<T> = decode_rows(rpc_rows(response)?)?;
        debug!(function = %function, rows = rows.len(), "Report returned rows");
        Ok(rows)
    }

    /// Most borrowed books, at most `limit` rows.
    pub async fn top_borrowed_books(&self, limit: i64) -> DbResult<Vec<TopBorrowedBook>> {
        self.call(TOP_BORROWED_BOOKS, json!({ "p_limit": limit })).await
    }

    /// Active loans older than `days` days, with their members.
    pub async fn overdue_members(&self, days: i64) -> DbResult<Vec<OverdueLoan>> {
        self.call(OVERDUE_MEMBERS, json!({ "p_days": days })).await
    }

    /// Number of loans ever made per member.
    pub async fn borrowed_count_per_member(&self) -> DbResult<Vec<MemberLoanCount>> {
        self.call(BORROWED_COUNT_PER_MEMBER, json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_top_borrowed_books_decodes_rows() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_rpc_response(
                TOP_BORROWED_BOOKS,
                json!([{ "book_id": 3, "title": "Dune", "author": "Herbert", "borrow_count": 4 }]),
            )
            .unwrap();

        let rows = ReportRepository::new(store.clone()).top_borrowed_books(5).await.unwrap();
        assert_eq!(rows[0].borrow_count, 4);
        assert_eq!(
            store.rpc_calls().unwrap(),
            vec![(TOP_BORROWED_BOOKS.to_string(), json!({ "p_limit": 5 }))]
        );
    }

    #[tokio::test]
    async fn test_wrapped_response_is_unwrapped() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_rpc_response(
                BORROWED_COUNT_PER_MEMBER,
                json!([{ "borrowed_count_per_member": [
                    { "member_id": 1, "name": "Ada", "borrowed_count": 2 },
                    { "member_id": 2, "name": "Bo", "borrowed_count": 0 }
                ] }]),
            )
            .unwrap();

        let rows = ReportRepository::new(store).borrowed_count_per_member().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "Bo");
    }

    #[tokio::test]
    async fn test_bad_row_shape_is_decode_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_rpc_response(OVERDUE_MEMBERS, json!([{ "member_id": "x" }]))
            .unwrap();

        let err = ReportRepository::new(store).overdue_members(14).await.unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }
}
