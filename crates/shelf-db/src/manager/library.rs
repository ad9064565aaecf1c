//! # Library Manager
//!
//! Member, book and loan operations, plus the three store-side reports.
//!
//! ## Borrow / Return Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  borrow_book(member, book)                                              │
//! │    1. member must exist                      → MemberNotFound          │
//! │    2. duplicate check (policy off only)      → DuplicateActiveBorrow   │
//! │    3. read book                              → BookNotFound            │
//! │       stock ≤ 0                              → BookUnavailable         │
//! │    4. PATCH stock = s-1 WHERE stock = s      (0 rows → re-read, retry) │
//! │    5. INSERT borrow record                                              │
//! │       └── fails → PATCH stock back (+1), return the insert error       │
//! │                                                                         │
//! │  return_book(member, book)                                              │
//! │    1. newest active record for (member, book) → NoActiveBorrow         │
//! │    2. PATCH return_date WHERE return_date IS NULL                       │
//! │       (0 rows → another return won → look up once more, then          │
//! │        NoActiveBorrow)                                                  │
//! │    3. PATCH stock = s+1 WHERE stock = s      (0 rows → re-read, retry) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store offers no multi-table transaction, so every stock write is a
//! compare-and-set against the value just read. A borrow can therefore
//! never take stock below zero, however many clients race for the last copy.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use shelf_core::validation::{
    validate_days, validate_email, validate_limit, validate_search_term, validate_stock,
    validate_text,
};
use shelf_core::{
    Book, BookUpdate, BorrowRecord, CoreError, Member, MemberLoanCount, MemberUpdate, NewBook,
    NewBorrowRecord, NewMember, OverdueLoan, ReturnReceipt, TopBorrowedBook,
};

use crate::client::Shelf;
use crate::config::LoanPolicy;
use crate::error::{DbError, ShelfResult};
use crate::repository::books::BookRepository;
use crate::repository::borrows::BorrowRepository;
use crate::repository::members::MemberRepository;
use crate::repository::reports::ReportRepository;
use crate::repository::BOOKS_TABLE;

/// Lookups of the newest open loan per return. A second lookup covers a
/// concurrent return that closed the same record first.
const RETURN_ATTEMPTS: usize = 2;

/// Member/book/borrow operations.
#[derive(Clone)]
pub struct LibraryManager {
    members: MemberRepository,
    books: BookRepository,
    borrows: BorrowRepository,
    reports: ReportRepository,
    policy: LoanPolicy,
    stock_retry_limit: u32,
}

impl LibraryManager {
    /// Creates a manager sharing the handle's store and configuration.
    pub fn new(shelf: &Shelf) -> Self {
        LibraryManager {
            members: shelf.members(),
            books: shelf.books(),
            borrows: shelf.borrows(),
            reports: shelf.reports(),
            policy: shelf.config().loan_policy,
            stock_retry_limit: shelf.config().stock_retry_limit.max(1),
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Registers a member. E-mail addresses are not required to be unique.
    pub async fn add_member(&self, name: &str, email: &str) -> ShelfResult<Member> {
        validate_text("name", name)?;
        validate_email(email)?;

        let member = self
            .members
            .insert(&NewMember {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
            })
            .await?;

        info!(member_id = member.member_id, "Member registered");
        Ok(member)
    }

    /// Looks up a member; `None` when absent.
    pub async fn get_member(&self, member_id: i64) -> ShelfResult<Option<Member>> {
        Ok(self.members.get(member_id).await?)
    }

    /// Updates the supplied fields.
    ///
    /// ## Returns
    /// * `Ok(None)` - Nothing supplied; no request was sent
    /// * `Ok(Some(rows))` - The updated member
    /// * `Err(MemberNotFound)` - No member with this id
    pub async fn update_member(&self, member_id: i64, update: MemberUpdate) -> ShelfResult<Option<Vec<Member>>> {
        if update.is_empty() {
            debug!(member_id, "Member update has no fields; skipping");
            return Ok(None);
        }
        let update = MemberUpdate {
            name: trimmed(update.name),
            email: trimmed(update.email),
        };
        if let Some(name) = &update.name {
            validate_text("name", name)?;
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
        }

        let rows = self.members.update(member_id, &update).await?;
        if rows.is_empty() {
            return Err(CoreError::MemberNotFound(member_id).into());
        }
        Ok(Some(rows))
    }

    /// Deletes a member who has no unreturned books.
    pub async fn delete_member(&self, member_id: i64) -> ShelfResult<Vec<Member>> {
        let active = self.borrows.active_for_member(member_id).await?;
        if !active.is_empty() {
            return Err(CoreError::MemberHasActiveLoans {
                member_id,
                active: active.len(),
            }
            .into());
        }

        let rows = self.members.delete(member_id).await?;
        if rows.is_empty() {
            return Err(CoreError::MemberNotFound(member_id).into());
        }

        info!(member_id, "Member deleted");
        Ok(rows)
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Adds a book. A blank category is stored as NULL.
    pub async fn add_book(&self, title: &str, author: &str, category: Option<&str>, stock: i64) -> ShelfResult<Book> {
        validate_text("title", title)?;
        validate_text("author", author)?;
        validate_stock(stock)?;

        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let book = self
            .books
            .insert(&NewBook {
                title: title.trim().to_string(),
                author: author.trim().to_string(),
                category,
                stock,
            })
            .await?;

        info!(book_id = book.book_id, stock = book.stock, "Book added");
        Ok(book)
    }

    /// Overwrites a book's stock. Negative values are rejected.
    pub async fn update_book_stock(&self, book_id: i64, stock: i64) -> ShelfResult<Vec<Book>> {
        validate_stock(stock)?;

        let rows = self.books.set_stock(book_id, stock).await?;
        if rows.is_empty() {
            return Err(CoreError::BookNotFound(book_id).into());
        }
        Ok(rows)
    }

    /// Updates the supplied descriptive fields; `Ok(None)` when nothing was supplied.
    pub async fn update_book_info(&self, book_id: i64, update: BookUpdate) -> ShelfResult<Option<Vec<Book>>> {
        if update.is_empty() {
            debug!(book_id, "Book update has no fields; skipping");
            return Ok(None);
        }
        let update = BookUpdate {
            title: trimmed(update.title),
            author: trimmed(update.author),
            category: trimmed(update.category),
        };
        if let Some(title) = &update.title {
            validate_text("title", title)?;
        }
        if let Some(author) = &update.author {
            validate_text("author", author)?;
        }

        let rows = self.books.update_info(book_id, &update).await?;
        if rows.is_empty() {
            return Err(CoreError::BookNotFound(book_id).into());
        }
        Ok(Some(rows))
    }

    /// Deletes a book that is not currently on loan.
    pub async fn delete_book(&self, book_id: i64) -> ShelfResult<Vec<Book>> {
        let active = self.borrows.active_for_book(book_id).await?;
        if !active.is_empty() {
            return Err(CoreError::BookHasActiveLoans {
                book_id,
                active: active.len(),
            }
            .into());
        }

        let rows = self.books.delete(book_id).await?;
        if rows.is_empty() {
            return Err(CoreError::BookNotFound(book_id).into());
        }

        info!(book_id, "Book deleted");
        Ok(rows)
    }

    /// Every book, ordered by title.
    pub async fn list_books(&self) -> ShelfResult<Vec<Book>> {
        Ok(self.books.list().await?)
    }

    /// Books whose title, author or category contains `term`, ignoring case.
    pub async fn search_books(&self, term: &str) -> ShelfResult<Vec<Book>> {
        let term = validate_search_term(term)?;
        Ok(self.books.search(&term).await?)
    }

    /// All loans of a member with book title and author, newest first.
    pub async fn member_borrow_history(&self, member_id: i64) -> ShelfResult<Vec<BorrowRecord>> {
        Ok(self.borrows.history(member_id).await?)
    }

    // =========================================================================
    // Borrow / Return
    // =========================================================================

    /// Lends one copy of a book to a member.
    pub async fn borrow_book(&self, member_id: i64, book_id: i64) -> ShelfResult<BorrowRecord> {
        if self.members.get(member_id).await?.is_none() {
            return Err(CoreError::MemberNotFound(member_id).into());
        }

        if !self.policy.allow_duplicate_active {
            if let Some(existing) = self.borrows.latest_active(member_id, book_id).await? {
                return Err(CoreError::DuplicateActiveBorrow {
                    member_id,
                    book_id,
                    record_id: existing.record_id,
                }
                .into());
            }
        }

        let book = self.adjust_stock(book_id, -1).await?;
        debug!(book_id, stock = book.stock, "Copy reserved");

        let record = NewBorrowRecord {
            member_id,
            book_id,
            borrow_date: Utc::now(),
        };

        match self.borrows.insert(&record).await {
            Ok(created) => {
                info!(record_id = created.record_id, member_id, book_id, "Book borrowed");
                Ok(created)
            }
            Err(insert_err) => {
                warn!(book_id, error = %insert_err, "Borrow record insert failed; restoring stock");
                if let Err(restore_err) = self.adjust_stock(book_id, 1).await {
                    error!(
                        book_id,
                        error = %restore_err,
                        "Could not restore stock after failed borrow; stock is one too low"
                    );
                }
                Err(insert_err.into())
            }
        }
    }

    /// Closes the member's most recent open loan of the book.
    pub async fn return_book(&self, member_id: i64, book_id: i64) -> ShelfResult<ReturnReceipt> {
        let no_active = || CoreError::NoActiveBorrow { member_id, book_id };

        let returned_at = Utc::now();
        let mut closed = None;
        for _ in 0..RETURN_ATTEMPTS {
            let record = self
                .borrows
                .latest_active(member_id, book_id)
                .await?
                .ok_or_else(no_active)?;

            if self
                .borrows
                .mark_returned(record.record_id, returned_at)
                .await?
                .is_some()
            {
                closed = Some(record);
                break;
            }
            debug!(record_id = record.record_id, "Loan closed concurrently; looking for another");
        }
        let record = closed.ok_or_else(no_active)?;

        if let Err(err) = self.adjust_stock(book_id, 1).await {
            error!(
                record_id = record.record_id,
                book_id,
                error = %err,
                "Loan closed but stock was not incremented"
            );
            return Err(err);
        }

        info!(record_id = record.record_id, member_id, book_id, "Book returned");
        Ok(ReturnReceipt {
            record_id: record.record_id,
            returned_at,
        })
    }

    /// Moves a book's stock by `delta` with a compare-and-set, re-reading on
    /// contention. A decrement fails with `BookUnavailable` instead of going
    /// below zero.
    async fn adjust_stock(&self, book_id: i64, delta: i64) -> ShelfResult<Book> {
        for attempt in 1..=self.stock_retry_limit {
            let book = self
                .books
                .get(book_id)
                .await?
                .ok_or(CoreError::BookNotFound(book_id))?;

            let target = book.stock + delta;
            if target < 0 {
                return Err(CoreError::BookUnavailable {
                    book_id,
                    stock: book.stock,
                }
                .into());
            }

            if let Some(updated) = self
                .books
                .compare_and_set_stock(book_id, book.stock, target)
                .await?
            {
                return Ok(updated);
            }

            warn!(book_id, attempt, observed = book.stock, "Stock changed concurrently; retrying");
        }

        Err(DbError::Conflict {
            table: BOOKS_TABLE.to_string(),
            id: book_id.to_string(),
            attempts: self.stock_retry_limit,
        }
        .into())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// The `limit` most borrowed books.
    pub async fn top_borrowed_books(&self, limit: i64) -> ShelfResult<Vec<TopBorrowedBook>> {
        validate_limit(limit)?;
        Ok(self.reports.top_borrowed_books(limit).await?)
    }

    /// Open loans older than `days` days.
    pub async fn overdue_members(&self, days: i64) -> ShelfResult<Vec<OverdueLoan>> {
        validate_days(days)?;
        Ok(self.reports.overdue_members(days).await?)
    }

    /// Loan counts per member.
    pub async fn borrowed_count_per_member(&self) -> ShelfResult<Vec<MemberLoanCount>> {
        Ok(self.reports.borrowed_count_per_member().await?)
    }
}

/// Trims a supplied update field; blank stays `Some("")`.
fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::memory::MemoryStore;
    use shelf_core::ErrorKind;
    use std::sync::Arc;

    fn library() -> (Arc<MemoryStore>, LibraryManager) {
        let store = Arc::new(MemoryStore::new());
        let shelf = Shelf::with_store(store.clone(), StoreConfig::in_memory());
        (store, shelf.library())
    }

    #[tokio::test]
    async fn test_add_member_validates() {
        let (store, library) = library();
        let err = library.add_member("  ", "a@b.c").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.write_count().unwrap(), 0);

        let ada = library.add_member(" Ada ", "ada@example.com").await.unwrap();
        assert_eq!(ada.name, "Ada");
    }

    #[tokio::test]
    async fn test_empty_updates_send_nothing() {
        let (store, library) = library();
        library.add_member("Ada", "ada@example.com").await.unwrap();
        let writes = store.write_count().unwrap();

        assert!(library.update_member(1, MemberUpdate::default()).await.unwrap().is_none());
        assert!(library.update_book_info(1, BookUpdate::default()).await.unwrap().is_none());
        assert_eq!(store.write_count().unwrap(), writes);
    }

    #[tokio::test]
    async fn test_update_unknown_member_is_not_found() {
        let (_, library) = library();
        let update = MemberUpdate {
            name: Some("Bo".into()),
            ..Default::default()
        };
        let err = library.update_member(42, update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_updates_are_trimmed() {
        let (_, library) = library();
        library.add_member("Ada", "ada@example.com").await.unwrap();
        library.add_book("Dune", "Herbert", Some("SciFi"), 1).await.unwrap();

        let update = MemberUpdate {
            name: Some("  Ada L.  ".into()),
            email: Some(" ada@lovelace.org ".into()),
        };
        let rows = library.update_member(1, update).await.unwrap().unwrap();
        assert_eq!(rows[0].name, "Ada L.");
        assert_eq!(rows[0].email, "ada@lovelace.org");

        let update = BookUpdate {
            author: Some(" Frank Herbert ".into()),
            category: Some("  ".into()),
            ..Default::default()
        };
        let rows = library.update_book_info(1, update).await.unwrap().unwrap();
        assert_eq!(rows[0].author, "Frank Herbert");
        assert_eq!(rows[0].category.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_blank_required_update_is_rejected() {
        let (store, library) = library();
        library.add_member("Ada", "ada@example.com").await.unwrap();
        library.add_book("Dune", "Herbert", None, 1).await.unwrap();
        let writes = store.write_count().unwrap();

        let update = MemberUpdate {
            name: Some("   ".into()),
            ..Default::default()
        };
        let err = library.update_member(1, update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let update = BookUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        let err = library.update_book_info(1, update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.write_count().unwrap(), writes);
    }

    #[tokio::test]
    async fn test_blank_category_is_none() {
        let (_, library) = library();
        let book = library.add_book("Dune", "Herbert", Some("  "), 1).await.unwrap();
        assert_eq!(book.category, None);
    }

    #[tokio::test]
    async fn test_borrow_unknown_member_or_book() {
        let (store, library) = library();
        library.add_book("Dune", "Herbert", None, 1).await.unwrap();

        let err = library.borrow_book(9, 1).await.unwrap_err();
        assert!(matches!(err, crate::ShelfError::Core(CoreError::MemberNotFound(9))));

        library.add_member("Ada", "ada@example.com").await.unwrap();
        let err = library.borrow_book(1, 99).await.unwrap_err();
        assert!(matches!(err, crate::ShelfError::Core(CoreError::BookNotFound(99))));
        assert!(store.rows("borrow_records").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_arguments_are_validated() {
        let (store, library) = library();
        assert_eq!(
            library.top_borrowed_books(0).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            library.overdue_members(-1).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(store.rpc_calls().unwrap().is_empty());
    }
}
