//! # Result Presentation Model
//!
//! Every menu action hands its output to the renderer as a [`ResultSet`].
//! The shape is chosen by the producer, never guessed from the data:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Producer                          ResultSet                            │
//! │  ────────                          ─────────                            │
//! │  list_books() → Vec<Book>    ──►   Records { headers, rows }            │
//! │  get_member() → None         ──►   Empty                                │
//! │  delete_book() → Vec<Book>   ──►   Values(["Book #3 Dune"])             │
//! │  return_book() → Receipt     ──►   Records (one row)                    │
//! │  update_member() → None      ──►   Scalar("Nothing to update.")         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row types opt into tabular output by implementing [`Tabular`].

use chrono::{DateTime, Utc};

use crate::types::{
    Book, BorrowRecord, Member, MemberLoanCount, OverdueLoan, Product, ReturnReceipt,
    TopBorrowedBook,
};

/// Display-ready output of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSet {
    /// A table of uniform records.
    Records {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// A plain list, one value per line.
    Values(Vec<String>),
    /// A single value or message.
    Scalar(String),
    /// Nothing to show.
    Empty,
}

impl ResultSet {
    /// Builds a table from records; no records yields `Empty`.
    pub fn records<T: Tabular>(items: &[T]) -> Self {
        if items.is_empty() {
            return ResultSet::Empty;
        }
        ResultSet::Records {
            headers: T::headers().iter().map(|h| h.to_string()).collect(),
            rows: items.iter().map(Tabular::row).collect(),
        }
    }

    /// Builds a one-row table, or `Empty` when the record is absent.
    pub fn record<T: Tabular>(item: Option<&T>) -> Self {
        match item {
            Some(item) => ResultSet::records(std::slice::from_ref(item)),
            None => ResultSet::Empty,
        }
    }

    /// Builds a plain list; an empty list yields `Empty`.
    pub fn values<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = items.into_iter().map(Into::into).collect();
        if values.is_empty() {
            ResultSet::Empty
        } else {
            ResultSet::Values(values)
        }
    }

    /// Builds a single message.
    pub fn scalar(value: impl Into<String>) -> Self {
        ResultSet::Scalar(value.into())
    }

    /// Number of rows/values (a scalar counts as one).
    pub fn len(&self) -> usize {
        match self {
            ResultSet::Records { rows, .. } => rows.len(),
            ResultSet::Values(values) => values.len(),
            ResultSet::Scalar(_) => 1,
            ResultSet::Empty => 0,
        }
    }

    /// True for `Empty`.
    pub fn is_empty(&self) -> bool {
        matches!(self, ResultSet::Empty)
    }
}

// =============================================================================
// Tabular
// =============================================================================

/// A record that knows its column headers and how to format its cells.
pub trait Tabular {
    /// Column headers, in display order.
    fn headers() -> &'static [&'static str];

    /// Cell values, aligned with [`Tabular::headers`].
    fn row(&self) -> Vec<String>;
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

impl Tabular for Member {
    fn headers() -> &'static [&'static str] {
        &["member_id", "name", "email"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.member_id.to_string(), self.name.clone(), self.email.clone()]
    }
}

impl Tabular for Book {
    fn headers() -> &'static [&'static str] {
        &["book_id", "title", "author", "category", "stock"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.book_id.to_string(),
            self.title.clone(),
            self.author.clone(),
            optional(self.category.as_deref()),
            self.stock.to_string(),
        ]
    }
}

impl Tabular for BorrowRecord {
    fn headers() -> &'static [&'static str] {
        &[
            "record_id",
            "book_id",
            "title",
            "author",
            "borrow_date",
            "return_date",
            "status",
        ]
    }

    fn row(&self) -> Vec<String> {
        let (title, author) = match &self.book {
            Some(book) => (book.title.clone(), book.author.clone()),
            None => (String::new(), String::new()),
        };
        vec![
            self.record_id.to_string(),
            self.book_id.to_string(),
            title,
            author,
            timestamp(&self.borrow_date),
            self.return_date.as_ref().map(timestamp).unwrap_or_default(),
            self.state().to_string(),
        ]
    }
}

impl Tabular for ReturnReceipt {
    fn headers() -> &'static [&'static str] {
        &["record_id", "returned_at"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.record_id.to_string(), self.returned_at.to_rfc3339()]
    }
}

impl Tabular for Product {
    fn headers() -> &'static [&'static str] {
        &["sku", "name", "price", "stock"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.sku.clone(),
            self.name.clone(),
            self.price.to_string(),
            self.stock.to_string(),
        ]
    }
}

impl Tabular for TopBorrowedBook {
    fn headers() -> &'static [&'static str] {
        &["book_id", "title", "author", "borrow_count"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.book_id.to_string(),
            self.title.clone(),
            self.author.clone(),
            self.borrow_count.to_string(),
        ]
    }
}

impl Tabular for OverdueLoan {
    fn headers() -> &'static [&'static str] {
        &[
            "member_id",
            "name",
            "email",
            "book_id",
            "title",
            "borrow_date",
            "days_borrowed",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.member_id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.book_id.to_string(),
            self.title.clone(),
            timestamp(&self.borrow_date),
            self.days_borrowed.to_string(),
        ]
    }
}

impl Tabular for MemberLoanCount {
    fn headers() -> &'static [&'static str] {
        &["member_id", "name", "borrowed_count"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.member_id.to_string(),
            self.name.clone(),
            self.borrowed_count.to_string(),
        ]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::BookSummary;
    use chrono::TimeZone;

    fn dune() -> Book {
        Book {
            book_id: 1,
            title: "Dune".into(),
            author: "Herbert".into(),
            category: None,
            stock: 2,
        }
    }

    #[test]
    fn test_records_from_books() {
        let set = ResultSet::records(&[dune()]);
        match set {
            ResultSet::Records { headers, rows } => {
                assert_eq!(headers, vec!["book_id", "title", "author", "category", "stock"]);
                assert_eq!(rows, vec![vec!["1", "Dune", "Herbert", "", "2"]]);
            }
            other => panic!("expected records, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_inputs_yield_empty() {
        assert!(ResultSet::records::<Book>(&[]).is_empty());
        assert!(ResultSet::record::<Member>(None).is_empty());
        assert!(ResultSet::values(Vec::<String>::new()).is_empty());
        assert_eq!(ResultSet::scalar("done").len(), 1);
    }

    #[test]
    fn test_history_row_uses_embedded_book_and_status() {
        let record = BorrowRecord {
            record_id: 9,
            member_id: 7,
            book_id: 1,
            borrow_date: Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap(),
            return_date: None,
            book: Some(BookSummary {
                title: "Dune".into(),
                author: "Herbert".into(),
            }),
        };
        assert_eq!(
            record.row(),
            vec!["9", "1", "Dune", "Herbert", "2024-03-01 10:30", "", "active"]
        );
    }

    #[test]
    fn test_product_row_formats_price() {
        let product = Product {
            sku: "MUG-01".into(),
            name: "Mug".into(),
            price: Money::from_cents(450),
            stock: 3,
        };
        assert_eq!(product.row(), vec!["MUG-01", "Mug", "4.50", "3"]);
    }
}
