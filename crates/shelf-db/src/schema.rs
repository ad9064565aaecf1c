//! # Schema Reference
//!
//! The SQL the hosted database must have for the client to work, embedded
//! at compile time. Nothing here is executed by the client; the `seed`
//! binary prints it (`seed --print-schema`) for the operator to run.
//!
//! ```text
//! sql/
//! ├── 001_tables.sql   # members, books, borrow_records, products
//! └── 002_reports.sql  # top_borrowed_books, overdue_members,
//!                      # borrowed_count_per_member
//! ```

/// Table definitions.
pub const TABLES_SQL: &str = include_str!("../sql/001_tables.sql");

/// Report procedure definitions.
pub const REPORTS_SQL: &str = include_str!("../sql/002_reports.sql");

/// Both scripts, in the order they must run.
pub fn full_schema() -> String {
    format!("{}\n{}", TABLES_SQL, REPORTS_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::reports::{BORROWED_COUNT_PER_MEMBER, OVERDUE_MEMBERS, TOP_BORROWED_BOOKS};
    use crate::repository::{BOOKS_TABLE, BORROW_RECORDS_TABLE, MEMBERS_TABLE};
    use shelf_core::{MemberLoanCount, OverdueLoan, Tabular, TopBorrowedBook};

    #[test]
    fn test_tables_are_defined() {
        for table in [MEMBERS_TABLE, BOOKS_TABLE, BORROW_RECORDS_TABLE, "products"] {
            assert!(
                TABLES_SQL.contains(&format!("create table if not exists {} (", table)),
                "missing table {}",
                table
            );
        }
        assert!(TABLES_SQL.contains("check (stock >= 0)"));
    }

    #[test]
    fn test_report_columns_match_row_types() {
        let contracts: [(&str, &[&str]); 3] = [
            (TOP_BORROWED_BOOKS, TopBorrowedBook::headers()),
            (OVERDUE_MEMBERS, OverdueLoan::headers()),
            (BORROWED_COUNT_PER_MEMBER, MemberLoanCount::headers()),
        ];

        for (function, columns) in contracts {
            let start = REPORTS_SQL
                .find(&format!("function {}(", function))
                .unwrap_or_else(|| panic!("missing function {}", function));
            let body = &REPORTS_SQL[start..];
            let returns = &body[..body.find("language sql").unwrap()];
            for column in columns {
                assert!(returns.contains(column), "{} lacks column {}", function, column);
            }
        }
    }

    #[test]
    fn test_full_schema_order() {
        let schema = full_schema();
        assert!(schema.find("create table").unwrap() < schema.find("create or replace function").unwrap());
    }
}
