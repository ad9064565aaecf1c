//! # Library Menu
//!
//! Thirteen numbered choices over [`LibraryManager`]. Every action reads
//! its inputs, calls one or two manager operations, and renders the
//! outcome as a [`ResultSet`].
//!
//! ## Choices
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1  Register member         →  add_member            "Member Registered"│
//! │  2  Add book                →  add_book              "Book Added"       │
//! │  3  List books              →  list_books            "Books List"       │
//! │  4  Search books            →  search_books          "Search Results"   │
//! │  5  Member details          →  get_member + history  "Member", ...      │
//! │  6  Update member           →  update_member         "Member Updated"   │
//! │  7  Update book stock/info  →  update_book_stock OR update_book_info    │
//! │  8  Delete member           →  delete_member         "Deleted"          │
//! │  9  Delete book             →  delete_book           "Deleted"          │
//! │  10 Borrow book             →  borrow_book           "Borrowed"         │
//! │  11 Return book             →  return_book           "Returned"         │
//! │  12 Reports (a / b / c)     →  the three procedures                     │
//! │  13 Exit                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Choice 7 asks for a stock first; leaving it blank switches to the
//! title/author/category prompts instead.

use std::io::{BufRead, Write};

use shelf_core::{
    BookUpdate, MemberUpdate, ResultSet, DEFAULT_BOOK_STOCK, DEFAULT_OVERDUE_DAYS,
    DEFAULT_TOP_BOOKS_LIMIT,
};
use shelf_db::LibraryManager;

use crate::error::CliResult;
use crate::prompt::{settle, Flow, Prompt};
use crate::render::render;

const MENU: &str = "
--- Library Management ---
1. Register member
2. Add book
3. List books
4. Search books
5. Member details & borrowed books
6. Update member
7. Update book stock/info
8. Delete member
9. Delete book
10. Borrow book
11. Return book
12. Reports
13. Exit";

/// Interactive library menu.
pub struct LibraryMenu {
    library: LibraryManager,
}

impl LibraryMenu {
    /// Creates a new LibraryMenu.
    pub fn new(library: LibraryManager) -> Self {
        LibraryMenu { library }
    }

    /// Runs until the user exits or input ends.
    ///
    /// ## Errors
    /// Only terminal I/O failures; every other error is printed and the
    /// menu is shown again.
    pub async fn run<R: BufRead, W: Write>(&self, prompt: &mut Prompt<R, W>) -> CliResult<()> {
        loop {
            prompt.say(MENU)?;
            let outcome = match prompt.ask("Choose: ") {
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
            "1" => self.register_member(p).await?,
            "2" => self.add_book(p).await?,
            "3" => {
                let books = self.library.list_books().await?;
                render(p.output(), "Books List", &ResultSet::records(&books))?;
            }
            "4" => {
                let term = p.ask("Search term: ")?;
                let books = self.library.search_books(&term).await?;
                render(p.output(), "Search Results", &ResultSet::records(&books))?;
            }
            "5" => self.member_details(p).await?,
            "6" => self.update_member(p).await?,
            "7" => self.update_book(p).await?,
            "8" => {
                let member_id = p.ask_i64("Member ID to delete: ", "member id")?;
                let rows = self.library.delete_member(member_id).await?;
                let deleted = rows.iter().map(|m| format!("Member #{} {}", m.member_id, m.name));
                render(p.output(), "Deleted", &ResultSet::values(deleted))?;
            }
            "9" => {
                let book_id = p.ask_i64("Book ID to delete: ", "book id")?;
                let rows = self.library.delete_book(book_id).await?;
                let deleted = rows.iter().map(|b| format!("Book #{} {}", b.book_id, b.title));
                render(p.output(), "Deleted", &ResultSet::values(deleted))?;
            }
            "10" => {
                let member_id = p.ask_i64("Member ID: ", "member id")?;
                let book_id = p.ask_i64("Book ID: ", "book id")?;
                let record = self.library.borrow_book(member_id, book_id).await?;
                render(p.output(), "Borrowed", &ResultSet::record(Some(&record)))?;
            }
            "11" => {
                let member_id = p.ask_i64("Member ID: ", "member id")?;
                let book_id = p.ask_i64("Book ID: ", "book id")?;
                let receipt = self.library.return_book(member_id, book_id).await?;
                render(p.output(), "Returned", &ResultSet::record(Some(&receipt)))?;
            }
            "12" => self.reports(p).await?,
            "13" => {
                p.say("Bye.")?;
                return Ok(Flow::Exit);
            }
            _ => p.say("Invalid option.")?,
        }
        Ok(Flow::Continue)
    }

    async fn register_member<R: BufRead, W: Write>(&self, p: &mut Prompt<R, W>) -> CliResult<()> {
        let name = p.ask("Name: ")?;
        let email = p.ask("Email: ")?;
        let member = self.library.add_member(&name, &email).await?;
        render(p.output(), "Member Registered", &ResultSet::record(Some(&member)))?;
        Ok(())
    }

    async fn add_book<R: BufRead, W: Write>(&self, p: &mut Prompt<R, W>) -> CliResult<()> {
        let title = p.ask("Title: ")?;
        let author = p.ask("Author: ")?;
        let category = p.ask_optional("Category: ")?;
        let stock = p
            .ask_optional_i64("Stock: ", "stock")?
            .unwrap_or(DEFAULT_BOOK_STOCK);

        let book = self
            .library
            .add_book(&title, &author, category.as_deref(), stock)
            .await?;
        render(p.output(), "Book Added", &ResultSet::record(Some(&book)))?;
        Ok(())
    }

    async fn member_details<R: BufRead, W: Write>(&self, p: &mut Prompt<R, W>) -> CliResult<()> {
        let member_id = p.ask_i64("Member ID: ", "member id")?;
        let member = self.library.get_member(member_id).await?;
        render(p.output(), "Member", &ResultSet::record(member.as_ref()))?;

        let history = self.library.member_borrow_history(member_id).await?;
        render(p.output(), "Borrowed Books", &ResultSet::records(&history))?;
        Ok(())
    }

    async fn update_member<R: BufRead, W: Write>(&self, p: &mut Prompt<R, W>) -> CliResult<()> {
        let member_id = p.ask_i64("Member ID: ", "member id")?;
        let update = MemberUpdate {
            name: p.ask_optional("New name (leave blank to skip): ")?,
            email: p.ask_optional("New email (leave blank to skip): ")?,
        };

        let result = match self.library.update_member(member_id, update).await? {
            Some(rows) => ResultSet::records(&rows),
            None => ResultSet::scalar("Nothing to update."),
        };
        render(p.output(), "Member Updated", &result)?;
        Ok(())
    }

    async fn update_book<R: BufRead, W: Write>(&self, p: &mut Prompt<R, W>) -> CliResult<()> {
        let book_id = p.ask_i64("Book ID: ", "book id")?;

        let result = match p.ask_optional_i64("New stock (leave blank to skip): ", "stock")? {
            Some(stock) => ResultSet::records(&self.library.update_book_stock(book_id, stock).await?),
            None => {
                let update = BookUpdate {
                    title: p.ask_optional("New title (leave blank to skip): ")?,
                    author: p.ask_optional("New author (leave blank to skip): ")?,
                    category: p.ask_optional("New category (leave blank to skip): ")?,
                };
                match self.library.update_book_info(book_id, update).await? {
                    Some(rows) => ResultSet::records(&rows),
                    None => ResultSet::scalar("Nothing to update."),
                }
            }
        };
        render(p.output(), "Book Updated", &result)?;
        Ok(())
    }

    async fn reports<R: BufRead, W: Write>(&self, p: &mut Prompt<R, W>) -> CliResult<()> {
        p.say("\nReports:")?;
        p.say("a) Top borrowed books")?;
        p.say(&format!("b) Overdue (>{} days)", DEFAULT_OVERDUE_DAYS))?;
        p.say("c) Borrowed count per member")?;

        match p.ask("Choose report: ")?.to_lowercase().as_str() {
            "a" => {
                let rows = self.library.top_borrowed_books(DEFAULT_TOP_BOOKS_LIMIT).await?;
                render(p.output(), "Top Borrowed Books", &ResultSet::records(&rows))?;
            }
            "b" => {
                let rows = self.library.overdue_members(DEFAULT_OVERDUE_DAYS).await?;
                render(p.output(), "Overdue Members", &ResultSet::records(&rows))?;
            }
            "c" => {
                let rows = self.library.borrowed_count_per_member().await?;
                render(p.output(), "Borrowed Count per Member", &ResultSet::records(&rows))?;
            }
            _ => p.say("Invalid report option.")?,
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
