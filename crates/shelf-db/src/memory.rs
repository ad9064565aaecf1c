//! # In-Memory Store
//!
//! A [`DataStore`] holding tables as JSON rows in process memory. Used by
//! the test suites.
//!
//! ## What It Emulates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Serial keys      members.member_id, books.book_id,                     │
//! │                   borrow_records.record_id (1, 2, 3, ...)               │
//! │  Unique columns   products.sku → DbError::UniqueViolation               │
//! │  Foreign keys     borrow_records.member_id → members.member_id          │
//! │  (on delete       borrow_records.book_id   → books.book_id              │
//! │   cascade)                                                              │
//! │  Embeds           select("*, books(title,author)") on borrow_records    │
//! │  Procedures       scripted responses, every call recorded               │
//! │  Faults           fail_next_insert(table)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each operation yields to the scheduler before touching the tables, so
//! concurrent manager calls interleave the way independent HTTP requests do.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{DbError, DbResult};
use crate::query::{Filter, Projection, Query, Row};
use crate::store::DataStore;

/// A column that references another table's key.
#[derive(Debug, Clone)]
struct ForeignKey {
    table: String,
    column: String,
    target_table: String,
    target_column: String,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    rpc_responses: HashMap<String, Value>,
    rpc_calls: Vec<(String, Value)>,
    failing_inserts: HashMap<String, DbError>,
    writes: usize,
}

/// In-process table store.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    serial_keys: HashMap<String, String>,
    unique: Vec<(String, String)>,
    foreign_keys: Vec<ForeignKey>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a store with the library and inventory table rules.
    pub fn new() -> Self {
        MemoryStore::empty()
            .serial("members", "member_id")
            .serial("books", "book_id")
            .serial("borrow_records", "record_id")
            .unique("products", "sku")
            .foreign_key("borrow_records", "member_id", "members", "member_id")
            .foreign_key("borrow_records", "book_id", "books", "book_id")
    }

    /// Creates a store without any table rules.
    pub fn empty() -> Self {
        MemoryStore {
            state: Mutex::new(State::default()),
            serial_keys: HashMap::new(),
            unique: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Declares an auto-incrementing integer key.
    pub fn serial(mut self, table: &str, column: &str) -> Self {
        self.serial_keys.insert(table.to_string(), column.to_string());
        self
    }

    /// Declares a unique column.
    pub fn unique(mut self, table: &str, column: &str) -> Self {
        self.unique.push((table.to_string(), column.to_string()));
        self
    }

    /// Declares a cascading foreign key; it also drives `select` embeds.
    pub fn foreign_key(mut self, table: &str, column: &str, target_table: &str, target_column: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            table: table.to_string(),
            column: column.to_string(),
            target_table: target_table.to_string(),
            target_column: target_column.to_string(),
        });
        self
    }

    /// Scripts the response of a remote procedure.
    pub fn set_rpc_response(&self, function: &str, response: Value) -> DbResult<()> {
        self.lock()?
            .rpc_responses
            .insert(function.to_string(), response);
        Ok(())
    }

    /// Procedure calls received so far, as `(function, args)`.
    pub fn rpc_calls(&self) -> DbResult<Vec<(String, Value)>> {
        Ok(self.lock()?.rpc_calls.clone())
    }

    /// Makes the next insert into `table` fail with `error`.
    pub fn fail_next_insert(&self, table: &str, error: DbError) -> DbResult<()> {
        self.lock()?
            .failing_inserts
            .insert(table.to_string(), error);
        Ok(())
    }

    /// Number of successful inserts, updates and deletes that changed a row.
    pub fn write_count(&self) -> DbResult<usize> {
        Ok(self.lock()?.writes)
    }

    /// Snapshot of a table's rows, in insertion order.
    pub fn rows(&self, table: &str) -> DbResult<Vec<Row>> {
        Ok(self
            .lock()?
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| DbError::Internal("memory store lock poisoned".into()))
    }

    fn check_unique(&self, state: &State, table: &str, row: &Row, skip: Option<usize>) -> DbResult<()> {
        let Some(existing) = state.tables.get(table) else {
            return Ok(());
        };

        for (_, column) in self.unique.iter().filter(|(t, _)| t == table) {
            let Some(value) = row.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = existing
                .rows
                .iter()
                .enumerate()
                .any(|(i, other)| Some(i) != skip && other.get(column) == Some(value));
            if clash {
                return Err(DbError::duplicate(column.clone(), display(value)));
            }
        }
        Ok(())
    }

    fn check_references(&self, state: &State, table: &str, row: &Row) -> DbResult<()> {
        for fk in self.foreign_keys.iter().filter(|fk| fk.table == table) {
            let Some(value) = row.get(&fk.column).filter(|v| !v.is_null()) else {
                continue;
            };
            let present = state
                .tables
                .get(&fk.target_table)
                .map(|t| {
                    t.rows
                        .iter()
                        .any(|r| Filter::eq(fk.target_column.clone(), value.clone()).matches(r))
                })
                .unwrap_or(false);
            if !present {
                return Err(DbError::ForeignKeyViolation {
                    message: format!(
                        "Key ({})=({}) is not present in table \"{}\".",
                        fk.column,
                        display(value),
                        fk.target_table
                    ),
                });
            }
        }
        Ok(())
    }

    /// Removes rows of referencing tables (`ON DELETE CASCADE`).
    fn cascade(&self, state: &mut State, table: &str, deleted: &[Row]) -> usize {
        let mut removed = 0;
        for fk in self.foreign_keys.iter().filter(|fk| fk.target_table == table) {
            let keys: Vec<Value> = deleted
                .iter()
                .filter_map(|r| r.get(&fk.target_column).cloned())
                .collect();
            if let Some(child) = state.tables.get_mut(&fk.table) {
                let before = child.rows.len();
                child.rows.retain(|r| {
                    !keys
                        .iter()
                        .any(|k| Filter::eq(fk.column.clone(), k.clone()).matches(r))
                });
                removed += before - child.rows.len();
            }
        }
        removed
    }

    fn embed(&self, state: &State, table: &str, row: &mut Row, embed_table: &str, columns: &[String]) -> DbResult<()> {
        let fk = self
            .foreign_keys
            .iter()
            .find(|fk| fk.table == table && fk.target_table == embed_table)
            .ok_or_else(|| DbError::UnknownTable(format!("no relationship {} → {}", table, embed_table)))?;

        let target = row.get(&fk.column).and_then(|value| {
            state.tables.get(embed_table).and_then(|t| {
                t.rows
                    .iter()
                    .find(|r| Filter::eq(fk.target_column.clone(), value.clone()).matches(r))
            })
        });

        let embedded = match target {
            Some(target) => Value::Object(
                columns
                    .iter()
                    .map(|c| (c.clone(), target.get(c).cloned().unwrap_or(Value::Null)))
                    .collect(),
            ),
            None => Value::Null,
        };
        row.insert(embed_table.to_string(), embedded);
        Ok(())
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Query) -> DbResult<Vec<Row>> {
        tokio::task::yield_now().await;
        let state = self.lock()?;

        let mut rows: Vec<Row> = state
            .tables
            .get(&query.table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|r| matches_all(&query.filters, r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if !query.order.is_empty() {
            rows.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|o| o.compare(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        let projection = Projection::parse(&query.columns);
        let mut projected = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut out = projection.apply(row);
            for embed in &projection.embeds {
                let mut source = row.clone();
                self.embed(&state, &query.table, &mut source, &embed.table, &embed.columns)?;
                if let Some(value) = source.remove(&embed.table) {
                    out.insert(embed.table.clone(), value);
                }
            }
            projected.push(out);
        }

        Ok(projected)
    }

    async fn insert(&self, table: &str, mut row: Row) -> DbResult<Row> {
        tokio::task::yield_now().await;
        let mut state = self.lock()?;

        if let Some(error) = state.failing_inserts.remove(table) {
            return Err(error);
        }

        self.check_unique(&state, table, &row, None)?;
        self.check_references(&state, table, &row)?;

        let serial = self.serial_keys.get(table).cloned();
        let entry = state.tables.entry(table.to_string()).or_default();

        if let Some(column) = serial {
            match row.get(&column).and_then(Value::as_i64) {
                Some(explicit) => entry.next_id = entry.next_id.max(explicit),
                None => {
                    entry.next_id += 1;
                    row.insert(column, json!(entry.next_id));
                }
            }
        }

        entry.rows.push(row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn update(&self, table: &str, changes: Row, filters: &[Filter]) -> DbResult<Vec<Row>> {
        tokio::task::yield_now().await;
        let mut state = self.lock()?;

        let targets: Vec<usize> = state
            .tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| matches_all(filters, r))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default();

        // Validate every target before changing any of them.
        let mut updated = Vec::with_capacity(targets.len());
        for &i in &targets {
            let mut candidate = state.tables[table].rows[i].clone();
            for (column, value) in &changes {
                candidate.insert(column.clone(), value.clone());
            }
            self.check_unique(&state, table, &candidate, Some(i))?;
            self.check_references(&state, table, &candidate)?;
            updated.push(candidate);
        }

        if let Some(entry) = state.tables.get_mut(table) {
            for (&i, row) in targets.iter().zip(&updated) {
                entry.rows[i] = row.clone();
            }
        }
        state.writes += updated.len();
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> DbResult<Vec<Row>> {
        tokio::task::yield_now().await;
        let mut state = self.lock()?;

        let doomed: Vec<Row> = state
            .tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|r| matches_all(filters, r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(entry) = state.tables.get_mut(table) {
            entry.rows.retain(|r| !matches_all(filters, r));
        }
        let cascaded = self.cascade(&mut state, table, &doomed);
        state.writes += doomed.len() + cascaded;
        Ok(doomed)
    }

    async fn rpc(&self, function: &str, args: Value) -> DbResult<Value> {
        tokio::task::yield_now().await;
        let mut state = self.lock()?;

        state.rpc_calls.push((function.to_string(), args));
        state
            .rpc_responses
            .get(function)
            .cloned()
            .ok_or_else(|| DbError::UnknownProcedure(function.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_serial_keys() {
        let store = MemoryStore::new();
        let first = store.insert("members", row(json!({ "name": "Ada" }))).await.unwrap();
        let explicit = store
            .insert("members", row(json!({ "member_id": 7, "name": "Bo" })))
            .await
            .unwrap();
        let next = store.insert("members", row(json!({ "name": "Cy" }))).await.unwrap();

        assert_eq!(first["member_id"], json!(1));
        assert_eq!(explicit["member_id"], json!(7));
        assert_eq!(next["member_id"], json!(8));
    }

    #[tokio::test]
    async fn test_unique_sku() {
        let store = MemoryStore::new();
        store
            .insert("products", row(json!({ "sku": "MUG-01", "name": "Mug" })))
            .await
            .unwrap();
        let err = store
            .insert("products", row(json!({ "sku": "MUG-01", "name": "Other" })))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, ref value } if field == "sku" && value == "MUG-01"));
        assert_eq!(store.write_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_and_embed() {
        let store = MemoryStore::new();
        let err = store
            .insert("borrow_records", row(json!({ "member_id": 1, "book_id": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        store.insert("members", row(json!({ "name": "Ada" }))).await.unwrap();
        store
            .insert("books", row(json!({ "title": "Dune", "author": "Herbert", "stock": 1 })))
            .await
            .unwrap();
        store
            .insert("borrow_records", row(json!({ "member_id": 1, "book_id": 1 })))
            .await
            .unwrap();

        let rows = store
            .select(&Query::from("borrow_records").select("*, books(title,author)"))
            .await
            .unwrap();
        assert_eq!(rows[0]["books"], json!({ "title": "Dune", "author": "Herbert" }));

        let deleted = store.delete("books", &[Filter::eq("book_id", 1)]).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(store.rows("borrow_records").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guarded_update() {
        let store = MemoryStore::new();
        store
            .insert("books", row(json!({ "title": "Dune", "stock": 1 })))
            .await
            .unwrap();

        let stale = store
            .update(
                "books",
                row(json!({ "stock": 4 })),
                &[Filter::eq("book_id", 1), Filter::eq("stock", 5)],
            )
            .await
            .unwrap();
        assert!(stale.is_empty());

        let applied = store
            .update(
                "books",
                row(json!({ "stock": 0 })),
                &[Filter::eq("book_id", 1), Filter::eq("stock", 1)],
            )
            .await
            .unwrap();
        assert_eq!(applied[0]["stock"], json!(0));
    }

    #[tokio::test]
    async fn test_order_limit_and_projection() {
        let store = MemoryStore::new();
        for (title, stock) in [("B", 2), ("A", 1), ("C", 3)] {
            store
                .insert("books", row(json!({ "title": title, "stock": stock })))
                .await
                .unwrap();
        }

        let rows = store
            .select(&Query::from("books").select("title").order_desc("stock").limit(2))
            .await
            .unwrap();
        assert_eq!(
            rows.into_iter().map(Value::Object).collect::<Vec<_>>(),
            vec![json!({ "title": "C" }), json!({ "title": "B" })]
        );
    }

    #[tokio::test]
    async fn test_rpc_scripting_and_faults() {
        let store = MemoryStore::new();
        store
            .set_rpc_response("top_borrowed_books", json!([]))
            .unwrap();

        store
            .rpc("top_borrowed_books", json!({ "p_limit": 5 }))
            .await
            .unwrap();
        assert!(matches!(
            store.rpc("missing", json!({})).await,
            Err(DbError::UnknownProcedure(_))
        ));
        assert_eq!(store.rpc_calls().unwrap()[0].1, json!({ "p_limit": 5 }));

        store
            .fail_next_insert("members", DbError::ConnectionFailed("down".into()))
            .unwrap();
        assert!(store.insert("members", row(json!({ "name": "Ada" }))).await.is_err());
        assert!(store.insert("members", row(json!({ "name": "Ada" }))).await.is_ok());
    }
}
