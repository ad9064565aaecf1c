//! # Data Store Boundary
//!
//! The single seam between the managers and whatever holds the data.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Repositories (members, books, borrows, reports, products)              │
//! │       │  Query / Row / Filter                                           │
//! │       ▼                                                                 │
//! │  ┌───────────────────────── dyn DataStore ─────────────────────────┐   │
//! │  │                                                                 │   │
//! │  │   RestStore (rest.rs)              MemoryStore (memory.rs)      │   │
//! │  │   HTTP → /rest/v1/<table>          HashMap<table, Vec<Row>>     │   │
//! │  │   HTTP → /rest/v1/rpc/<fn>         scripted RPC responses       │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write returns the affected rows, so a guarded update that matched
//! nothing is visible to the caller as an empty vector.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DbError, DbResult};
use crate::query::{Filter, Query, Row};

/// Query-builder interface to a table store with remote procedures.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Rows matching the query.
    async fn select(&self, query: &Query) -> DbResult<Vec<Row>>;

    /// Inserts one row and returns it as stored (with generated keys).
    async fn insert(&self, table: &str, row: Row) -> DbResult<Row>;

    /// Applies `changes` to every row matching all filters; returns the updated rows.
    async fn update(&self, table: &str, changes: Row, filters: &[Filter]) -> DbResult<Vec<Row>>;

    /// Deletes every row matching all filters; returns the deleted rows.
    async fn delete(&self, table: &str, filters: &[Filter]) -> DbResult<Vec<Row>>;

    /// Invokes a remote procedure with named arguments.
    async fn rpc(&self, function: &str, args: Value) -> DbResult<Value>;
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Serializes a payload struct into a row.
pub fn to_row<T: Serialize>(value: &T) -> DbResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::Internal(format!(
            "expected an object payload, got {}",
            other
        ))),
    }
}

/// Decodes one row.
pub fn decode_row<T: DeserializeOwned>(row: Row) -> DbResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Decodes a list of rows.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> DbResult<Vec<T>> {
    rows.into_iter().map(decode_row).collect()
}

/// Converts a JSON response body into rows.
pub fn into_rows(value: Value) -> DbResult<Vec<Row>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(DbError::Decode(format!("expected a row object, got {}", other))),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map]),
        other => Err(DbError::Decode(format!("expected rows, got {}", other))),
    }
}

/// Extracts the row list from a procedure response.
///
/// ```text
/// [ {...}, {...} ]                      → as is
/// [ { "top_borrowed_books": [ ... ] } ] → inner list
/// null                                  → []
/// ```
pub fn rpc_rows(value: Value) -> DbResult<Vec<Row>> {
    let value = match value {
        Value::Array(mut items) if items.len() == 1 => match items.pop() {
            Some(Value::Object(map)) if map.len() == 1 && map.values().all(Value::is_array) => {
                map.into_iter()
                    .next()
                    .map(|(_, inner)| inner)
                    .unwrap_or(Value::Null)
            }
            Some(other) => Value::Array(vec![other]),
            None => Value::Null,
        },
        other => other,
    };
    into_rows(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
