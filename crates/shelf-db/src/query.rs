//! # Query Builder
//!
//! Describes a select/update/delete against one table in a store-neutral
//! form. `RestStore` renders it as PostgREST query parameters; `MemoryStore`
//! evaluates it directly against JSON rows.
//!
//! ## Rendering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Query::from("borrow_records")                                          │
//! │      .select("*, books(title,author)")                                  │
//! │      .eq("member_id", 7)                                                │
//! │      .is_null("return_date")                                            │
//! │      .order_desc("borrow_date")                                         │
//! │      .limit(1)                                                          │
//! │                                                                         │
//! │  GET /rest/v1/borrow_records                                            │
//! │      ?select=*, books(title,author)                                     │
//! │      &member_id=eq.7                                                    │
//! │      &return_date=is.null                                               │
//! │      &order=borrow_date.desc                                            │
//! │      &limit=1                                                           │
//! │                                                                         │
//! │  Filter::any([ilike(title), ilike(author)])                             │
//! │      → or=(title.ilike."*sci*",author.ilike."*sci*")                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::DateTime;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A row as exchanged with the store: column name → JSON value.
pub type Row = Map<String, Value>;

// =============================================================================
// Filter
// =============================================================================

/// A condition on a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },
    /// Case-insensitive pattern match; `*` (or `%`) matches any run of characters.
    ILike { column: String, pattern: String },
    /// `column IS NULL`
    IsNull { column: String },
    /// At least one of the inner filters holds.
    Or(Vec<Filter>),
}

impl Filter {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive "contains" on a text column.
    pub fn contains(column: impl Into<String>, term: &str) -> Self {
        Filter::ILike {
            column: column.into(),
            pattern: format!("*{}*", term),
        }
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull {
            column: column.into(),
        }
    }

    /// OR-combination of filters.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// PostgREST query parameter `(key, value)` for a top-level filter.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{}", raw_value(value))),
            Filter::ILike { column, pattern } => (column.clone(), format!("ilike.{}", pattern)),
            Filter::IsNull { column } => (column.clone(), "is.null".to_string()),
            Filter::Or(inner) => {
                let conditions: Vec<String> = inner.iter().map(Filter::to_condition).collect();
                ("or".to_string(), format!("({})", conditions.join(",")))
            }
        }
    }

    /// Condition syntax used inside `or=(...)`; values are always quoted so
    /// commas and parentheses in user input cannot break the grouping.
    fn to_condition(&self) -> String {
        match self {
            Filter::Eq { column, value } => format!("{}.eq.{}", column, quote(&raw_value(value))),
            Filter::ILike { column, pattern } => format!("{}.ilike.{}", column, quote(pattern)),
            Filter::IsNull { column } => format!("{}.is.null", column),
            Filter::Or(inner) => {
                let conditions: Vec<String> = inner.iter().map(Filter::to_condition).collect();
                format!("or({})", conditions.join(","))
            }
        }
    }

    /// Evaluates the filter against a row (used by the in-memory store).
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq { column, value } => row
                .get(column)
                .map(|actual| values_equal(actual, value))
                .unwrap_or(false),
            Filter::ILike { column, pattern } => match row.get(column) {
                Some(Value::String(text)) => ilike(text, pattern),
                Some(Value::Null) | None => false,
                Some(other) => ilike(&other.to_string(), pattern),
            },
            Filter::IsNull { column } => matches!(row.get(column), None | Some(Value::Null)),
            Filter::Or(inner) => inner.iter().any(|f| f.matches(row)),
        }
    }
}

/// Renders a JSON value the way PostgREST expects it in a filter.
fn raw_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            a.to_string() == *b
        }
        _ => actual == expected,
    }
}

/// Case-insensitive wildcard match (`*` and `%` match any run of characters).
fn ilike(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '*' || pattern[p] == '%') {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*' || *c == '%')
}

// =============================================================================
// Order
// =============================================================================

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    fn to_param(&self) -> String {
        format!(
            "{}.{}",
            self.column,
            if self.descending { "desc" } else { "asc" }
        )
    }

    /// Compares two rows on this key; NULL sorts after every value ascending.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = compare_values(a.get(&self.column), b.get(&self.column));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

// =============================================================================
// Embedded Resources
// =============================================================================

/// A related table pulled into each row, e.g. `books(title,author)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub table: String,
    pub columns: Vec<String>,
}

/// Parsed select list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    /// `*` present: keep every column.
    pub all: bool,
    /// Explicitly named columns.
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
}

impl Projection {
    /// Parses `"*, books(title,author)"` style select lists.
    pub fn parse(select: &str) -> Self {
        let mut projection = Projection::default();

        for item in split_top_level(select) {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            if item == "*" {
                projection.all = true;
            } else if let Some((table, rest)) = item.split_once('(') {
                let columns = rest
                    .trim_end_matches(')')
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                projection.embeds.push(Embed {
                    table: table.trim().to_string(),
                    columns,
                });
            } else {
                projection.columns.push(item.to_string());
            }
        }

        projection
    }

    /// Keeps only the selected columns of a row (embeds are added separately).
    pub fn apply(&self, row: &Row) -> Row {
        if self.all {
            return row.clone();
        }
        self.columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    }
}

fn split_top_level(select: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in select.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&select[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&select[start..]);
    parts
}

// =============================================================================
// Query
// =============================================================================

/// A filtered, ordered, limited select against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Starts a `select *` on the table.
    pub fn from(table: impl Into<String>) -> Self {
        Query {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Replaces the select list.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Adds a filter (filters are AND-combined).
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds `column = value`.
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    /// Adds `column IS NULL`.
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.filter(Filter::is_null(column))
    }

    /// Adds an ascending sort key.
    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            descending: false,
        });
        self
    }

    /// Adds a descending sort key.
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    /// Caps the number of rows returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// PostgREST query parameters for this select.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(filter_params(&self.filters));

        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::to_param).collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

/// PostgREST query parameters for a filter list (update/delete targets).
pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_param).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_history_query_params() {
        let query = Query::from("borrow_records")
            .select("*, books(title,author)")
            .eq("member_id", 7)
            .is_null("return_date")
            .order_desc("borrow_date")
            .limit(1);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*, books(title,author)".to_string()),
                ("member_id".to_string(), "eq.7".to_string()),
                ("return_date".to_string(), "is.null".to_string()),
                ("order".to_string(), "borrow_date.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_or_group_quotes_values() {
        let filter = Filter::any([
            Filter::contains("title", "a,b"),
            Filter::contains("author", "say \"hi\""),
        ]);
        assert_eq!(
            filter.to_param(),
            (
                "or".to_string(),
                r#"(title.ilike."*a,b*",author.ilike."*say \"hi\"*")"#.to_string()
            )
        );
    }

    #[test]
    fn test_matches() {
        let book = row(json!({ "book_id": 3, "title": "Dune", "category": "SciFi", "note": null }));

        assert!(Filter::eq("book_id", 3).matches(&book));
        assert!(!Filter::eq("book_id", 4).matches(&book));
        assert!(Filter::contains("category", "sci").matches(&book));
        assert!(Filter::contains("title", "").matches(&book));
        assert!(!Filter::contains("title", "dunes").matches(&book));
        assert!(Filter::is_null("note").matches(&book));
        assert!(Filter::is_null("missing").matches(&book));
        assert!(!Filter::is_null("title").matches(&book));
        assert!(Filter::any([Filter::contains("title", "zzz"), Filter::contains("category", "FI")])
            .matches(&book));
    }

    #[test]
    fn test_ilike_wildcards() {
        assert!(ilike("Frank Herbert", "*herb*"));
        assert!(ilike("Frank Herbert", "frank%"));
        assert!(ilike("abcabd", "*abd"));
        assert!(!ilike("Frank", "*herb*"));
    }

    #[test]
    fn test_order_compare() {
        let a = row(json!({ "title": "Alpha", "n": 2 }));
        let b = row(json!({ "title": "Beta", "n": null }));
        let asc = Order { column: "title".into(), descending: false };
        let desc = Order { column: "n".into(), descending: true };

        assert_eq!(asc.compare(&a, &b), Ordering::Less);
        assert_eq!(desc.compare(&a, &b), Ordering::Greater);

        let early = row(json!({ "at": "2024-03-01T10:00:05.5Z" }));
        let late = row(json!({ "at": "2024-03-01T10:00:05.51Z" }));
        let by_time = Order { column: "at".into(), descending: false };
        assert_eq!(by_time.compare(&early, &late), Ordering::Less);
    }

    #[test]
    fn test_projection_parse() {
        let projection = Projection::parse("*, books(title,author)");
        assert!(projection.all);
        assert_eq!(
            projection.embeds,
            vec![Embed {
                table: "books".into(),
                columns: vec!["title".into(), "author".into()],
            }]
        );

        let stock_only = Projection::parse("stock");
        assert!(!stock_only.all);
        let projected = stock_only.apply(&row(json!({ "stock": 2, "title": "Dune" })));
        assert_eq!(Value::Object(projected), json!({ "stock": 2 }));
    }
}
