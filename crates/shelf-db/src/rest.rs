//! # REST Store
//!
//! [`DataStore`] over HTTP, speaking the PostgREST dialect used by hosted
//! Supabase projects.
//!
//! ## Request Mapping
//! ```text
//! ┌──────────────┬────────┬──────────────────────────────┬──────────────────────────┐
//! │ Operation    │ Method │ Path                         │ Notes                    │
//! ├──────────────┼────────┼──────────────────────────────┼──────────────────────────┤
//! │ select       │ GET    │ /rest/v1/<table>?select=...  │ filters, order, limit    │
//! │ insert       │ POST   │ /rest/v1/<table>             │ Prefer: return=repr.     │
//! │ update       │ PATCH  │ /rest/v1/<table>?<filters>   │ Prefer: return=repr.     │
//! │ delete       │ DELETE │ /rest/v1/<table>?<filters>   │ Prefer: return=repr.     │
//! │ rpc          │ POST   │ /rest/v1/rpc/<function>      │ JSON object of args      │
//! └──────────────┴────────┴──────────────────────────────┴──────────────────────────┘
//!
//! Every request: apikey: <key>, Authorization: Bearer <key>,
//!                Accept-Profile / Content-Profile: <schema>
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{DbError, DbResult};
use crate::query::{filter_params, Filter, Query, Row};
use crate::store::{into_rows, DataStore};

/// Store backed by a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    schema: String,
}

impl RestStore {
    /// Builds the HTTP client with the credential headers baked in.
    ///
    /// No request is sent here; an unreachable endpoint surfaces on first use.
    pub fn new(config: &StoreConfig) -> DbResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.key)
            .map_err(|_| DbError::Internal("SUPABASE_KEY is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.key))
            .map_err(|_| DbError::Internal("SUPABASE_KEY is not a valid header value".into()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(RestStore {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            schema: config.schema.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn read(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Accept-Profile", &self.schema)
    }

    fn write(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
            .header("Prefer", "return=representation")
    }

    /// Checks the status and parses the body; an empty body is `null`.
    async fn handle_response(response: Response) -> DbResult<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DbError::from_response(status.as_u16(), &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(&self, query: &Query) -> DbResult<Vec<Row>> {
        debug!(table = %query.table, filters = query.filters.len(), "GET");

        let request = self
            .read(self.client.get(self.table_url(&query.table)))
            .query(&query.to_params());
        let rows = into_rows(Self::handle_response(request.send().await?).await?)?;

        debug!(table = %query.table, rows = rows.len(), "Select returned rows");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> DbResult<Row> {
        debug!(table = %table, "POST");

        let request = self
            .write(self.client.post(self.table_url(table)))
            .json(&Value::Object(row));
        let rows = into_rows(Self::handle_response(request.send().await?).await?)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::Decode(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: &str, changes: Row, filters: &[Filter]) -> DbResult<Vec<Row>> {
        debug!(table = %table, filters = filters.len(), "PATCH");

        let request = self
            .write(self.client.patch(self.table_url(table)))
            .query(&filter_params(filters))
            .json(&Value::Object(changes));
        let rows = into_rows(Self::handle_response(request.send().await?).await?)?;

        debug!(table = %table, rows = rows.len(), "Update affected rows");
        Ok(rows)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> DbResult<Vec<Row>> {
        debug!(table = %table, filters = filters.len(), "DELETE");

        let request = self
            .write(self.client.delete(self.table_url(table)))
            .query(&filter_params(filters));
        let rows = into_rows(Self::handle_response(request.send().await?).await?)?;

        debug!(table = %table, rows = rows.len(), "Delete removed rows");
        Ok(rows)
    }

    async fn rpc(&self, function: &str, args: Value) -> DbResult<Value> {
        debug!(function = %function, "RPC");

        let request = self
            .write(self.client.post(self.rpc_url(function)))
            .json(&args);
        Self::handle_response(request.send().await?).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_urls() {
        let config = StoreConfig::new("https://abc.supabase.co/", "key");
        let store = RestStore::new(&config).unwrap();

        assert_eq!(store.table_url("books"), "https://abc.supabase.co/rest/v1/books");
        assert_eq!(
            store.rpc_url("top_borrowed_books"),
            "https://abc.supabase.co/rest/v1/rpc/top_borrowed_books"
        );
    }

    #[test]
    fn test_rejects_unprintable_key() {
        let config = StoreConfig::new("https://abc.supabase.co", "bad\nkey");
        assert!(matches!(RestStore::new(&config), Err(DbError::Internal(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let mut config = StoreConfig::new("http://127.0.0.1:9", "key");
        config.timeout = Some(Duration::from_secs(2));
        let store = RestStore::new(&config).unwrap();

        let err = store.select(&Query::from("books")).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
