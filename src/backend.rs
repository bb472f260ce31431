// Generic CRUD client for the hosted relational database service. All tables are
// reached through the same REST conventions (PostgREST style): api-key headers,
// `col=eq.val` filter params, `Prefer: return=representation` on writes.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

// Remote tables the marketplace reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Properties,
    Services,
    Bookings,
    Products,
    Profiles,
    Notifications,
    Favorites,
    Messages,
    ServiceEdits,
    ServiceModels,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Properties => "properties",
            Table::Services => "services",
            Table::Bookings => "bookings",
            Table::Products => "products",
            Table::Profiles => "profiles",
            Table::Notifications => "notifications",
            Table::Favorites => "favorites",
            Table::Messages => "messages",
            Table::ServiceEdits => "service_edits",
            Table::ServiceModels => "service_models",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Error types for remote database calls
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status_code} - {message}")]
    Response { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
        }
    }
}

// Database client trait; rows travel as JSON values so every table goes through
// the same four operations
#[async_trait]
pub trait DbClient: Send + Sync + 'static {
    // Fetch rows matching all equality filters (empty filters = whole table)
    async fn select(&self, table: Table, filters: &[(&str, &str)]) -> Result<Vec<Value>, ApiError>;

    // Insert one row and return it as stored (with server-assigned fields)
    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError>;

    // Patch the row with the given id and return the updated row
    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value, ApiError>;

    // Delete the row with the given id
    async fn delete(&self, table: Table, id: &str) -> Result<(), ApiError>;
}

pub struct RestDbClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl RestDbClient {
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn table_url(&self, table: Table) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table.as_str()
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Response {
            status_code: status.as_u16(),
            message,
        })
    }

    // Writes return the created/updated representation as a single-row array
    async fn single_row(response: reqwest::Response) -> Result<Value, ApiError> {
        let rows: Vec<Value> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode("Empty representation in write response".to_string()))
    }
}

#[async_trait]
impl DbClient for RestDbClient {
    async fn select(&self, table: Table, filters: &[(&str, &str)]) -> Result<Vec<Value>, ApiError> {
        debug!("select {} with {} filter(s)", table, filters.len());
        let params: Vec<(String, String)> = filters
            .iter()
            .map(|(column, value)| (column.to_string(), format!("eq.{}", value)))
            .collect();

        let response = self
            .authed(self.http.get(self.table_url(table)))
            .query(&params)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError> {
        debug!("insert into {}", table);
        let response = self
            .authed(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::single_row(response).await
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value, ApiError> {
        debug!("update {} id {}", table, id);
        let response = self
            .authed(self.http.patch(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::single_row(response).await
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), ApiError> {
        debug!("delete {} id {}", table, id);
        let response = self
            .authed(self.http.delete(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check(response).await.map(|_| ())
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockBackend;
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    #[test]
    fn test_table_names_match_remote_schema() {
        assert_eq!(Table::Properties.as_str(), "properties");
        assert_eq!(Table::ServiceEdits.as_str(), "service_edits");
        assert_eq!(Table::ServiceModels.as_str(), "service_models");
        assert_eq!(Table::Bookings.to_string(), "bookings");
    }

    #[test]
    fn test_rest_client_builds_table_urls() {
        let client = RestDbClient::new(BackendConfig {
            base_url: "https://db.example.com/".to_string(),
            api_key: "key".to_string(),
            timeout_ms: 5_000,
        })
        .unwrap();

        assert_eq!(
            client.table_url(Table::Bookings),
            "https://db.example.com/rest/v1/bookings"
        );
    }

    #[tokio::test]
    async fn test_mock_insert_assigns_id_and_records_row() {
        let backend = MockBackend::new();

        let created = assert_ok!(
            backend
                .insert(Table::Bookings, json!({ "item_id": "p1", "status": "pending" }))
                .await
        );
        assert!(created.get("id").and_then(Value::as_str).is_some());

        let rows = backend.rows_in(Table::Bookings);
        assert_eq!(rows.len(), 1);
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_select_applies_filters() {
        let backend = MockBackend::new();
        backend
            .insert(Table::Bookings, json!({ "id": "b1", "user_id": "u1" }))
            .await
            .unwrap();
        backend
            .insert(Table::Bookings, json!({ "id": "b2", "user_id": "u2" }))
            .await
            .unwrap();

        let rows = backend
            .select(Table::Bookings, &[("user_id", "u1")])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "b1");
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let backend = MockBackend::new();
        backend.fail_next_requests(1);

        let first = backend.insert(Table::Bookings, json!({})).await;
        assert!(matches!(
            first,
            Err(ApiError::Response { status_code: 500, .. })
        ));

        // Failures are consumed; the next request succeeds
        let second = backend.insert(Table::Bookings, json!({})).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_mock_delay_accumulates_across_sequential_requests() {
        let backend = MockBackend::new();
        backend.set_delay(20);

        let start = std::time::Instant::now();
        backend.insert(Table::Bookings, json!({})).await.unwrap();
        backend.insert(Table::Bookings, json!({})).await.unwrap();

        // Awaited one at a time, so latency scales with the request count
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_mock_update_and_delete() {
        let backend = MockBackend::new();
        backend
            .insert(Table::Bookings, json!({ "id": "b1", "status": "pending" }))
            .await
            .unwrap();

        let updated = backend
            .update(Table::Bookings, "b1", json!({ "status": "confirmed" }))
            .await
            .unwrap();
        assert_eq!(updated["status"], "confirmed");

        backend.delete(Table::Bookings, "b1").await.unwrap();
        assert!(backend.rows_in(Table::Bookings).is_empty());

        let missing = backend
            .update(Table::Bookings, "b1", json!({ "status": "cancelled" }))
            .await;
        assert!(matches!(
            missing,
            Err(ApiError::Response { status_code: 404, .. })
        ));
    }
}
