//! HTTP client for the remote spreadsheet store (Sheets v4 API shape).
//!
//! Idempotent calls (bulk reads, absolute row writes, metadata) retry
//! internally on transient failures. Appends and row deletes are
//! single-shot: retrying an append can duplicate a key and retrying a
//! delete hits a shifted index, so those outcomes stay with the caller.

use crate::error::{Result, StoreError};
use crate::infra::config::StoreConfig;
use crate::storage::table::{Row, TableStore};
use async_trait::async_trait;
use rand::Rng;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_RETRIES: u32 = 3;

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Row>,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

/// Client for one spreadsheet document. Constructed explicitly via
/// [`SheetsClient::connect`]; there is no lazily initialized global.
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    api_token: String,
}

impl SheetsClient {
    /// Builds the client and probes the spreadsheet once, so bad
    /// credentials or a missing document fail at startup instead of on
    /// the first request.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::configuration(format!("http client build failed: {}", e)))?;
        let client = Self {
            http,
            base_url: config.base_url.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            api_token: config.api_token.clone(),
        };
        let meta = client
            .with_retry("connect probe", || client.fetch_metadata())
            .await?;
        info!(
            spreadsheet_id = %client.spreadsheet_id,
            tabs = meta.sheets.len(),
            "connected to spreadsheet store"
        );
        Ok(client)
    }

    /// Releases the client. Outstanding requests finish on their own;
    /// the connection pool is dropped with `self`.
    pub fn close(self) {
        debug!(spreadsheet_id = %self.spreadsheet_id, "spreadsheet store client closed");
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        )
    }

    async fn with_retry<T, F, Fut>(&self, op_name: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if retries < MAX_RETRIES && e.is_transient() => {
                    retries += 1;
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        op_name,
                        retries,
                        MAX_RETRIES + 1,
                        e
                    );
                    let jitter = rand::thread_rng().gen_range(0..50);
                    tokio::time::sleep(Duration::from_millis(100 * retries as u64 + jitter)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_values(&self, range: &str) -> Result<Vec<Row>> {
        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response, range).await?;
        let body: ValuesResponse = response
            .json()
            .await
            .map_err(|e| StoreError::decode(format!("values response for {}: {}", range, e)))?;
        Ok(body.values)
    }

    async fn fetch_metadata(&self) -> Result<SpreadsheetMeta> {
        let url = format!("{}/v4/spreadsheets/{}", self.base_url, self.spreadsheet_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response, "spreadsheet metadata").await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::decode(format!("spreadsheet metadata: {}", e)))
    }

    /// Numeric sheet id of a tab, needed only for structural deletes.
    async fn sheet_id_for(&self, table: &str) -> Result<i64> {
        let meta = self
            .with_retry("sheet metadata", || self.fetch_metadata())
            .await?;
        meta.sheets
            .iter()
            .find(|s| s.properties.title == table)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| StoreError::configuration(format!("sheet not found: {}", table)))
    }

    async fn put_row(&self, table: &str, row_index: u32, row: &Row) -> Result<()> {
        let range = format!("{}!A{}:ZZ{}", table, row_index, row_index);
        let response = self
            .http
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.api_token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(map_transport)?;
        check_status(response, &range).await?;
        Ok(())
    }
}

#[async_trait]
impl TableStore for SheetsClient {
    async fn append_row(&self, table: &str, row: Row) -> Result<()> {
        let url = format!("{}:append", self.values_url(table));
        let response = self
            .http
            .post(&url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(&self.api_token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(map_transport)?;
        check_status(response, table).await?;
        debug!(table, "row appended");
        Ok(())
    }

    async fn read_all(&self, table: &str) -> Result<Vec<Row>> {
        let range = format!("{}!A1:Z9999", table);
        self.with_retry("read_all", || self.fetch_values(&range))
            .await
    }

    async fn update_row(&self, table: &str, row_index: u32, row: Row) -> Result<()> {
        self.with_retry("update_row", || self.put_row(table, row_index, &row))
            .await?;
        debug!(table, row_index, "row overwritten");
        Ok(())
    }

    async fn delete_row(&self, table: &str, row_index: u32) -> Result<()> {
        // deleteDimension ranges are 0-based; row 0 has no representation.
        let start_index = row_index.checked_sub(1).ok_or_else(|| {
            StoreError::invalid_request(format!(
                "row {} out of range for table {}",
                row_index, table
            ))
        })?;
        let sheet_id = self.sheet_id_for(table).await?;
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start_index,
                        "endIndex": row_index
                    }
                }
            }]
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;
        check_status(response, table).await?;
        debug!(table, row_index, "row deleted");
        Ok(())
    }
}

fn map_transport(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::transient(format!("request timed out: {}", err))
    } else if err.is_connect() {
        StoreError::transient(format!("connection failed: {}", err))
    } else {
        StoreError::transient(err.to_string())
    }
}

async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, context, &body))
}

/// 4xx that signal a broken deployment (bad range, missing document) are
/// fatal; auth hiccups, throttling and 5xx are worth retrying.
fn classify_status(status: StatusCode, context: &str, body: &str) -> StoreError {
    let detail = if body.is_empty() {
        format!("{}: HTTP {}", context, status)
    } else {
        format!("{}: HTTP {}: {}", context, status, truncate(body, 200))
    };
    match status {
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => StoreError::configuration(detail),
        _ => StoreError::transient(detail),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_is_fatal() {
        let err = classify_status(StatusCode::BAD_REQUEST, "Orders!A1:Z9999", "bad range");
        assert!(matches!(err, StoreError::Configuration(_)));
        let err = classify_status(StatusCode::NOT_FOUND, "spreadsheet metadata", "");
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn test_auth_and_server_failures_are_transient() {
        for code in [401u16, 403, 429, 500, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = classify_status(status, "Orders", "upstream unhappy");
            assert!(err.is_transient(), "HTTP {} should be transient", code);
        }
    }

    #[test]
    fn test_error_detail_is_truncated() {
        let long_body = "x".repeat(500);
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "Orders", &long_body);
        assert!(err.to_string().len() < 300);
    }

    #[tokio::test]
    async fn test_delete_row_zero_rejected_before_any_request() {
        // Nothing listens on the base_url; the range check must fire first.
        let client = SheetsClient {
            http: reqwest::Client::new(),
            base_url: "http://127.0.0.1:1".to_string(),
            spreadsheet_id: "unused".to_string(),
            api_token: "unused".to_string(),
        };
        let err = client.delete_row("Orders", 0).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }
}
