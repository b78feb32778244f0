//! Google-Sheets-style values API client
//!
//! The store id is the spreadsheet id; sheets are tabs inside it. Reads use
//! unformatted values so numbers and booleans keep their types.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{BackingStore, Row};
use crate::record::columns::column_letter;
use crate::record::RECORD_WIDTH;
use crate::types::{GatehouseError, Result};

/// Connection settings for [`SheetsStore`].
#[derive(Debug, Clone)]
pub struct SheetsStoreConfig {
    /// API root, e.g. `https://sheets.googleapis.com`
    pub base_url: String,
    /// OAuth bearer token
    pub access_token: Option<String>,
    /// Bound on every remote call
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

/// HTTP client for the values API
pub struct SheetsStore {
    client: Client,
    config: SheetsStoreConfig,
}

impl SheetsStore {
    pub fn new(config: SheetsStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatehouseError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn values_url(&self, store_id: &str, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(store_id),
            suffix
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// A1 range covering whole account rows `start_row..=end_row`.
pub fn row_range(sheet: &str, start_row: usize, end_row: usize) -> String {
    format!(
        "'{}'!A{}:{}{}",
        sheet.replace('\'', "''"),
        start_row,
        column_letter(RECORD_WIDTH - 1),
        end_row
    )
}

fn wire_row(row: &Row) -> Vec<serde_json::Value> {
    row.iter().map(|c| c.to_wire()).collect()
}

#[async_trait::async_trait]
impl BackingStore for SheetsStore {
    async fn fetch_rows(
        &self,
        store_id: &str,
        sheet: &str,
        start_row: usize,
        end_row: usize,
    ) -> Result<Vec<Row>> {
        let range = row_range(sheet, start_row, end_row);
        let url = self.values_url(store_id, &format!("/{}", urlencoding::encode(&range)));
        debug!(store_id, sheet, range = %range, "Fetching rows");

        let resp = self
            .authorize(self.client.get(&url))
            .query(&[("valueRenderOption", "UNFORMATTED_VALUE")])
            .send()
            .await
            .map_err(|e| GatehouseError::RemoteFetch(e.to_string()))?;

        let resp = resp
            .error_for_status()
            .map_err(|e| GatehouseError::RemoteFetch(e.to_string()))?;

        let body: ValueRange = resp
            .json()
            .await
            .map_err(|e| GatehouseError::RemoteFetch(format!("Invalid values payload: {}", e)))?;

        Ok(body.values)
    }

    async fn batch_update_rows(
        &self,
        store_id: &str,
        sheet: &str,
        rows: &BTreeMap<usize, Row>,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let data: Vec<serde_json::Value> = rows
            .iter()
            .map(|(n, row)| {
                json!({
                    "range": row_range(sheet, *n, *n),
                    "majorDimension": "ROWS",
                    "values": [wire_row(row)],
                })
            })
            .collect();

        let body = json!({ "valueInputOption": "RAW", "data": data });
        let url = self.values_url(store_id, ":batchUpdate");

        self.authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GatehouseError::RemoteWrite(e.to_string()))?;

        Ok(())
    }

    async fn append_rows(&self, store_id: &str, sheet: &str, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let range = row_range(sheet, 1, 1);
        let url = self.values_url(
            store_id,
            &format!("/{}:append", urlencoding::encode(&range)),
        );
        let values: Vec<Vec<serde_json::Value>> = rows.iter().map(wire_row).collect();

        self.authorize(self.client.post(&url))
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": values }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GatehouseError::RemoteWrite(e.to_string()))?;

        Ok(())
    }
}
