//! Record sources: the `RecordSource` trait and the Google Sheets backend.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::catalog::records::{News, Product};
use crate::config::CatalogConfig;

// ---------------------------------------------------------------------------
// CatalogError
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching catalog records.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No spreadsheet is configured; the catalog stays empty.
    #[error("GOOGLE_SHEETS_ID is not set")]
    NotConfigured,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The Sheets API answered with a non-success status.
    #[error("Sheets API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a `ValueRange`.
    #[error("failed to parse Sheets response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        CatalogError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// RecordSource trait
// ---------------------------------------------------------------------------

/// Where the catalog comes from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;
    async fn fetch_news(&self) -> Result<Vec<News>, CatalogError>;
}

// ---------------------------------------------------------------------------
// SheetsSource
// ---------------------------------------------------------------------------

/// `values.get` response body.  `values` is absent for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Reads rows from a Google spreadsheet through the Sheets API v4.
pub struct SheetsSource {
    client: reqwest::Client,
    config: CatalogConfig,
}

impl SheetsSource {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.base_url.trim_end_matches('/'),
            spreadsheet_id,
            range
        )
    }

    async fn fetch_rows(&self, range: &str) -> Result<Vec<Vec<String>>, CatalogError> {
        let spreadsheet_id = self
            .config
            .spreadsheet_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(CatalogError::NotConfigured)?;

        let mut req = self.client.get(self.values_url(spreadsheet_id, range));
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.query(&[("key", key)]);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_value_range(&body)
    }
}

/// Rows of a `values.get` JSON body.
pub fn parse_value_range(body: &str) -> Result<Vec<Vec<String>>, CatalogError> {
    let range: ValueRange =
        serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))?;
    Ok(range.values)
}

#[async_trait]
impl RecordSource for SheetsSource {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let rows = self.fetch_rows(&self.config.books_range).await?;
        Ok(rows.iter().map(|r| Product::from_row(r)).collect())
    }

    async fn fetch_news(&self) -> Result<Vec<News>, CatalogError> {
        let rows = self.fetch_rows(&self.config.news_range).await?;
        Ok(rows.iter().map(|r| News::from_row(r)).collect())
    }
}
