//! Downloads the published workbook export over HTTPS.

use crate::source::{FetchWorkbook, SourceUnavailable};
use crate::Result;
use tracing::trace;

/// The published XLSX export of the grants workbook.
pub const WORKBOOK_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vS1zjfVFYsO5u8HTv-zF8XgbtgbywkFlLJ6UvFjRdZFnncHOlqWSR1be_ohfVxeUQ9gdDEtUciBMADb/pub?output=xlsx";

/// Fetches the workbook bytes with `reqwest`. Any failure, network or HTTP,
/// is reported as [`SourceUnavailable`] so the calling view can render an
/// inline error without taking down its siblings.
pub struct HttpFetch {
    client: reqwest::Client,
    url: String,
}

impl HttpFetch {
    pub fn new() -> Self {
        Self::with_url(WORKBOOK_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for HttpFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FetchWorkbook for HttpFetch {
    async fn fetch(&self) -> Result<Vec<u8>> {
        trace!("downloading workbook from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceUnavailable(format!(
                "workbook download returned HTTP {}",
                response.status()
            ))
            .into());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
