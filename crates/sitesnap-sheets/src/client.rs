// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin client for the Sheets `values.get` endpoint.

use serde::Deserialize;
use sitesnap_config::RangeConfig;
use sitesnap_core::SitesnapError;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// Response payload of `values.get`. Cells come back as JSON values;
/// trailing empty cells in a row are omitted entirely.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Check if an HTTP status code warrants a retry.
fn is_transient_error(status: u16) -> bool {
    matches!(status, 429 | 500 | 503)
}

/// API-key authenticated Sheets reader with bounded retries.
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl SheetsClient {
    /// Create a client against the production API.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SitesnapError> {
        Self::with_base_url(api_key, "https://sheets.googleapis.com")
    }

    /// Create a client against a custom base URL (used in tests and
    /// honored from `[sheets].base_url`).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SitesnapError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SitesnapError::Sheets {
                message: "failed to build HTTP client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_retries: MAX_RETRIES,
        })
    }

    /// Read one rectangular region as rows of trimmed-to-string cells.
    ///
    /// Rows shorter than the region are returned as-is; callers index
    /// defensively. Retries transient statuses up to the retry budget.
    pub async fn values(&self, range: &RangeConfig) -> Result<Vec<Vec<String>>, SitesnapError> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?key={}",
            self.base_url,
            range.spreadsheet_id,
            range.a1(),
            self.api_key
        );

        for attempt in 0..=self.max_retries {
            let response = self.http.get(&url).send().await.map_err(|e| {
                SitesnapError::Sheets {
                    message: format!("request failed for range {}", range.a1()),
                    source: Some(Box::new(e)),
                }
            })?;

            let status = response.status().as_u16();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(
                    status,
                    attempt = attempt + 1,
                    range = %range.a1(),
                    "transient sheets error, retrying"
                );
                tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                continue;
            }

            if !response.status().is_success() {
                return Err(SitesnapError::Sheets {
                    message: format!("sheets API returned {status} for range {}", range.a1()),
                    source: None,
                });
            }

            let payload: ValueRange =
                response.json().await.map_err(|e| SitesnapError::Sheets {
                    message: format!("malformed payload for range {}", range.a1()),
                    source: Some(Box::new(e)),
                })?;

            let rows: Vec<Vec<String>> = payload
                .values
                .into_iter()
                .map(|row| row.into_iter().map(cell_to_string).collect())
                .collect();
            debug!(range = %range.a1(), rows = rows.len(), "sheets range fetched");
            return Ok(rows);
        }

        Err(SitesnapError::Sheets {
            message: format!("retries exhausted for range {}", range.a1()),
            source: None,
        })
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn range() -> RangeConfig {
        RangeConfig {
            spreadsheet_id: "doc1".into(),
            sheet: "People".into(),
            start_column: "A".into(),
            end_column: "E".into(),
            start_row: 2,
            end_row: 500,
        }
    }

    #[tokio::test]
    async fn fetches_rows_with_string_coercion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/doc1/values/People!A2:E500"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "People!A2:E500",
                "values": [["p-1", "field_eng", "Jo", 42]]
            })))
            .mount(&server)
            .await;

        let client = SheetsClient::with_base_url("k", server.uri()).unwrap();
        let rows = client.values(&range()).await.unwrap();
        assert_eq!(rows, vec![vec!["p-1", "field_eng", "Jo", "42"]]);
    }

    #[tokio::test]
    async fn missing_values_field_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"range": "People!A2:E500"})),
            )
            .mount(&server)
            .await;

        let client = SheetsClient::with_base_url("k", server.uri()).unwrap();
        assert!(client.values(&range()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"values": [["x"]]})),
            )
            .mount(&server)
            .await;

        let client = SheetsClient::with_base_url("k", server.uri()).unwrap();
        let rows = client.values(&range()).await.unwrap();
        assert_eq!(rows[0][0], "x");
    }

    #[tokio::test]
    async fn non_transient_error_fails_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let client = SheetsClient::with_base_url("k", server.uri()).unwrap();
        let err = client.values(&range()).await.unwrap_err();
        assert!(matches!(err, SitesnapError::Sheets { .. }));
    }
}
