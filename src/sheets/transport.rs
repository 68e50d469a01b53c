use crate::error::SheetsError;
use crate::sheets::parse::{cell_text, Grid};
use serde::Deserialize;
use std::time::Duration;

const READ_TIMEOUT_SECS: u64 = 30;

/// Reads one A1 range from the backing spreadsheet.
pub trait SheetsTransport: Send + Sync {
    fn read_range(&self, range: &str) -> Result<Grid, SheetsError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Decodes a Sheets `values.get` body. Absent `values` is an empty grid.
pub fn decode_value_range(range: &str, body: &str) -> Result<Grid, SheetsError> {
    let parsed: ValueRange = serde_json::from_str(body).map_err(|e| SheetsError::Decode {
        range: range.to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed
        .values
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

pub struct HttpSheetsTransport {
    agent: ureq::Agent,
    base_url: url::Url,
    spreadsheet_id: String,
    api_key: String,
}

impl HttpSheetsTransport {
    pub fn new(base_url: &str, spreadsheet_id: &str, api_key: &str) -> anyhow::Result<Self> {
        let base_url = url::Url::parse(base_url)?;
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(READ_TIMEOUT_SECS)))
            .http_status_as_error(false)
            .build();
        Ok(Self {
            agent: ureq::Agent::new_with_config(config),
            base_url,
            spreadsheet_id: spreadsheet_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn values_url(&self, range: &str) -> Result<url::Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::Transport {
                range: range.to_string(),
                message: format!("base URL cannot hold a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl SheetsTransport for HttpSheetsTransport {
    fn read_range(&self, range: &str) -> Result<Grid, SheetsError> {
        let url = self.values_url(range)?;
        let mut resp = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| SheetsError::Transport {
                range: range.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SheetsError::RemoteRead {
                range: range.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| SheetsError::Transport {
                range: range.to_string(),
                message: format!("failed to read body: {e}"),
            })?;
        decode_value_range(range, &body)
    }
}
