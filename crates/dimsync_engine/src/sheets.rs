use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::json;
use url::Url;

use crate::persist::AtomicFileWriter;
use crate::sink::{SheetWriter, SinkError};

pub const GOOGLE_SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Writes through the Google Sheets values API with a ready OAuth token.
#[derive(Debug, Clone)]
pub struct GoogleSheetsWriter {
    http: reqwest::Client,
    api_base: String,
    sheet_id: String,
    sheet_name: String,
    token: String,
}

impl GoogleSheetsWriter {
    pub fn new(
        sheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: GOOGLE_SHEETS_API.to_string(),
            sheet_id: sheet_id.into(),
            sheet_name: sheet_name.into(),
            token: token.into(),
        }
    }

    /// Points the writer at another API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn values_url(&self, range_suffix: &str) -> Result<Url, SinkError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| SinkError::fatal(e.to_string()))?;
        let range = format!("{}{range_suffix}", self.sheet_name);
        url.path_segments_mut()
            .map_err(|_| SinkError::fatal("api base cannot carry a path"))?
            .pop_if_empty()
            .extend([self.sheet_id.as_str(), "values", range.as_str()]);
        Ok(url)
    }

    async fn check(response: Result<reqwest::Response, reqwest::Error>) -> Result<(), SinkError> {
        let response = response.map_err(|err| {
            if err.is_timeout() || err.is_connect() {
                SinkError::transient(err.to_string())
            } else {
                SinkError::fatal(err.to_string())
            }
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let message = format!("sheets api returned {status}: {body}");
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(SinkError::transient(message))
        } else {
            Err(SinkError::fatal(message))
        }
    }
}

#[async_trait::async_trait]
impl SheetWriter for GoogleSheetsWriter {
    async fn clear(&self) -> Result<(), SinkError> {
        let url = self.values_url(":clear")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await;
        Self::check(response).await
    }

    async fn update(&self, values: &[Vec<String>]) -> Result<(), SinkError> {
        let url = self.values_url("!A1")?;
        let body = json!({
            "range": format!("{}!A1", self.sheet_name),
            "majorDimension": "ROWS",
            "values": values,
        });
        let response = self
            .http
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await;
        Self::check(response).await
    }
}

/// Keeps the published sheet as a local CSV file.
#[derive(Debug, Clone)]
pub struct CsvSheetWriter {
    path: PathBuf,
}

impl CsvSheetWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn split_path(&self) -> Result<(PathBuf, String), SinkError> {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SinkError::fatal(format!("not a file path: {:?}", self.path)))?;
        let dir = self
            .path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((dir, file_name.to_string()))
    }
}

#[async_trait::async_trait]
impl SheetWriter for CsvSheetWriter {
    async fn clear(&self) -> Result<(), SinkError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SinkError::fatal(err.to_string())),
        }
    }

    async fn update(&self, values: &[Vec<String>]) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in values {
            writer
                .write_record(row)
                .map_err(|e| SinkError::fatal(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SinkError::fatal(e.to_string()))?;
        let (dir, file_name) = self.split_path()?;
        AtomicFileWriter::new(dir)
            .write(&file_name, bytes)
            .map_err(|e| SinkError::fatal(e.to_string()))?;
        Ok(())
    }
}
