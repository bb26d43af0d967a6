use std::time::Duration;

use dimsync_core::PublishedSheet;
use dimsync_logging::{dimsync_error, dimsync_info, dimsync_warn};

/// Failure reported by a [`SheetWriter`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SinkError {
    /// Worth retrying (rate limiting, server-side hiccups).
    pub transient: bool,
    pub message: String,
}

impl SinkError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            transient: false,
            message: message.into(),
        }
    }
}

/// Transport to a spreadsheet-like target.
#[async_trait::async_trait]
pub trait SheetWriter: Send + Sync {
    async fn clear(&self) -> Result<(), SinkError>;
    async fn update(&self, values: &[Vec<String>]) -> Result<(), SinkError>;
}

/// Destination of the published row set.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Replaces the target content with `sheet`. `false` means the write
    /// did not happen; the caller reports it and carries on.
    async fn save(&self, sheet: &PublishedSheet) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Clear-then-write with a bounded retry on transient failures.
pub struct RetryingSink<W> {
    writer: W,
    retry: RetrySettings,
}

impl<W: SheetWriter> RetryingSink<W> {
    pub fn new(writer: W, retry: RetrySettings) -> Self {
        Self { writer, retry }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    async fn write_once(&self, values: &[Vec<String>]) -> Result<(), SinkError> {
        dimsync_info!("Cleaning the worksheet...");
        self.writer.clear().await?;
        dimsync_info!("Saving {} rows...", values.len().saturating_sub(1));
        self.writer.update(values).await
    }
}

#[async_trait::async_trait]
impl<W: SheetWriter> Sink for RetryingSink<W> {
    async fn save(&self, sheet: &PublishedSheet) -> bool {
        let values = sheet.to_values();
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.write_once(&values).await {
                Ok(()) => {
                    dimsync_info!("Successfully saved the sheet.");
                    return true;
                }
                Err(err) if err.transient => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        dimsync_error!(
                            "Failed to save after {} attempts. Error: {}",
                            max_attempts,
                            err
                        );
                        return false;
                    }
                    dimsync_warn!(
                        "Attempt {} failed. Retrying in {:?}...",
                        attempt,
                        self.retry.delay
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(err) => {
                    dimsync_error!("Unexpected error while saving the sheet: {}", err);
                    return false;
                }
            }
        }
    }
}
