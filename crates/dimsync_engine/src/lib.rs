//! Dimsync engine: shop API client, snapshots, publishing and the pipeline
//! that ties them to `dimsync_core`.
mod fetch;
mod persist;
mod pipeline;
mod sheets;
mod sink;
mod snapshot;
mod types;

pub use fetch::{retry_after, CatalogSource, Credentials, FetchSettings, Page, ShopClient};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{ExportSummary, Pipeline, PipelineConfig, PipelineError, ProductSource};
pub use sheets::{CsvSheetWriter, GoogleSheetsWriter, GOOGLE_SHEETS_API};
pub use sink::{RetrySettings, RetryingSink, SheetWriter, Sink, SinkError};
pub use snapshot::{SnapshotError, SnapshotStore};
pub use types::{FailureKind, FetchCursor, FetchError, Resource};
