//! Per-resource CSV snapshots of raw catalog records.
//!
//! One file per resource, replaced on every write. Columns are the union of
//! top-level keys. Nested objects and lists are stored as JSON text and
//! parsed back on read; other cells come back as strings, and empty cells
//! are treated as absent keys. A string that itself starts with `{`, `[` or
//! `"` is stored as a quoted JSON string so it is not mistaken for one.

use std::path::{Path, PathBuf};

use dimsync_logging::{dimsync_info, dimsync_warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::Resource;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no snapshot for {0}; fetch it first")]
    Missing(Resource),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, resource: Resource) -> PathBuf {
        self.dir.join(file_name(resource))
    }

    /// Replaces the snapshot of `resource` with `records`.
    pub fn write(&self, resource: Resource, records: &[Value]) -> Result<PathBuf, SnapshotError> {
        let columns = collect_columns(records);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&columns)?;

        for record in records {
            let Some(map) = record.as_object() else {
                dimsync_warn!("Skipping non-object {} record in snapshot", resource);
                continue;
            };
            let row = columns.iter().map(|column| encode_cell(map.get(column)));
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| PersistError::Io(err.into_error()))?;
        let path = AtomicFileWriter::new(self.dir.clone()).write(&file_name(resource), bytes)?;
        dimsync_info!("Saved {} {} to {:?}", records.len(), resource, path);
        Ok(path)
    }

    pub fn read(&self, resource: Resource) -> Result<Vec<Value>, SnapshotError> {
        let path = self.path_for(resource);
        if !path.is_file() {
            return Err(SnapshotError::Missing(resource));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let map: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(column, cell)| (column.to_string(), decode_cell(cell)))
                .collect();
            records.push(Value::Object(map));
        }
        Ok(records)
    }
}

fn file_name(resource: Resource) -> String {
    format!("shoper_all_{}.csv", resource.path().replace('-', "_"))
}

fn collect_columns(records: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for map in records.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn encode_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if looks_encoded(s) => Value::String(s.clone()).to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(nested @ (Value::Object(_) | Value::Array(_))) => nested.to_string(),
        Some(scalar) => scalar.to_string(),
    }
}

fn looks_encoded(cell: &str) -> bool {
    cell.starts_with(['{', '[', '"'])
}

fn decode_cell(cell: &str) -> Value {
    if looks_encoded(cell) {
        if let Ok(value) = serde_json::from_str::<Value>(cell) {
            return value;
        }
    }
    Value::String(cell.to_string())
}
