//! Output sinks for the records a run produces.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::domain::Record;

/// Column headers of the exported table.
pub const RECORD_HEADERS: [&str; 3] = ["Date", "Company Name", "Position"];

/// Errors that can occur while persisting records.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Record store lock poisoned")]
    Poisoned,

    #[error("Failed to spawn blocking task: {0}")]
    TaskFailed(String),
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Destination for the records of one run.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persists `records`, replacing any previous output.
    async fn write(&self, records: &[Record]) -> Result<()>;
}

/// Writes records to a CSV file with a `Date,Company Name,Position` header.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_blocking(path: &Path, records: &[Record]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(RECORD_HEADERS)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn write(&self, records: &[Record]) -> Result<()> {
        let path = self.path.clone();
        let count = records.len();
        let records = records.to_vec();

        tokio::task::spawn_blocking(move || Self::write_blocking(&path, &records))
            .await
            .map_err(|e| SinkError::TaskFailed(e.to_string()))??;

        tracing::info!(path = %self.path.display(), count, "Wrote records");
        Ok(())
    }
}

/// Writes records to the first worksheet of an XLSX workbook, header row in
/// bold.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_blocking(path: &Path, records: &[Record]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let bold = Format::new().set_bold();

        for (col, header) in (0u16..).zip(RECORD_HEADERS) {
            sheet.write_string_with_format(0, col, header, &bold)?;
        }
        for (row, record) in (1u32..).zip(records) {
            sheet.write_string(row, 0, record.date.as_str())?;
            sheet.write_string(row, 1, record.company.as_str())?;
            sheet.write_string(row, 2, record.position.as_str())?;
        }

        workbook.save(path)?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for XlsxSink {
    async fn write(&self, records: &[Record]) -> Result<()> {
        let path = self.path.clone();
        let count = records.len();
        let records = records.to_vec();

        tokio::task::spawn_blocking(move || Self::write_blocking(&path, &records))
            .await
            .map_err(|e| SinkError::TaskFailed(e.to_string()))??;

        tracing::info!(path = %self.path.display(), count, "Wrote records");
        Ok(())
    }
}

/// Writes the same records to several sinks in order; stops at the first
/// failure.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl MultiSink {
    /// Creates a sink with no targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target.
    pub fn with(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl RecordSink for MultiSink {
    async fn write(&self, records: &[Record]) -> Result<()> {
        for sink in &self.sinks {
            sink.write(records).await?;
        }
        Ok(())
    }
}

/// Keeps records in memory; used by tests and library callers that want the
/// records without touching disk.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the last written records.
    pub fn records(&self) -> Result<Vec<Record>> {
        self.records
            .lock()
            .map(|r| r.clone())
            .map_err(|_| SinkError::Poisoned)
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&self, records: &[Record]) -> Result<()> {
        let mut stored = self.records.lock().map_err(|_| SinkError::Poisoned)?;
        *stored = records.to_vec();
        Ok(())
    }
}
