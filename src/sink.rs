use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::ScalperError;

/// Streams rows into a CSV file as they arrive. Each row is flushed so an
/// interrupted run still leaves a readable file with a proper header and
/// every row written so far.
pub struct RecordSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    header_written: bool,
    wrote_rows: bool,
}

impl RecordSink {
    /// Create (or truncate) the file at `path`, creating parent directories
    /// as needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ScalperError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&path)?;
        Ok(RecordSink {
            writer: csv::WriterBuilder::new().from_writer(file),
            path,
            header_written: false,
            wrote_rows: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the column header. Exactly once, before any data row.
    pub fn write_header(&mut self, columns: &[&str]) -> Result<(), ScalperError> {
        assert!(
            !self.header_written && !self.wrote_rows,
            "header must be written exactly once, before any row"
        );
        self.writer.write_record(columns)?;
        self.writer.flush()?;
        self.header_written = true;
        Ok(())
    }

    /// Append one data row and flush it. Row counting is the caller's job.
    pub fn write_row<I, S>(&mut self, values: I) -> Result<(), ScalperError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.writer.write_record(values)?;
        self.writer.flush()?;
        self.wrote_rows = true;
        Ok(())
    }

    /// Flush and close, making the file fully readable by other processes.
    pub fn finish(mut self) -> Result<PathBuf, ScalperError> {
        self.writer.flush()?;
        Ok(self.path)
    }
}
