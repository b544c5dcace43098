//! The opaque-object-stream (PICKLE) file-format writer.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::thread;

use measureflow_protocol::defaults::{PICKLE_EXTENSION, WRITE_ROW_ARTIFICIAL_SLEEP};
use measureflow_protocol::Row;

use crate::error::{SinkError, SinkResult};
use crate::path_util::with_extension;

/// Writes each row as one Python-pickle-compatible object, concatenated
/// back to back. No header; column names are not tracked.
pub struct PickleWriter {
    file: Option<File>,
}

impl PickleWriter {
    pub fn new() -> Self {
        Self { file: None }
    }

    /// Closes the previous handle (if any) and opens `<base>.pkl` for
    /// binary append.
    pub fn start_new_file(&mut self, base: &Path) -> SinkResult<()> {
        self.file = None;
        let path = with_extension(base, PICKLE_EXTENSION);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                anyhow::Error::from(err).context(format!("opening {}", path.display()))
            })?;
        self.file = Some(file);
        Ok(())
    }

    /// No-op: the PICKLE format carries no header and does not reorder
    /// columns.
    pub fn set_column_names(&mut self, _columns: Vec<String>) {}

    /// No-op.
    pub fn write_header(&mut self) -> SinkResult<()> {
        Ok(())
    }

    pub fn write_row(&mut self, row: &Row) -> SinkResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SinkError::message("pickle writer has no open file"))?;
        serde_pickle::to_writer(file, row, serde_pickle::SerOptions::new())
            .map_err(|err| anyhow::Error::from(err).context("serializing pickle row"))?;
        thread::sleep(WRITE_ROW_ARTIFICIAL_SLEEP);
        Ok(())
    }
}

impl Default for PickleWriter {
    fn default() -> Self {
        Self::new()
    }
}
