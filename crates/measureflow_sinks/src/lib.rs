//! Pluggable file-format writers for the Writer sink.
//!
//! [`FileFormatWriter`] dispatches over a small, closed set of backends the
//! same way `RelationalSink`/`RelationalBackend` dispatch over relational
//! backends elsewhere in this codebase: a tagged enum matched in each
//! method, not a trait object. The set is closed by design (spec.md §4.8);
//! adding a format means adding a variant and a registry entry, not
//! inventing an extension point nobody needs yet.

mod error;
mod gnuplot;
mod path_util;
mod pickle;

pub use error::{SinkError, SinkResult};
pub use gnuplot::GnuplotWriter;
pub use pickle::PickleWriter;

use std::path::Path;

use measureflow_protocol::defaults::{DEFAULT_FORMAT, GNUPLOT_FORMAT, PICKLE_FORMAT};
use measureflow_protocol::Row;

/// The concrete writer behind a [`FileFormatWriter`].
pub enum FileWriterBackend {
    Gnuplot(GnuplotWriter),
    Pickle(PickleWriter),
}

/// A single output file handle for one run, polymorphic over the writer
/// capability set: `start_new_file`, `set_column_names`, `write_header`,
/// `write_row`.
///
/// Contract: `start_new_file → (set_column_names → write_header →
/// write_row*)*` may repeat; each `start_new_file` call releases the
/// previous file's resources before opening the next.
pub struct FileFormatWriter {
    backend: FileWriterBackend,
}

impl FileFormatWriter {
    pub fn new(backend: FileWriterBackend) -> Self {
        Self { backend }
    }

    /// Builds the writer registered under `format_name`. Returns
    /// [`SinkError`] if `format_name` is not a key in the Formats registry.
    pub fn for_format(format_name: &str) -> SinkResult<Self> {
        match format_name {
            GNUPLOT_FORMAT => Ok(Self::new(FileWriterBackend::Gnuplot(GnuplotWriter::new()))),
            PICKLE_FORMAT => Ok(Self::new(FileWriterBackend::Pickle(PickleWriter::new()))),
            other => Err(SinkError::message(format!(
                "unknown file format {other:?}; known formats are {GNUPLOT_FORMAT:?} and {PICKLE_FORMAT:?}"
            ))),
        }
    }

    pub fn start_new_file(&mut self, base: &Path) -> SinkResult<()> {
        match &mut self.backend {
            FileWriterBackend::Gnuplot(writer) => writer.start_new_file(base),
            FileWriterBackend::Pickle(writer) => writer.start_new_file(base),
        }
    }

    pub fn set_column_names(&mut self, columns: Vec<String>) {
        match &mut self.backend {
            FileWriterBackend::Gnuplot(writer) => writer.set_column_names(columns),
            FileWriterBackend::Pickle(writer) => writer.set_column_names(columns),
        }
    }

    pub fn write_header(&mut self) -> SinkResult<()> {
        match &mut self.backend {
            FileWriterBackend::Gnuplot(writer) => writer.write_header(),
            FileWriterBackend::Pickle(writer) => writer.write_header(),
        }
    }

    pub fn write_row(&mut self, row: &Row) -> SinkResult<()> {
        match &mut self.backend {
            FileWriterBackend::Gnuplot(writer) => writer.write_row(row),
            FileWriterBackend::Pickle(writer) => writer.write_row(row),
        }
    }
}

/// `true` if `format_name` is a key in the Formats registry.
pub fn is_known_format(format_name: &str) -> bool {
    matches!(format_name, GNUPLOT_FORMAT | PICKLE_FORMAT)
}

/// The first entry of the Formats registry, used when the caller does not
/// pick a format explicitly.
pub fn default_format() -> &'static str {
    DEFAULT_FORMAT
}
