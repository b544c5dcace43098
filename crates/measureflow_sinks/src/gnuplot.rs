//! The tabular-text (GNUPLOT) file-format writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread;

use measureflow_protocol::defaults::{GNUPLOT_EXTENSION, WRITE_ROW_ARTIFICIAL_SLEEP};
use measureflow_protocol::Row;

use crate::error::{SinkError, SinkResult};
use crate::path_util::with_extension;

/// Writes rows as whitespace-separated columns, one header line followed by
/// one data line per row. Column order is fixed by whatever the caller
/// passes to [`GnuplotWriter::set_column_names`] — the canonicalization
/// itself lives on [`Row`], not here.
pub struct GnuplotWriter {
    file: Option<BufWriter<File>>,
    column_names: Vec<String>,
}

impl GnuplotWriter {
    pub fn new() -> Self {
        Self {
            file: None,
            column_names: Vec::new(),
        }
    }

    /// Closes the previous handle (if any) and opens `<base>.dat` for
    /// append. Never truncates.
    pub fn start_new_file(&mut self, base: &Path) -> SinkResult<()> {
        self.file = None;
        let path = with_extension(base, GNUPLOT_EXTENSION);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                anyhow::Error::from(err).context(format!("opening {}", path.display()))
            })?;
        self.file = Some(BufWriter::new(file));
        Ok(())
    }

    pub fn set_column_names(&mut self, columns: Vec<String>) {
        self.column_names = columns;
    }

    pub fn write_header(&mut self) -> SinkResult<()> {
        let file = self.open_file()?;
        writeln!(file, "{}", self.column_names.join(" "))
            .map_err(|err| anyhow::Error::from(err).context("writing gnuplot header"))?;
        file.flush()
            .map_err(|err| anyhow::Error::from(err).context("flushing gnuplot header"))?;
        Ok(())
    }

    pub fn write_row(&mut self, row: &Row) -> SinkResult<()> {
        let canonical = row.canonicalize(&self.column_names);
        let line = canonical
            .pairs()
            .iter()
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let file = self.open_file()?;
        writeln!(file, "{line}")
            .map_err(|err| anyhow::Error::from(err).context("writing gnuplot row"))?;
        file.flush()
            .map_err(|err| anyhow::Error::from(err).context("flushing gnuplot row"))?;
        thread::sleep(WRITE_ROW_ARTIFICIAL_SLEEP);
        Ok(())
    }

    fn open_file(&mut self) -> SinkResult<&mut BufWriter<File>> {
        self.file
            .as_mut()
            .ok_or_else(|| SinkError::message("gnuplot writer has no open file"))
    }
}

impl Default for GnuplotWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use measureflow_protocol::RowValue;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn header_then_rows_match_spec_example_exactly() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("run-1");
        let mut writer = GnuplotWriter::new();
        writer.start_new_file(&base).unwrap();
        writer.set_column_names(vec!["param".into()]);
        writer.write_header().unwrap();
        for v in [0, 1, 5, 6, 8] {
            writer
                .write_row(&Row::new(vec![("param".into(), RowValue::Int(v))]))
                .unwrap();
        }
        drop(writer);
        let contents = fs::read_to_string(with_extension(&base, ".dat")).unwrap();
        assert_eq!(contents, "param\n0\n1\n5\n6\n8\n");
    }

    #[test]
    fn rows_are_canonicalized_to_first_rows_column_order() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("run-2");
        let mut writer = GnuplotWriter::new();
        writer.start_new_file(&base).unwrap();
        writer.set_column_names(vec!["a".into(), "b".into(), "c".into()]);
        writer.write_header().unwrap();
        writer
            .write_row(&Row::new(vec![
                ("a".into(), RowValue::Int(1)),
                ("b".into(), RowValue::Int(2)),
                ("c".into(), RowValue::Int(3)),
            ]))
            .unwrap();
        writer
            .write_row(&Row::new(vec![
                ("c".into(), RowValue::Int(30)),
                ("a".into(), RowValue::Int(10)),
                ("b".into(), RowValue::Int(20)),
            ]))
            .unwrap();
        drop(writer);
        let contents = fs::read_to_string(with_extension(&base, ".dat")).unwrap();
        assert_eq!(contents, "a b c\n1 2 3\n10 20 30\n");
    }

    #[test]
    fn start_new_file_never_truncates_an_existing_file() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("run-3");
        let path = with_extension(&base, ".dat");
        fs::write(&path, "param\n0\n").unwrap();

        let mut writer = GnuplotWriter::new();
        writer.start_new_file(&base).unwrap();
        writer.set_column_names(vec!["param".into()]);
        writer
            .write_row(&Row::new(vec![("param".into(), RowValue::Int(1))]))
            .unwrap();
        drop(writer);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "param\n0\n1\n");
    }
}
