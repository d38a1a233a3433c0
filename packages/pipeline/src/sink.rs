//! Per-place output files.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use osm_sites_classify::Table;
use regex::Regex;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Errors writing a table.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination for one place's finished table.
pub trait TableSink: Send + Sync {
    /// Writes `table` for `place`, returning where it went.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the table cannot be written.
    fn write(&self, place: &str, table: &Table) -> Result<PathBuf, SinkError>;
}

/// Makes a place name safe to use as a file name.
///
/// Characters that are invalid on common filesystems become `_`, then
/// the name is trimmed and every whitespace run collapses to a single `_`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    WHITESPACE.replace_all(replaced.trim(), "_").into_owned()
}

/// Writes one CSV file per place into a directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    suffix: String,
}

impl CsvSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{sanitized place}_{suffix}.csv`.
    #[must_use]
    pub fn output_path(&self, place: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", sanitize(place), self.suffix))
    }
}

impl TableSink for CsvSink {
    fn write(&self, place: &str, table: &Table) -> Result<PathBuf, SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.output_path(place);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.cells().iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;

        Ok(path)
    }
}
