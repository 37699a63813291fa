//! Source and sink boundaries: JSON-lines rows in, one text line per group out.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use tt_core::{RawRecord, TrendError, TrendResult};

/// A bounded, fully materialized source of raw rows.
pub trait RecordSource {
    fn read_all(&mut self) -> TrendResult<Vec<RawRecord>>;
}

/// Unsharded destination for formatted result lines.
pub trait LineSink {
    fn write_all(&mut self, lines: &[String]) -> TrendResult<()>;
}

impl RecordSource for Vec<RawRecord> {
    fn read_all(&mut self) -> TrendResult<Vec<RawRecord>> {
        Ok(std::mem::take(self))
    }
}

impl LineSink for Vec<String> {
    fn write_all(&mut self, lines: &[String]) -> TrendResult<()> {
        self.extend_from_slice(lines);
        Ok(())
    }
}

/// Reads `{"json": "...", "is_retweet": bool}` rows, one per line.
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonLinesSource {
    fn read_all(&mut self) -> TrendResult<Vec<RawRecord>> {
        let file = File::open(&self.path)
            .map_err(|e| TrendError::resource(format!("open {}", self.path.display()), e))?;
        let records = parse_rows(BufReader::new(file))?;
        info!(path = %self.path.display(), records = records.len(), "source read");
        Ok(records)
    }
}

pub fn parse_rows<R: BufRead>(reader: R) -> TrendResult<Vec<RawRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| TrendError::resource("read source", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RawRecord = serde_json::from_str(&line)
            .map_err(|e| TrendError::parse(format!("line {}: invalid row: {e}", idx + 1)))?;
        records.push(record);
    }
    Ok(records)
}

/// Writes every line into a temporary file beside the target and renames it into
/// place, so a failed run never leaves a partial output file.
pub struct TextFileSink {
    path: PathBuf,
}

impl TextFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSink for TextFileSink {
    fn write_all(&mut self, lines: &[String]) -> TrendResult<()> {
        let what = || format!("write {}", self.path.display());
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| TrendError::resource(what(), e))?;
        {
            let mut out = BufWriter::new(tmp.as_file());
            for line in lines {
                writeln!(out, "{line}").map_err(|e| TrendError::resource(what(), e))?;
            }
            out.flush().map_err(|e| TrendError::resource(what(), e))?;
        }
        tmp.persist(&self.path)
            .map_err(|e| TrendError::resource(what(), e.error))?;
        debug!(path = %self.path.display(), lines = lines.len(), "sink persisted");
        Ok(())
    }
}
