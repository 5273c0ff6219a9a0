//! Text source selection and lifecycle.
//!
//! Most callers should use [`TextSource::open`], which picks the reader from the file extension
//! and decodes the file with the requested encoding:
//!
//! - `.csv`: [`super::csv::CommaRecords`] (quoted fields)
//! - `.tsv`: [`super::tsv::TabRecords`] (plain tab split)
//! - `.txt`: [`super::txt::LineRecords`] (one field per line)

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::Serialize;

use crate::encoding::DecodeReader;
use crate::error::{ConvertError, ConvertResult};
use crate::types::Record;

use super::csv::CommaRecords;
use super::tsv::TabRecords;
use super::txt::LineRecords;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-separated values with quoting.
    Csv,
    /// Tab-separated values without quoting.
    Tsv,
    /// Plain text, one field per line.
    Txt,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Infer the source format of `path` from its extension.
    pub fn from_path(path: &Path) -> ConvertResult<Self> {
        let ext = path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_extension(&ext).ok_or_else(|| ConvertError::Format {
            path: path.to_path_buf(),
            extension: ext,
        })
    }
}

type Decoded = DecodeReader<File>;

enum Reader {
    Csv(CommaRecords<BufReader<Decoded>>),
    Tsv(TabRecords<Decoded>),
    Txt(LineRecords<BufReader<Decoded>>),
}

/// An open input file producing [`Record`]s in source order.
///
/// The underlying file handle is released by [`TextSource::close`] or when the source is
/// dropped, whichever comes first.
pub struct TextSource {
    path: PathBuf,
    format: SourceFormat,
    reader: Option<Reader>,
}

impl TextSource {
    /// Open `path`, selecting the reader from its extension.
    pub fn open(path: impl AsRef<Path>, encoding: &'static Encoding) -> ConvertResult<Self> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path)?;
        Self::open_as(path, format, encoding)
    }

    /// Open `path` with an explicit format, ignoring its extension.
    pub fn open_as(
        path: impl AsRef<Path>,
        format: SourceFormat,
        encoding: &'static Encoding,
    ) -> ConvertResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        let decoded = DecodeReader::new(file, encoding);
        let reader = match format {
            SourceFormat::Csv => Reader::Csv(CommaRecords::new(BufReader::new(decoded))),
            SourceFormat::Tsv => Reader::Tsv(TabRecords::new(decoded)),
            SourceFormat::Txt => Reader::Txt(LineRecords::new(BufReader::new(decoded))),
        };
        Ok(Self {
            path: path.to_path_buf(),
            format,
            reader: Some(reader),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// File name including its extension; used as the target sheet name.
    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Read the next record. `Ok(None)` marks the end of data, and is also returned once the
    /// source has been closed.
    pub fn next_record(&mut self) -> ConvertResult<Option<Record>> {
        let path = &self.path;
        let result = match self.reader.as_mut() {
            None => return Ok(None),
            Some(Reader::Csv(r)) => r.next_record(),
            Some(Reader::Tsv(r)) => r.next_record(),
            Some(Reader::Txt(r)) => r.next_record(),
        };
        result.map_err(|e| e.with_path(path))
    }

    /// Release the file handle. Calling this more than once is harmless.
    pub fn close(&mut self) {
        self.reader = None;
    }
}

impl Iterator for TextSource {
    type Item = ConvertResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
