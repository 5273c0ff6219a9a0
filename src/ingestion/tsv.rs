//! Tab-separated source.
//!
//! Fields are split on the tab byte only. There is no quoting or escaping: a `"` is ordinary
//! text and a field can never contain a tab. Records end at `\n`; a `\r` right before it is
//! dropped, a `\r` anywhere else is ordinary text. Blank lines are skipped.

use std::io::Read;
use std::path::PathBuf;

use ::csv::{ErrorKind, ReaderBuilder, StringRecord, Terminator};

use crate::error::{ConvertError, ConvertResult};
use crate::types::Record;

/// Streaming reader of tab-delimited [`Record`]s.
pub struct TabRecords<R> {
    reader: ::csv::Reader<R>,
    record: StringRecord,
}

impl<R: Read> TabRecords<R> {
    pub fn new(reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .terminator(Terminator::Any(b'\n'))
            .quoting(false)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        Self {
            reader,
            record: StringRecord::new(),
        }
    }

    /// Line number of the most recently read record (1-based, 0 before the first read).
    pub fn line(&self) -> u64 {
        self.record.position().map(|p| p.line()).unwrap_or(0)
    }

    pub fn next_record(&mut self) -> ConvertResult<Option<Record>> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(true) => {
                    let mut fields: Record = self.record.iter().map(str::to_owned).collect();
                    if let Some(last) = fields.last_mut() {
                        if last.ends_with('\r') {
                            last.pop();
                        }
                    }
                    // A CRLF blank line.
                    if fields.len() == 1 && fields[0].is_empty() {
                        continue;
                    }
                    return Ok(Some(fields));
                }
                Ok(false) => return Ok(None),
                Err(err) => return Err(map_csv_error(err)),
            }
        }
    }
}

fn map_csv_error(err: ::csv::Error) -> ConvertError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let message = err.to_string();
    match err.into_kind() {
        ErrorKind::Io(source) => ConvertError::io(PathBuf::new(), source),
        _ => ConvertError::Parse {
            path: PathBuf::new(),
            line,
            message,
        },
    }
}
