//! Comma-separated source with quoted-field support.
//!
//! Fields may be wrapped in double quotes; quoted fields can contain commas, line breaks and
//! doubled quotes (`""` for a literal `"`). Unlike most lenient readers, malformed quoting is
//! reported instead of silently absorbed:
//!
//! - a quoted field still open at end of input is an error
//! - text between a closing quote and the next delimiter is an error
//! - a quote inside an unquoted field is an error
//! - every record must have as many fields as the first one
//!
//! Blank lines between records are skipped.

use std::io::BufRead;
use std::path::PathBuf;

use crate::error::{ConvertError, ConvertResult};
use crate::types::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Streaming reader of comma-delimited [`Record`]s.
pub struct CommaRecords<R> {
    reader: R,
    delimiter: char,
    line: u64,
    fields_per_record: Option<usize>,
}

impl<R: BufRead> CommaRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            delimiter: ',',
            line: 0,
            fields_per_record: None,
        }
    }

    /// Number of physical lines consumed so far.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn next_record(&mut self) -> ConvertResult<Option<Record>> {
        loop {
            let mut buf = String::new();
            if !self.read_line(&mut buf)? {
                return Ok(None);
            }
            if buf.trim_end_matches(['\r', '\n']).is_empty() {
                continue;
            }
            let start_line = self.line;
            let record = self.parse_record(buf)?;
            match self.fields_per_record {
                Some(expected) if expected != record.len() => {
                    return Err(self.error(
                        start_line,
                        format!(
                            "wrong number of fields: expected {expected}, found {}",
                            record.len()
                        ),
                    ));
                }
                Some(_) => {}
                None => self.fields_per_record = Some(record.len()),
            }
            return Ok(Some(record));
        }
    }

    fn read_line(&mut self, buf: &mut String) -> ConvertResult<bool> {
        let n = self
            .reader
            .read_line(buf)
            .map_err(|e| ConvertError::io(PathBuf::new(), e))?;
        if n > 0 {
            self.line += 1;
        }
        Ok(n > 0)
    }

    fn parse_record(&mut self, mut buf: String) -> ConvertResult<Record> {
        let start_line = self.line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut state = State::FieldStart;
        let mut pos = 0;

        loop {
            let Some(c) = buf[pos..].chars().next() else {
                if state == State::Quoted {
                    // The quoted field spans a line break; pull in the next physical line.
                    if !self.read_line(&mut buf)? {
                        return Err(self.error(
                            start_line,
                            "unterminated quoted field at end of input".to_string(),
                        ));
                    }
                    continue;
                }
                fields.push(field);
                return Ok(fields);
            };
            pos += c.len_utf8();
            let at_line_end = buf[pos..].starts_with('\n') || pos == buf.len();

            match state {
                State::FieldStart | State::Unquoted => match c {
                    '"' if state == State::FieldStart => state = State::Quoted,
                    '"' => {
                        return Err(self.error(
                            self.line,
                            "bare \" in non-quoted field".to_string(),
                        ));
                    }
                    '\n' => {
                        fields.push(field);
                        return Ok(fields);
                    }
                    '\r' if at_line_end => {}
                    c if c == self.delimiter => {
                        fields.push(std::mem::take(&mut field));
                        state = State::FieldStart;
                    }
                    c => {
                        field.push(c);
                        state = State::Unquoted;
                    }
                },
                State::Quoted => match c {
                    '"' => state = State::QuoteInQuoted,
                    '\r' if at_line_end => {}
                    c => field.push(c),
                },
                State::QuoteInQuoted => match c {
                    '"' => {
                        field.push('"');
                        state = State::Quoted;
                    }
                    '\n' => {
                        fields.push(field);
                        return Ok(fields);
                    }
                    '\r' if at_line_end => {}
                    c if c == self.delimiter => {
                        fields.push(std::mem::take(&mut field));
                        state = State::FieldStart;
                    }
                    c => {
                        return Err(self.error(
                            self.line,
                            format!("unexpected character {c:?} after closing quote"),
                        ));
                    }
                },
            }
        }
    }

    fn error(&self, line: u64, message: String) -> ConvertError {
        ConvertError::Parse {
            path: PathBuf::new(),
            line,
            message,
        }
    }
}
