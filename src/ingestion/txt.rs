//! Plain-text source: every line is a record with a single field.

use std::io::BufRead;
use std::path::PathBuf;

use crate::error::{ConvertError, ConvertResult};
use crate::types::Record;

/// Reads one single-field [`Record`] per line.
///
/// The field is the full line without its `\n` / `\r\n` terminator. Empty lines are kept as a
/// record holding one empty field.
pub struct LineRecords<R> {
    reader: R,
    line: u64,
}

impl<R: BufRead> LineRecords<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn next_record(&mut self) -> ConvertResult<Option<Record>> {
        let mut buf = String::new();
        let n = self
            .reader
            .read_line(&mut buf)
            .map_err(|e| ConvertError::io(PathBuf::new(), e))?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(vec![strip_terminator(buf)]))
    }
}

fn strip_terminator(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::LineRecords;

    fn read_all(input: &str) -> Vec<Vec<String>> {
        let mut rdr = LineRecords::new(input.as_bytes());
        let mut out = Vec::new();
        while let Some(rec) = rdr.next_record().unwrap() {
            out.push(rec);
        }
        out
    }

    #[test]
    fn one_field_per_line_without_trimming() {
        let rows = read_all("  a, b\t\n\nlast \r\nno newline");
        assert_eq!(
            rows,
            vec![
                vec!["  a, b\t".to_string()],
                vec!["".to_string()],
                vec!["last ".to_string()],
                vec!["no newline".to_string()],
            ]
        );
    }

    #[test]
    fn empty_input_is_end_of_data() {
        let mut rdr = LineRecords::new("".as_bytes());
        assert_eq!(rdr.next_record().unwrap(), None);
        assert_eq!(rdr.next_record().unwrap(), None);
        assert_eq!(rdr.line(), 0);
    }
}
