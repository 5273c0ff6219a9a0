//! Character-encoding resolution and streaming transcoding to UTF-8.

use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding, REPLACEMENT};

use crate::error::{ConvertError, ConvertResult};

const INPUT_CHUNK: usize = 8 * 1024;
const OUTPUT_CHUNK: usize = 16 * 1024;

/// Look up an encoding by its charset label (`"UTF-8"`, `"Shift_JIS"`, `"windows-1252"`, ...).
///
/// Labels are matched case-insensitively. Labels that resolve to the `replacement` encoding
/// have no usable decoder and are rejected like unknown ones.
pub fn resolve(name: &str) -> ConvertResult<&'static Encoding> {
    match Encoding::for_label(name.trim().as_bytes()) {
        Some(enc) if enc != REPLACEMENT => Ok(enc),
        _ => Err(ConvertError::Encoding(name.to_string())),
    }
}

/// Adapts a raw byte stream in some encoding into a UTF-8 byte stream.
///
/// A byte order mark, if present, selects the decoder and is stripped. Malformed sequences are
/// replaced with U+FFFD.
pub struct DecodeReader<R> {
    inner: R,
    decoder: Decoder,
    input: Box<[u8]>,
    input_start: usize,
    input_end: usize,
    output: Box<[u8]>,
    output_start: usize,
    output_end: usize,
    eof: bool,
    finished: bool,
}

impl<R: Read> DecodeReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder(),
            input: vec![0; INPUT_CHUNK].into_boxed_slice(),
            input_start: 0,
            input_end: 0,
            output: vec![0; OUTPUT_CHUNK].into_boxed_slice(),
            output_start: 0,
            output_end: 0,
            eof: false,
            finished: false,
        }
    }

    fn fill_output(&mut self) -> io::Result<()> {
        while self.output_start == self.output_end && !self.finished {
            if self.input_start == self.input_end && !self.eof {
                let n = self.inner.read(&mut self.input)?;
                self.input_start = 0;
                self.input_end = n;
                self.eof = n == 0;
            }

            let (result, read, written, _) = self.decoder.decode_to_utf8(
                &self.input[self.input_start..self.input_end],
                &mut self.output,
                self.eof,
            );
            self.input_start += read;
            self.output_start = 0;
            self.output_end = written;

            if self.eof && result == CoderResult::InputEmpty {
                self.finished = true;
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for DecodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.fill_output()?;
        let available = &self.output[self.output_start..self.output_end];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.output_start += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::{DecodeReader, resolve};
    use crate::error::ConvertError;

    fn decode_all(bytes: &[u8], label: &str) -> String {
        let mut out = String::new();
        DecodeReader::new(bytes, resolve(label).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn resolves_labels_case_insensitively() {
        assert_eq!(resolve("UTF-8").unwrap().name(), "UTF-8");
        assert_eq!(resolve("utf8").unwrap().name(), "UTF-8");
        assert_eq!(resolve("shift_jis").unwrap().name(), "Shift_JIS");
        assert_eq!(resolve(" EUC-JP ").unwrap().name(), "EUC-JP");
    }

    #[test]
    fn rejects_unknown_and_replacement_labels() {
        assert!(matches!(resolve("xxx"), Err(ConvertError::Encoding(name)) if name == "xxx"));
        assert!(matches!(resolve("iso-2022-kr"), Err(ConvertError::Encoding(_))));
    }

    #[test]
    fn decodes_shift_jis() {
        // "日本,1\n" in Shift_JIS
        let bytes = [0x93, 0xfa, 0x96, 0x7b, b',', b'1', b'\n'];
        assert_eq!(decode_all(&bytes, "Shift_JIS"), "日本,1\n");
    }

    #[test]
    fn strips_utf8_bom() {
        assert_eq!(decode_all(b"\xEF\xBB\xBFa,b\n", "UTF-8"), "a,b\n");
    }

    #[test]
    fn decodes_across_small_reads() {
        let text = "é".repeat(20_000);
        let latin1: Vec<u8> = std::iter::repeat_n(0xe9u8, 20_000).collect();
        assert_eq!(decode_all(&latin1, "latin1"), text);
    }
}
