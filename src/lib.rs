//! `csv2xlsx` copies delimited and plain-text files into an Excel workbook, one sheet per file.
//!
//! The primary entrypoint is [`ingestion::convert`] (or [`ingestion::IngestionRequest::run`]),
//! which searches an input file or directory, reads every match with the reader selected by
//! its extension, and writes the records into the output `.xlsx` workbook.
//!
//! ## Inputs
//!
//! **File formats (selected by extension, case-insensitive):**
//!
//! - **CSV**: `.csv`, comma separated, with double-quoted fields that may contain commas,
//!   line breaks and `""` escapes; every row has as many fields as the first
//! - **TSV**: `.tsv`, split on tabs only, no quoting
//! - **Text**: `.txt`, one single-column row per line
//!
//! Files can be in any encoding known to [`encoding_rs`] (`UTF-8`, `Shift_JIS`, `EUC-JP`,
//! `windows-1252`, ...); the same encoding is used for every file of a run.
//!
//! ## Output
//!
//! Each file becomes a sheet named after the file (`data.csv`). Every field that parses as a
//! finite decimal number becomes a numeric cell, rounded to the requested number of decimal
//! places; everything else is stored as text. If the output workbook already exists it is
//! updated in place, and sheets the run does not touch are kept.
//!
//! ## Quick example
//!
//! ```no_run
//! use csv2xlsx::ingestion::IngestionRequest;
//!
//! # fn main() -> Result<(), csv2xlsx::ConvertError> {
//! let request = IngestionRequest {
//!     decimal_places: Some(1),
//!     ..IngestionRequest::new("exports/", "report.xlsx")
//! };
//! let summary = request.run()?;
//! for sheet in &summary.sheets {
//!     println!("{} <- {} ({} rows)", sheet.sheet, sheet.source.display(), sheet.rows);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: the conversion pipeline, text sources and observers
//! - [`discovery`]: input file search
//! - [`encoding`]: charset resolution and transcoding
//! - [`workbook`]: in-memory workbook, `.xlsx` engine and writer lifecycle
//! - [`extract`]: reading cell ranges back out of a workbook
//! - [`types`]: records, cell values and cell options
//! - [`error`]: the error type shared by all of the above

pub mod discovery;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod ingestion;
pub mod types;
pub mod workbook;

pub use error::{ConvertError, ConvertResult};
