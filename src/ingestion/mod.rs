//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`convert`] (from [`unified`]) which:
//!
//! - discovers input files and picks a reader per file extension
//! - copies every record into a sheet of the output workbook
//! - optionally reports progress/failure/alerts to a [`ConvertObserver`]
//!
//! Format-specific readers are also available under:
//! - [`csv`]
//! - [`tsv`]
//! - [`txt`]

pub mod csv;
pub mod observability;
pub mod source;
pub mod tsv;
pub mod txt;
pub mod unified;

pub use observability::{
    CompositeObserver, ConvertContext, ConvertObserver, ConvertSeverity, ConvertStats, FileObserver,
    SheetContext, SheetStats, StdErrObserver,
};
pub use source::{SourceFormat, TextSource};
pub use unified::{
    ConvertOptions, ConvertSummary, IngestionRequest, SheetSummary, convert, convert_with_writer,
};
