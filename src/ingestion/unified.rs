//! Unified conversion entrypoint.
//!
//! Most callers should use [`convert`] (or [`IngestionRequest::run`]), which:
//!
//! 1. validates the options and resolves the input encoding
//! 2. discovers the input files under [`IngestionRequest::root_path`]
//! 3. opens (or creates) the output workbook
//! 4. copies every file, in discovery order, into a sheet named after the file
//! 5. saves the workbook once, after every file succeeded
//!
//! Any error aborts the run before the workbook is saved, so a failed run never leaves a
//! partially written output behind. If an observer is configured, progress and the final
//! outcome are reported to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use encoding_rs::Encoding;

use crate::discovery::discover;
use crate::encoding;
use crate::error::{ConvertError, ConvertResult};
use crate::types::{CellOption, MAX_DECIMAL_PLACES};
use crate::workbook::SpreadsheetWriter;

use super::observability::{
    ConvertContext, ConvertObserver, ConvertSeverity, ConvertStats, SheetContext, SheetStats,
};
use super::source::{SourceFormat, TextSource};

/// Everything a conversion run needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionRequest {
    /// Input file, or directory to search.
    pub root_path: PathBuf,
    /// Lower-cased extensions (without dot) selected inside a directory.
    pub extensions: Vec<String>,
    /// How many directory levels below the root are searched.
    pub max_depth: usize,
    /// Precision applied to numeric cells, at most [`MAX_DECIMAL_PLACES`]; `None` keeps full
    /// precision.
    pub decimal_places: Option<u32>,
    /// Charset label of every input file.
    pub encoding_name: String,
    /// Workbook to create, or to update in place if it exists.
    pub output_path: PathBuf,
    /// Keep values like `"007"` as text.
    pub preserve_leading_zeros: bool,
}

impl Default for IngestionRequest {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            extensions: vec!["csv".to_string(), "tsv".to_string()],
            max_depth: 0,
            decimal_places: Some(2),
            encoding_name: "UTF-8".to_string(),
            output_path: PathBuf::from("output.xlsx"),
            preserve_leading_zeros: false,
        }
    }
}

impl IngestionRequest {
    /// A request with default settings for the given input and output.
    pub fn new(root_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    /// Cell options derived from this request.
    pub fn cell_option(&self) -> CellOption {
        CellOption {
            decimal_places: self.decimal_places,
            preserve_leading_zeros: self.preserve_leading_zeros,
        }
    }

    /// Reject option values no workbook can represent.
    pub fn validate(&self) -> ConvertResult<()> {
        match self.decimal_places {
            Some(dp) if dp > MAX_DECIMAL_PLACES => Err(ConvertError::InvalidOption(format!(
                "decimal places must be between 0 and {MAX_DECIMAL_PLACES}, got {dp}"
            ))),
            _ => Ok(()),
        }
    }

    /// Execute the request by calling [`convert`] with default options.
    pub fn run(&self) -> ConvertResult<ConvertSummary> {
        convert(self, &ConvertOptions::default())
    }
}

/// Options controlling how a run reports its progress.
#[derive(Clone)]
pub struct ConvertOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ConvertObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ConvertSeverity,
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: ConvertSeverity::Critical,
        }
    }
}

/// One input file and the sheet it was written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub sheet: String,
    pub source: PathBuf,
    pub format: SourceFormat,
    pub rows: usize,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub output: PathBuf,
    /// `true` if the workbook did not exist before the run.
    pub created: bool,
    /// Sheets in the order their files were processed.
    pub sheets: Vec<SheetSummary>,
}

impl ConvertSummary {
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows).sum()
    }
}

/// Convert the files selected by `request` into the `.xlsx` workbook at its output path.
///
/// # Examples
///
/// ```no_run
/// use csv2xlsx::ingestion::{convert, ConvertOptions, IngestionRequest};
///
/// # fn main() -> Result<(), csv2xlsx::ConvertError> {
/// let request = IngestionRequest {
///     extensions: vec!["csv".into(), "tsv".into()],
///     max_depth: 1,
///     decimal_places: Some(1),
///     ..IngestionRequest::new("data", "report.xlsx")
/// };
/// let summary = convert(&request, &ConvertOptions::default())?;
/// println!("sheets={} rows={}", summary.sheets.len(), summary.total_rows());
/// # Ok(())
/// # }
/// ```
pub fn convert(request: &IngestionRequest, options: &ConvertOptions) -> ConvertResult<ConvertSummary> {
    let mut writer = SpreadsheetWriter::new();
    convert_with_writer(request, &mut writer, options)
}

/// Same as [`convert`], but writes through a caller-supplied [`SpreadsheetWriter`] (for example
/// one built on a custom [`crate::workbook::SpreadsheetEngine`]).
///
/// The writer is closed before this function returns, on success and on failure.
pub fn convert_with_writer(
    request: &IngestionRequest,
    writer: &mut SpreadsheetWriter,
    options: &ConvertOptions,
) -> ConvertResult<ConvertSummary> {
    let observer = options.observer.as_deref();
    let result = run_pipeline(request, writer, observer);
    writer.close();

    if let Some(obs) = observer {
        let ctx = ConvertContext {
            root: request.root_path.clone(),
            output: request.output_path.clone(),
        };
        match &result {
            Ok(summary) => obs.on_success(
                &ctx,
                ConvertStats {
                    files: summary.sheets.len(),
                    rows: summary.total_rows(),
                    created: summary.created,
                },
            ),
            Err(e) => {
                let sev = ConvertSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn run_pipeline(
    request: &IngestionRequest,
    writer: &mut SpreadsheetWriter,
    observer: Option<&dyn ConvertObserver>,
) -> ConvertResult<ConvertSummary> {
    request.validate()?;
    let encoding = encoding::resolve(&request.encoding_name)?;
    let files = discover(&request.root_path, &request.extensions, request.max_depth)?;

    writer.open(&request.output_path)?;
    let created = writer.is_new().unwrap_or(false);
    let option = request.cell_option();

    let mut sheets = Vec::with_capacity(files.len());
    for file in &files {
        let summary = copy_into_sheet(file, encoding, writer, &option)?;
        if let Some(obs) = observer {
            obs.on_sheet_written(
                &SheetContext {
                    source: summary.source.clone(),
                    sheet: summary.sheet.clone(),
                    format: summary.format,
                },
                SheetStats { rows: summary.rows },
            );
        }
        sheets.push(summary);
    }

    writer.save()?;
    Ok(ConvertSummary {
        output: request.output_path.clone(),
        created,
        sheets,
    })
}

/// Stream every record of `path` into the sheet named after it: field `i` of record `n` goes
/// to column `i`, row `n` (both 1-based).
fn copy_into_sheet(
    path: &Path,
    encoding: &'static Encoding,
    writer: &mut SpreadsheetWriter,
    option: &CellOption,
) -> ConvertResult<SheetSummary> {
    let format = SourceFormat::from_path(path)?;
    let mut source = TextSource::open_as(path, format, encoding)?;
    let sheet = writer.new_sheet(&source.base_name())?;

    let mut row: u32 = 0;
    while let Some(record) = source.next_record()? {
        row = row.saturating_add(1);
        for (col, field) in (1u32..).zip(record.iter()) {
            writer.write_cell(field, &sheet, col, row, option)?;
        }
    }
    source.close();

    Ok(SheetSummary {
        sheet,
        source: path.to_path_buf(),
        format,
        rows: row as usize,
    })
}
