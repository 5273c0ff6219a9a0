//! Workbook persistence backends.
//!
//! The writer never touches the file format directly; it goes through a [`SpreadsheetEngine`].
//! [`XlsxEngine`] is the default: it reads existing `.xlsx` files with `calamine` and writes
//! them with `rust_xlsxwriter`. Number formats of an existing file are read from its styles
//! part so they survive a re-save.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Format;

use crate::error::{ConvertError, ConvertResult};
use crate::types::{CellValue, NumberFormat};

use super::styles::CellFormats;
use super::{DEFAULT_SHEET, Workbook};

/// Capability set used by [`super::SpreadsheetWriter`] to create, load and persist workbooks.
pub trait SpreadsheetEngine {
    /// A fresh workbook, including the placeholder sheet a new document starts with.
    fn new_workbook(&self) -> Workbook {
        let mut workbook = Workbook::new();
        workbook.create_sheet(DEFAULT_SHEET);
        workbook
    }

    /// Whether a workbook already exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        std::fs::metadata(path).is_ok()
    }

    /// Load the workbook stored at `path`.
    fn load_workbook(&self, path: &Path) -> ConvertResult<Workbook>;

    /// Write `workbook` to `path`, replacing any existing file.
    fn save_workbook(&self, workbook: &Workbook, path: &Path) -> ConvertResult<()>;
}

/// `.xlsx` engine backed by `calamine` (read) and `rust_xlsxwriter` (write).
///
/// Loading keeps cell values, formulas and number formats; other styling of a pre-existing
/// workbook is not carried over when it is saved again.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxEngine;

impl SpreadsheetEngine for XlsxEngine {
    fn load_workbook(&self, path: &Path) -> ConvertResult<Workbook> {
        let mut source = open_workbook_auto(path).map_err(|e| {
            ConvertError::Write(format!("unable to open workbook '{}': {e}", path.display()))
        })?;
        let number_formats = CellFormats::read(path)?;

        let mut workbook = Workbook::new();
        for name in source.sheet_names() {
            let range = source.worksheet_range(&name).map_err(|e| {
                ConvertError::Write(format!("unable to read sheet '{name}' of '{}': {e}", path.display()))
            })?;
            // Not every format exposes formulas; values alone are still a faithful copy.
            let formulas = source.worksheet_formula(&name).ok();

            let sheet = workbook.create_sheet(&name);
            if let Some((row0, col0)) = range.start() {
                for (r, c, data) in range.used_cells() {
                    let (col, row) = (col0 + c as u32 + 1, row0 + r as u32 + 1);
                    if let Some(mut value) = cell_from_data(data) {
                        if let CellValue::Number { format, .. } = &mut value {
                            if let Some(code) = number_formats.get(&name, col, row) {
                                *format = NumberFormat::from_code(code);
                            }
                        }
                        sheet.set(col, row, value)?;
                    }
                }
            }
            if let Some(formulas) = formulas {
                if let Some((row0, col0)) = formulas.start() {
                    for (r, c, formula) in formulas.used_cells() {
                        if !formula.is_empty() {
                            let value = CellValue::Formula(formula.trim_start_matches('=').to_string());
                            sheet.set(col0 + c as u32 + 1, row0 + r as u32 + 1, value)?;
                        }
                    }
                }
            }
        }
        Ok(workbook)
    }

    fn save_workbook(&self, workbook: &Workbook, path: &Path) -> ConvertResult<()> {
        let mut book = rust_xlsxwriter::Workbook::new();
        let mut formats: HashMap<String, Format> = HashMap::new();

        for sheet in workbook.sheets() {
            let ws = book.add_worksheet();
            ws.set_name(sheet.name())?;
            for (col, row, value) in sheet.cells() {
                // Excel has no empty string cells.
                if matches!(value, CellValue::Text(s) if s.is_empty()) {
                    continue;
                }
                let (r, c) = (row - 1, (col - 1) as u16);
                match value {
                    CellValue::Text(s) => ws.write_string(r, c, s),
                    CellValue::Number { value, format } => match format.code() {
                        Some(code) => {
                            let format = formats
                                .entry(code)
                                .or_insert_with_key(|code| Format::new().set_num_format(code));
                            ws.write_number_with_format(r, c, *value, format)
                        }
                        None => ws.write_number(r, c, *value),
                    },
                    CellValue::Bool(b) => ws.write_boolean(r, c, *b),
                    CellValue::Formula(f) => ws.write_formula(r, c, f.as_str()),
                }?;
            }
        }

        book.save(path).map_err(|e| {
            ConvertError::Write(format!("unable to save workbook '{}': {e}", path.display()))
        })
    }
}

fn cell_from_data(data: &Data) -> Option<CellValue> {
    let number = |value: f64| CellValue::number(value, None);
    match data {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(number(*f)),
        Data::Int(i) => Some(number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}
