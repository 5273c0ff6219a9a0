//! In-memory workbook model and its persistence.
//!
//! - [`Workbook`] / [`Sheet`]: the document edited during a run
//! - [`engine`]: the [`SpreadsheetEngine`] seam that loads and saves workbooks
//! - [`writer`]: the [`SpreadsheetWriter`] open/write/save lifecycle
//! - [`cell_ref`]: A1 reference helpers

pub mod cell_ref;
pub mod engine;
mod styles;
pub mod writer;

use std::collections::BTreeMap;

use crate::error::{ConvertError, ConvertResult};
use crate::types::CellValue;

pub use engine::{SpreadsheetEngine, XlsxEngine};
pub use writer::SpreadsheetWriter;

/// Name of the placeholder sheet a fresh workbook starts with.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Longest sheet name Excel accepts.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A named grid of cells. Coordinates are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    // Keyed by (row, col) so iteration is row-major.
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, col: u32, row: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Store `value` at (`col`, `row`), replacing any previous value.
    pub fn set(&mut self, col: u32, row: u32, value: CellValue) -> ConvertResult<()> {
        if !cell_ref::in_bounds(col, row) {
            return Err(ConvertError::Write(format!(
                "cell (col {col}, row {row}) is outside the worksheet on sheet '{}'",
                self.name
            )));
        }
        self.cells.insert((row, col), value);
        Ok(())
    }

    /// Iterate `(col, row, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(row, col), v)| (col, row, v))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// A spreadsheet document: an ordered list of uniquely named sheets.
///
/// Sheet names are compared case-insensitively, as spreadsheet applications do.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// An empty workbook with no sheets.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.position(name).map(|i| &self.sheets[i])
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.position(name).map(move |i| &mut self.sheets[i])
    }

    /// Returns the sheet called `name`, appending an empty one if it does not exist yet.
    pub fn create_sheet(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.position(name) {
            Some(i) => i,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[idx]
    }

    /// Remove a sheet. Returns `false` if it did not exist.
    pub fn delete_sheet(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.sheets.remove(i);
                true
            }
            None => false,
        }
    }

    /// Store `value` in an existing sheet.
    pub fn set_cell(&mut self, sheet: &str, col: u32, row: u32, value: CellValue) -> ConvertResult<()> {
        self.sheet_mut(sheet)
            .ok_or_else(|| ConvertError::Write(format!("sheet '{sheet}' does not exist")))?
            .set(col, row, value)
    }

    /// Store text at an A1 reference.
    pub fn set_cell_text(&mut self, sheet: &str, cell: &str, text: impl Into<String>) -> ConvertResult<()> {
        let (col, row) = parse_cell(cell)?;
        self.set_cell(sheet, col, row, CellValue::Text(text.into()))
    }

    /// Store a number at an A1 reference, optionally displayed with fixed precision.
    pub fn set_cell_number(
        &mut self,
        sheet: &str,
        cell: &str,
        value: f64,
        decimal_places: Option<u32>,
    ) -> ConvertResult<()> {
        let (col, row) = parse_cell(cell)?;
        self.set_cell(sheet, col, row, CellValue::number(value, decimal_places))
    }

    fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.sheets.iter().position(|s| s.name.to_lowercase() == wanted)
    }
}

fn parse_cell(cell: &str) -> ConvertResult<(u32, u32)> {
    cell_ref::cell_coordinates(cell)
        .ok_or_else(|| ConvertError::Write(format!("invalid cell reference '{cell}'")))
}

/// Validate a sheet name and truncate it to [`MAX_SHEET_NAME_CHARS`] characters.
pub fn sanitize_sheet_name(name: &str) -> ConvertResult<String> {
    let truncated: String = name.chars().take(MAX_SHEET_NAME_CHARS).collect();
    let reason = if truncated.is_empty() {
        Some("must not be empty")
    } else if truncated.contains(INVALID_SHEET_CHARS) {
        Some("must not contain any of []:*?/\\")
    } else if truncated.starts_with('\'') || truncated.ends_with('\'') {
        Some("must not start or end with an apostrophe")
    } else if truncated.eq_ignore_ascii_case("history") {
        Some("'History' is reserved")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ConvertError::Write(format!("invalid sheet name '{name}': {reason}"))),
        None => Ok(truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::{Workbook, sanitize_sheet_name};
    use crate::error::ConvertError;
    use crate::types::CellValue;

    #[test]
    fn create_sheet_is_idempotent_and_case_insensitive() {
        let mut wb = Workbook::new();
        wb.create_sheet("data.csv").set(1, 1, CellValue::Text("x".into())).unwrap();
        wb.create_sheet("DATA.csv");
        assert_eq!(wb.sheet_names(), vec!["data.csv"]);
        assert_eq!(
            wb.sheet("data.CSV").unwrap().cell(1, 1),
            Some(&CellValue::Text("x".into()))
        );
    }

    #[test]
    fn cells_by_reference() {
        let mut wb = Workbook::new();
        wb.create_sheet("s");
        wb.set_cell_text("s", "B2", "hi").unwrap();
        wb.set_cell_number("s", "a1", 1.5, Some(1)).unwrap();

        let sheet = wb.sheet("s").unwrap();
        let cells: Vec<_> = sheet.cells().map(|(c, r, v)| (c, r, v.display())).collect();
        assert_eq!(cells, vec![(1, 1, "1.5".to_string()), (2, 2, "hi".to_string())]);

        assert!(matches!(wb.set_cell_text("s", "??", "x"), Err(ConvertError::Write(_))));
        assert!(matches!(wb.set_cell_text("missing", "A1", "x"), Err(ConvertError::Write(_))));
    }

    #[test]
    fn out_of_grid_cells_are_rejected() {
        let mut wb = Workbook::new();
        let sheet = wb.create_sheet("s");
        assert!(sheet.set(0, 1, CellValue::Text("x".into())).is_err());
        assert!(sheet.set(1, 1_048_577, CellValue::Text("x".into())).is_err());
        assert!(sheet.is_empty());
    }

    #[test]
    fn delete_sheet() {
        let mut wb = Workbook::new();
        wb.create_sheet("Sheet1");
        wb.create_sheet("b");
        assert!(wb.delete_sheet("sheet1"));
        assert!(!wb.delete_sheet("sheet1"));
        assert_eq!(wb.sheet_names(), vec!["b"]);
    }

    #[test]
    fn sheet_names_are_validated_and_truncated() {
        let long = "a_really_long_measurement_file_name.csv";
        assert_eq!(sanitize_sheet_name(long).unwrap(), "a_really_long_measurement_file_");
        assert_eq!(sanitize_sheet_name("ok.tsv").unwrap(), "ok.tsv");
        for bad in ["", "a[1].csv", "what?.txt", "'quoted'", "History"] {
            assert!(sanitize_sheet_name(bad).is_err(), "{bad:?}");
        }
    }
}
