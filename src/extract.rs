//! Reading cell ranges back out of a workbook.
//!
//! [`write_range`] streams a range row by row and works for any range size; [`read_range`]
//! collects it and refuses ranges above [`MAX_COLLECTED_CELLS`].

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConvertError, ConvertResult};
use crate::workbook::cell_ref::{cell_coordinates, cell_name};
use crate::workbook::{Sheet, SpreadsheetEngine, XlsxEngine};

/// Largest number of cells [`read_range`] collects into a [`CellRange`].
pub const MAX_COLLECTED_CELLS: u64 = 1 << 20;

/// Output layout for [`render_range`] and [`write_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeFormat {
    /// One line per row, values joined by commas.
    #[default]
    Csv,
    /// One line per row, values joined by tabs.
    Tsv,
    /// One `A1: value` line per cell.
    List,
}

impl FromStr for RangeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "list" => Ok(Self::List),
            other => Err(format!("unknown output format '{other}' (expected csv, tsv or list)")),
        }
    }
}

/// Rectangular block of display strings starting at (`left`, `top`), 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub left: u32,
    pub top: u32,
    pub rows: Vec<Vec<String>>,
}

/// Parse `"B2"` or `"A1:C3"` into 1-based `(left, top, right, bottom)`.
///
/// Corners may be given in any order; the result is normalized.
pub fn parse_range(range: &str) -> ConvertResult<(u32, u32, u32, u32)> {
    let invalid = || ConvertError::InvalidRange(range.to_string());
    let mut parts = range.split(':');
    let first = parts.next().ok_or_else(invalid)?;
    let second = parts.next().unwrap_or(first);
    if parts.next().is_some() {
        return Err(invalid());
    }
    let (c1, r1) = cell_coordinates(first).ok_or_else(invalid)?;
    let (c2, r2) = cell_coordinates(second).ok_or_else(invalid)?;
    Ok((c1.min(c2), r1.min(r2), c1.max(c2), r1.max(r2)))
}

/// Rows of a rectangular block of a sheet, produced one at a time.
///
/// Yields the 1-based row number and the display strings of the row's cells; empty cells are
/// `""`.
pub struct RangeRows<'a> {
    sheet: &'a Sheet,
    left: u32,
    right: u32,
    next_row: u32,
    bottom: u32,
}

impl<'a> RangeRows<'a> {
    /// Rows of `sheet` inside the `(left, top, right, bottom)` bounds from [`parse_range`].
    pub fn new(sheet: &'a Sheet, (left, top, right, bottom): (u32, u32, u32, u32)) -> Self {
        Self {
            sheet,
            left,
            right,
            next_row: top,
            bottom,
        }
    }
}

impl Iterator for RangeRows<'_> {
    type Item = (u32, Vec<String>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row > self.bottom {
            return None;
        }
        let row = self.next_row;
        self.next_row += 1;
        let values = (self.left..=self.right)
            .map(|col| self.sheet.cell(col, row).map(|v| v.display()).unwrap_or_default())
            .collect();
        Some((row, values))
    }
}

/// Read `range` of `sheet` from the `.xlsx` workbook at `path`. Empty cells read as `""`.
///
/// Ranges of more than [`MAX_COLLECTED_CELLS`] cells are rejected; stream them with
/// [`write_range`] instead.
pub fn read_range(path: impl AsRef<Path>, sheet: &str, range: &str) -> ConvertResult<CellRange> {
    read_range_with_engine(&XlsxEngine, path.as_ref(), sheet, range)
}

pub fn read_range_with_engine(
    engine: &dyn SpreadsheetEngine,
    path: &Path,
    sheet: &str,
    range: &str,
) -> ConvertResult<CellRange> {
    let bounds = parse_range(range)?;
    let (left, top, right, bottom) = bounds;
    let cells = u64::from(right - left + 1) * u64::from(bottom - top + 1);
    if cells > MAX_COLLECTED_CELLS {
        return Err(ConvertError::InvalidOption(format!(
            "range '{range}' has {cells} cells, more than the {MAX_COLLECTED_CELLS} that can be read at once"
        )));
    }

    let workbook = engine.load_workbook(path)?;
    let sheet = workbook
        .sheet(sheet)
        .ok_or_else(|| ConvertError::SheetNotFound(sheet.to_string()))?;
    let rows = RangeRows::new(sheet, bounds).map(|(_, values)| values).collect();
    Ok(CellRange { left, top, rows })
}

/// Write `range` of `sheet` from the workbook at `path` to `out`, one row at a time.
pub fn write_range(
    path: impl AsRef<Path>,
    sheet: &str,
    range: &str,
    format: RangeFormat,
    out: &mut impl Write,
) -> ConvertResult<()> {
    let bounds = parse_range(range)?;
    let workbook = XlsxEngine.load_workbook(path.as_ref())?;
    let sheet = workbook
        .sheet(sheet)
        .ok_or_else(|| ConvertError::SheetNotFound(sheet.to_string()))?;

    let output_error = |e| ConvertError::io("<output>", e);
    for (row, values) in RangeRows::new(sheet, bounds) {
        render_row(out, format, bounds.0, row, &values).map_err(output_error)?;
    }
    out.flush().map_err(output_error)
}

/// Render a range as text, one line per row (or per cell for [`RangeFormat::List`]).
pub fn render_range(range: &CellRange, format: RangeFormat) -> String {
    let mut out = Vec::new();
    for (row, values) in (range.top..).zip(&range.rows) {
        // Writing into a Vec cannot fail.
        let _ = render_row(&mut out, format, range.left, row, values);
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn render_row(
    out: &mut impl Write,
    format: RangeFormat,
    left: u32,
    row: u32,
    values: &[String],
) -> std::io::Result<()> {
    match format {
        RangeFormat::Csv => writeln!(out, "{}", values.join(",")),
        RangeFormat::Tsv => writeln!(out, "{}", values.join("\t")),
        RangeFormat::List => {
            for (col, value) in (left..).zip(values) {
                let name = cell_name(col, row).unwrap_or_default();
                writeln!(out, "{name}: {value}")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellRange, RangeFormat, RangeRows, parse_range, render_range};
    use crate::error::ConvertError;
    use crate::types::CellValue;
    use crate::workbook::Sheet;

    #[test]
    fn parses_single_cells_and_ranges() {
        assert_eq!(parse_range("B2").unwrap(), (2, 2, 2, 2));
        assert_eq!(parse_range("A1:C3").unwrap(), (1, 1, 3, 3));
        assert_eq!(parse_range("C3:A1").unwrap(), (1, 1, 3, 3));
        for bad in ["", "A1:B2:C3", "A1:", "x"] {
            assert!(matches!(parse_range(bad), Err(ConvertError::InvalidRange(_))), "{bad:?}");
        }
    }

    #[test]
    fn renders_all_layouts() {
        let range = CellRange {
            left: 2,
            top: 3,
            rows: vec![
                vec!["1.0".to_string(), "x".to_string()],
                vec!["".to_string(), "y".to_string()],
            ],
        };
        assert_eq!(render_range(&range, RangeFormat::Csv), "1.0,x\n,y\n");
        assert_eq!(render_range(&range, RangeFormat::Tsv), "1.0\tx\n\ty\n");
        assert_eq!(
            render_range(&range, RangeFormat::List),
            "B3: 1.0\nC3: x\nB4: \nC4: y\n"
        );
    }

    #[test]
    fn range_rows_are_produced_lazily() {
        let mut sheet = Sheet::new("s");
        sheet.set(2, 2, CellValue::number(3.5, Some(2))).unwrap();
        sheet.set(1, 3, CellValue::Text("x".into())).unwrap();

        let mut rows = RangeRows::new(&sheet, parse_range("A1:B3").unwrap());
        assert_eq!(rows.next(), Some((1, vec![String::new(), String::new()])));
        assert_eq!(rows.next(), Some((2, vec![String::new(), "3.50".to_string()])));
        assert_eq!(rows.next(), Some((3, vec!["x".to_string(), String::new()])));
        assert_eq!(rows.next(), None);

        // The whole grid is never materialized.
        let mut all = RangeRows::new(&sheet, parse_range("A1:XFD1048576").unwrap());
        assert_eq!(all.nth(1).map(|(row, values)| (row, values.len())), Some((2, 16_384)));
    }

    #[test]
    fn format_names() {
        assert_eq!(RangeFormat::default(), RangeFormat::Csv);
        assert_eq!("CSV".parse::<RangeFormat>().unwrap(), RangeFormat::Csv);
        assert_eq!("list".parse::<RangeFormat>().unwrap(), RangeFormat::List);
        assert!("xml".parse::<RangeFormat>().is_err());
    }
}
