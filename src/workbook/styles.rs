//! Per-cell number formats of an existing `.xlsx` package.
//!
//! calamine exposes cell values and formulas but not the number format a cell is styled with,
//! so the format codes are read from the package parts directly:
//!
//! - `xl/workbook.xml` + `xl/_rels/workbook.xml.rels`: sheet name -> worksheet part
//! - `xl/styles.xml`: style index (`s` attribute) -> format code
//! - `xl/worksheets/*.xml`: cell reference -> style index

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::error::{ConvertError, ConvertResult};

use super::cell_ref::cell_coordinates;

/// Format codes of every cell that is not `General`, keyed by sheet name and 1-based
/// `(col, row)`.
#[derive(Debug, Default)]
pub(crate) struct CellFormats {
    sheets: HashMap<String, HashMap<(u32, u32), String>>,
}

impl CellFormats {
    pub(crate) fn read(path: &Path) -> ConvertResult<Self> {
        let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        // Legacy `.xls` files are not zip packages; their cells load without formats.
        let Ok(mut archive) = ZipArchive::new(file) else {
            return Ok(Self::default());
        };

        let styles = match read_part(&mut archive, "xl/styles.xml", path)? {
            Some(xml) => parse_styles(&xml, path)?,
            None => return Ok(Self::default()),
        };
        let Some(workbook) = read_part(&mut archive, "xl/workbook.xml", path)? else {
            return Ok(Self::default());
        };
        let rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels", path)?
            .map(|xml| parse_relationships(&xml, path))
            .transpose()?
            .unwrap_or_default();

        let mut sheets = HashMap::new();
        for (name, rel_id) in parse_sheets(&workbook, path)? {
            let Some(part) = rels.get(&rel_id) else {
                continue;
            };
            let Some(xml) = read_part(&mut archive, part, path)? else {
                continue;
            };
            let cells = parse_cell_styles(&xml, &styles, path)?;
            if !cells.is_empty() {
                sheets.insert(name, cells);
            }
        }
        Ok(Self { sheets })
    }

    pub(crate) fn get(&self, sheet: &str, col: u32, row: u32) -> Option<&str> {
        self.sheets
            .get(sheet)
            .and_then(|cells| cells.get(&(col, row)))
            .map(String::as_str)
    }
}

fn package_error(path: &Path, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::Write(format!(
        "unable to read styles of workbook '{}': {err}",
        path.display()
    ))
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    path: &Path,
) -> ConvertResult<Option<Vec<u8>>> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(package_error(path, e)),
    };
    let mut xml = Vec::new();
    part.read_to_end(&mut xml)
        .map_err(|e| ConvertError::io(path, e))?;
    Ok(Some(xml))
}

fn attribute(e: &BytesStart<'_>, key: &[u8], path: &Path) -> ConvertResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| package_error(path, err))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| package_error(path, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Format code per `cellXfs` index; `None` for `General` and unknown built-in ids.
fn parse_styles(xml: &[u8], path: &Path) -> ConvertResult<Vec<Option<String>>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_ids: Vec<u32> = Vec::new();
    let mut in_num_fmts = false;
    let mut in_cell_xfs = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"numFmts" => in_num_fmts = true,
                b"cellXfs" => in_cell_xfs = true,
                b"numFmt" if in_num_fmts => insert_num_fmt(&e, &mut custom, path)?,
                b"xf" if in_cell_xfs => xf_ids.push(num_fmt_id(&e, path)?),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"numFmt" if in_num_fmts => insert_num_fmt(&e, &mut custom, path)?,
                b"xf" if in_cell_xfs => xf_ids.push(num_fmt_id(&e, path)?),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"numFmts" => in_num_fmts = false,
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(package_error(path, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(xf_ids
        .into_iter()
        .map(|id| match custom.get(&id) {
            Some(code) => Some(code.clone()),
            None => builtin_format(id).map(str::to_string),
        })
        .collect())
}

fn insert_num_fmt(
    e: &BytesStart<'_>,
    custom: &mut HashMap<u32, String>,
    path: &Path,
) -> ConvertResult<()> {
    let id = attribute(e, b"numFmtId", path)?.and_then(|v| v.parse().ok());
    let code = attribute(e, b"formatCode", path)?;
    if let (Some(id), Some(code)) = (id, code) {
        custom.insert(id, code);
    }
    Ok(())
}

fn num_fmt_id(e: &BytesStart<'_>, path: &Path) -> ConvertResult<u32> {
    Ok(attribute(e, b"numFmtId", path)?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

/// `(sheet name, relationship id)` in workbook order.
fn parse_sheets(xml: &[u8], path: &Path) -> ConvertResult<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"sheet" => {
                let name = attribute(&e, b"name", path)?;
                let rel_id = attribute(&e, b"r:id", path)?;
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(package_error(path, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Relationship id -> package part name (`xl/worksheets/sheet1.xml`).
fn parse_relationships(xml: &[u8], path: &Path) -> ConvertResult<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut rels = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Relationship" => {
                let id = attribute(&e, b"Id", path)?;
                let target = attribute(&e, b"Target", path)?;
                if let (Some(id), Some(target)) = (id, target) {
                    let part = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    };
                    rels.insert(id, part);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(package_error(path, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

fn parse_cell_styles(
    xml: &[u8],
    styles: &[Option<String>],
    path: &Path,
) -> ConvertResult<HashMap<(u32, u32), String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut cells = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"c" => {
                let style = attribute(&e, b"s", path)?.and_then(|s| s.parse::<usize>().ok());
                let code = style.and_then(|s| styles.get(s)).and_then(Option::as_ref);
                let position = attribute(&e, b"r", path)?.and_then(|r| cell_coordinates(&r));
                if let (Some(code), Some(position)) = (code, position) {
                    cells.insert(position, code.clone());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(package_error(path, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells)
}

/// Built-in number formats that have a fixed code (ECMA-376 18.8.30). Id 0 is `General`.
fn builtin_format(id: u32) -> Option<&'static str> {
    match id {
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}
