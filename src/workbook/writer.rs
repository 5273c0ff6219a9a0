//! Workbook lifecycle: open (create or load), add sheets, write cells, save once, close.

use std::path::{Path, PathBuf};

use crate::error::{ConvertError, ConvertResult};
use crate::types::{CellOption, CellValue};

use super::engine::{SpreadsheetEngine, XlsxEngine};
use super::{DEFAULT_SHEET, Workbook, sanitize_sheet_name};

struct Session {
    path: PathBuf,
    workbook: Workbook,
    is_new: bool,
}

enum State {
    Unopened,
    Open(Session),
    Saved(Session),
    Closed,
}

/// Owns the output workbook for the duration of one run.
///
/// The lifecycle is `open -> (new_sheet | write_cell)* -> save -> close`. `open` is rejected
/// while a workbook is already open, and nothing reaches disk before `save`.
pub struct SpreadsheetWriter {
    engine: Box<dyn SpreadsheetEngine>,
    state: State,
}

impl Default for SpreadsheetWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetWriter {
    /// A writer using the default `.xlsx` engine.
    pub fn new() -> Self {
        Self::with_engine(Box::new(XlsxEngine))
    }

    pub fn with_engine(engine: Box<dyn SpreadsheetEngine>) -> Self {
        Self {
            engine,
            state: State::Unopened,
        }
    }

    /// Open the workbook at `path`, creating an in-memory one if no file exists there.
    pub fn open(&mut self, path: impl AsRef<Path>) -> ConvertResult<()> {
        if matches!(self.state, State::Open(_) | State::Saved(_)) {
            return Err(ConvertError::Write(
                "workbook is already open; close it before opening another".to_string(),
            ));
        }
        let path = path.as_ref().to_path_buf();
        let session = if self.engine.exists(&path) {
            Session {
                workbook: self.engine.load_workbook(&path)?,
                path,
                is_new: false,
            }
        } else {
            Session {
                workbook: self.engine.new_workbook(),
                path,
                is_new: true,
            }
        };
        self.state = State::Open(session);
        Ok(())
    }

    /// `Some(true)` when the open workbook was created by this writer, `None` if nothing is open.
    pub fn is_new(&self) -> Option<bool> {
        self.session().map(|s| s.is_new)
    }

    /// The workbook currently held by the writer.
    pub fn workbook(&self) -> Option<&Workbook> {
        self.session().map(|s| &s.workbook)
    }

    /// Ensure a sheet exists for `name` and return the name actually used (validated and
    /// truncated to Excel's limit). Existing content is left untouched.
    pub fn new_sheet(&mut self, name: &str) -> ConvertResult<String> {
        let name = sanitize_sheet_name(name)?;
        self.session_mut()?.workbook.create_sheet(&name);
        Ok(name)
    }

    /// Write `raw` to (`col`, `row`) of `sheet`, as a number when it parses as one.
    pub fn write_cell(
        &mut self,
        raw: &str,
        sheet: &str,
        col: u32,
        row: u32,
        option: &CellOption,
    ) -> ConvertResult<()> {
        let value = CellValue::infer(raw, option);
        self.session_mut()?.workbook.set_cell(sheet, col, row, value)
    }

    /// Persist the workbook. A workbook created by this writer loses its unused placeholder
    /// sheet first.
    pub fn save(&mut self) -> ConvertResult<()> {
        let mut session = match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(session) => session,
            other => {
                self.state = other;
                return Err(not_open());
            }
        };

        if session.is_new {
            drop_placeholder(&mut session.workbook);
        }
        let result = self.engine.save_workbook(&session.workbook, &session.path);
        self.state = if result.is_ok() {
            State::Saved(session)
        } else {
            State::Open(session)
        };
        result
    }

    /// Release the workbook. Safe to call when nothing is open.
    pub fn close(&mut self) {
        if !matches!(self.state, State::Unopened) {
            self.state = State::Closed;
        }
    }

    fn session(&self) -> Option<&Session> {
        match &self.state {
            State::Open(s) | State::Saved(s) => Some(s),
            State::Unopened | State::Closed => None,
        }
    }

    fn session_mut(&mut self) -> ConvertResult<&mut Session> {
        match &mut self.state {
            State::Open(s) => Ok(s),
            State::Saved(_) => Err(ConvertError::Write("workbook has already been saved".to_string())),
            State::Unopened | State::Closed => Err(not_open()),
        }
    }
}

fn not_open() -> ConvertError {
    ConvertError::Write("workbook has not been opened".to_string())
}

fn drop_placeholder(workbook: &mut Workbook) {
    let removable = workbook.sheets().len() > 1
        && workbook
            .sheet(DEFAULT_SHEET)
            .is_some_and(|sheet| sheet.is_empty());
    if removable {
        workbook.delete_sheet(DEFAULT_SHEET);
    }
}
