use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::ConvertError;

use super::source::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the run failed).
    Error,
    /// Critical error (I/O or file-system failures).
    Critical,
}

impl ConvertSeverity {
    /// Severity of a run that failed with `error`.
    pub fn for_error(error: &ConvertError) -> Self {
        match error {
            ConvertError::Io { .. } | ConvertError::Discovery { .. } => Self::Critical,
            _ => Self::Error,
        }
    }
}

/// Context about a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertContext {
    /// Input file or directory.
    pub root: PathBuf,
    /// Output workbook path.
    pub output: PathBuf,
}

/// Context about one input file copied into a sheet.
#[derive(Debug, Clone)]
pub struct SheetContext {
    pub source: PathBuf,
    pub sheet: String,
    pub format: SourceFormat,
}

/// Stats reported after a sheet has been filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetStats {
    /// Number of records written.
    pub rows: usize,
}

/// Stats reported when a run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertStats {
    /// Number of input files converted.
    pub files: usize,
    /// Total records written across all sheets.
    pub rows: usize,
    /// Whether the output workbook was newly created.
    pub created: bool,
}

/// Observer interface for conversion progress and outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ConvertObserver: Send + Sync {
    /// Called after each input file has been written into its sheet.
    fn on_sheet_written(&self, _ctx: &SheetContext, _stats: SheetStats) {}

    /// Called when the workbook has been saved.
    fn on_success(&self, _ctx: &ConvertContext, _stats: ConvertStats) {}

    /// Called when the run fails.
    fn on_failure(&self, _ctx: &ConvertContext, _severity: ConvertSeverity, _error: &ConvertError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ConvertObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn ConvertObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ConvertObserver for CompositeObserver {
    fn on_sheet_written(&self, ctx: &SheetContext, stats: SheetStats) {
        for o in &self.observers {
            o.on_sheet_written(ctx, stats);
        }
    }

    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs conversion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl ConvertObserver for StdErrObserver {
    fn on_sheet_written(&self, ctx: &SheetContext, stats: SheetStats) {
        eprintln!(
            "[csv2xlsx][sheet] format={:?} sheet={} src={} rows={}",
            ctx.format,
            ctx.sheet,
            ctx.source.display(),
            stats.rows
        );
    }

    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        eprintln!(
            "[csv2xlsx][ok] output={} created={} files={} rows={}",
            ctx.output.display(),
            stats.created,
            stats.files,
            stats.rows
        );
    }

    fn on_failure(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        eprintln!(
            "[csv2xlsx][{:?}] input={} output={} err={}",
            severity,
            ctx.root.display(),
            ctx.output.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        eprintln!(
            "[ALERT][csv2xlsx][{:?}] input={} output={} err={}",
            severity,
            ctx.root.display(),
            ctx.output.display(),
            error
        );
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum LogEvent<'a> {
    Sheet {
        ts: u64,
        source: &'a Path,
        sheet: &'a str,
        format: SourceFormat,
        rows: usize,
    },
    Ok {
        ts: u64,
        output: &'a Path,
        created: bool,
        files: usize,
        rows: usize,
    },
    Fail {
        ts: u64,
        severity: ConvertSeverity,
        input: &'a Path,
        output: &'a Path,
        error: String,
    },
    Alert {
        ts: u64,
        severity: ConvertSeverity,
        input: &'a Path,
        output: &'a Path,
        error: String,
    },
}

/// Appends conversion events to a local log file, one JSON object per line.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, event: &LogEvent<'_>) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl ConvertObserver for FileObserver {
    fn on_sheet_written(&self, ctx: &SheetContext, stats: SheetStats) {
        self.append(&LogEvent::Sheet {
            ts: unix_ts(),
            source: &ctx.source,
            sheet: &ctx.sheet,
            format: ctx.format,
            rows: stats.rows,
        });
    }

    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        self.append(&LogEvent::Ok {
            ts: unix_ts(),
            output: &ctx.output,
            created: stats.created,
            files: stats.files,
            rows: stats.rows,
        });
    }

    fn on_failure(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.append(&LogEvent::Fail {
            ts: unix_ts(),
            severity,
            input: &ctx.root,
            output: &ctx.output,
            error: error.to_string(),
        });
    }

    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.append(&LogEvent::Alert {
            ts: unix_ts(),
            severity,
            input: &ctx.root,
            output: &ctx.output,
            error: error.to_string(),
        });
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
