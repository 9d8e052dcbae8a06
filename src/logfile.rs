use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};

use crate::error::Error;
use crate::tracker::Transition;

/// Width of the previous-state column. The widest fixed label is 11
/// characters; the slack keeps columns aligned if the taxonomy grows.
pub const STATE_WIDTH: usize = 18;

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_WIDTH: usize = 19;
const FIELD_GAP: &str = "   ";
const ARROW: &str = "->";

/// Renders `seconds` as `HH:MM:SS`; hours keep counting past 24.
#[must_use]
pub fn hms(d: Duration) -> String {
    let total = d.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Renders a confirmed transition as one log line.
pub trait RecordFormat {
    fn format(&self, at: DateTime<Local>, transition: &Transition) -> String;
}

/// Default layout: fixed-width columns separated by three-space gaps.
///
/// ```text
/// 2026-08-26 09:15:02   Online               00:04:11   ->   Timeout
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedWidthFormat;

impl RecordFormat for FixedWidthFormat {
    fn format(&self, at: DateTime<Local>, t: &Transition) -> String {
        format!(
            "{ts}{gap}{from:<width$}{gap}{held}{gap}{ARROW}{gap}{to}",
            ts = at.format(TIMESTAMP_FMT),
            from = t.from.to_string(),
            held = hms(t.held),
            to = t.to,
            gap = FIELD_GAP,
            width = STATE_WIDTH,
        )
    }
}

/// A log line split back into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub timestamp: NaiveDateTime,
    pub from: String,
    pub held: Duration,
    pub to: String,
}

/// Parses a line written by [`FixedWidthFormat`]. Returns `None` for lines
/// that do not follow the layout.
#[must_use]
pub fn parse_line(line: &str) -> Option<ParsedRecord> {
    let (ts, rest) = line.split_at_checked(TIMESTAMP_WIDTH)?;
    let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FMT).ok()?;

    // Label padding widens the gaps, so collapse empty fields.
    let mut fields = rest.split(FIELD_GAP).map(str::trim).filter(|f| !f.is_empty());
    let from = fields.next()?.to_string();
    let held = parse_hms(fields.next()?)?;
    if fields.next()? != ARROW {
        return None;
    }
    let to = fields.next()?.to_string();
    if fields.next().is_some() {
        return None;
    }

    Some(ParsedRecord {
        timestamp,
        from,
        held,
        to,
    })
}

fn parse_hms(s: &str) -> Option<Duration> {
    let mut parts = s.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(Duration::from_secs(hours * 3600 + minutes * 60 + seconds))
}

/// Append-only writer for one host's transition log.
///
/// Single producer by design: only the tracker's tick loop writes, and the
/// file is opened per append so a crash never holds it hostage. Write
/// failures propagate; a monitor that cannot record history has failed its
/// purpose.
#[derive(Debug)]
pub struct TransitionLog<F = FixedWidthFormat> {
    path: PathBuf,
    format: F,
}

impl TransitionLog {
    /// Log for `host` under `dir`, creating `dir` if needed. The file itself
    /// is created on first append.
    pub fn for_host(dir: &Path, host: &str) -> Result<Self, Error> {
        fs::create_dir_all(dir).map_err(|e| Error::LogWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(dir.join(format!("log_{host}.txt")), FixedWidthFormat))
    }
}

impl<F: RecordFormat> TransitionLog<F> {
    #[must_use]
    pub fn new(path: PathBuf, format: F) -> Self {
        Self { path, format }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, stamped with the current wall-clock time.
    pub fn append(&mut self, transition: &Transition) -> Result<(), Error> {
        let line = self.format.format(Local::now(), transition);
        let io_err = |e| Error::LogWrite {
            path: self.path.clone(),
            source: e,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "{line}").map_err(io_err)?;
        Ok(())
    }
}
