//! Audit log records and the append-only recorder.
//!
//! The log is CSV. Every row carries a schema version in its last column;
//! rows written by older tooling have four columns and no version, and are
//! read as version 1.

use crate::error::{HardenError, Result};
use crate::types::StartupMode;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const HEADER: &str =
    "DateString,ServiceName,StartTypeBeforeChange,StartTypeAfterChange,SchemaVersion";

pub const SCHEMA_VERSION: u32 = 2;
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Token written in place of a startup mode that could not be read.
pub const UNKNOWN_MODE: &str = "Unknown";

// ---------------------------------------------------------------------------
// ChangeRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub timestamp: DateTime<Utc>,
    pub service_id: String,
    pub before: Option<StartupMode>,
    pub after: Option<StartupMode>,
    pub schema_version: u32,
}

impl ChangeRecord {
    pub fn new(
        service_id: impl Into<String>,
        before: Option<StartupMode>,
        after: Option<StartupMode>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            service_id: service_id.into(),
            before,
            after,
            schema_version: SCHEMA_VERSION,
        }
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            quote(&self.service_id),
            mode_token(self.before),
            mode_token(self.after),
            self.schema_version
        )
    }

    /// Parse one data row. `line_no` is 1-based and only used for errors.
    pub fn parse_line(line: &str, line_no: usize) -> Result<ChangeRecord> {
        let fields = split_fields(line).ok_or_else(|| HardenError::MalformedRecord {
            line: line_no,
            reason: "unterminated quoted field".to_string(),
        })?;

        let schema_version = match fields.len() {
            4 => LEGACY_SCHEMA_VERSION,
            5 => match fields[4].parse::<u32>() {
                Ok(v) if v == LEGACY_SCHEMA_VERSION || v == SCHEMA_VERSION => v,
                _ => {
                    return Err(HardenError::UnsupportedSchema {
                        line: line_no,
                        version: fields[4].to_string(),
                    })
                }
            },
            n => {
                return Err(HardenError::MalformedRecord {
                    line: line_no,
                    reason: format!("expected 4 or 5 columns, found {n}"),
                })
            }
        };

        let timestamp = parse_timestamp(&fields[0]).ok_or_else(|| HardenError::MalformedRecord {
            line: line_no,
            reason: format!("invalid timestamp '{}'", fields[0]),
        })?;

        let service_id = fields[1].as_str();
        if service_id.is_empty() {
            return Err(HardenError::MalformedRecord {
                line: line_no,
                reason: "empty service name".to_string(),
            });
        }

        Ok(ChangeRecord {
            timestamp,
            service_id: service_id.to_string(),
            before: parse_mode(&fields[2])?,
            after: parse_mode(&fields[3])?,
            schema_version,
        })
    }
}

fn mode_token(mode: Option<StartupMode>) -> &'static str {
    mode.map(StartupMode::as_str).unwrap_or(UNKNOWN_MODE)
}

fn parse_mode(token: &str) -> Result<Option<StartupMode>> {
    if token.is_empty() || token.eq_ignore_ascii_case(UNKNOWN_MODE) {
        return Ok(None);
    }
    token.parse().map(Some)
}

/// Quote `field` when it contains a separator, quote or line break.
fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Split a CSV row into fields. Quoted fields may contain commas and doubled
/// quotes; unquoted fields are trimmed. `None` for an unterminated quote.
fn split_fields(line: &str) -> Option<Vec<String>> {
    let line = line.trim_start_matches('\u{feff}');
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.trim().is_empty() && !quoted => {
                field.clear();
                quoted = true;
                in_quotes = true;
            }
            ',' => {
                fields.push(finish(std::mem::take(&mut field), quoted));
                quoted = false;
            }
            _ if quoted && c.is_whitespace() => {}
            _ => field.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(finish(field, quoted));
    Some(fields)
}

fn finish(field: String, quoted: bool) -> String {
    if quoted {
        field
    } else {
        field.trim().to_string()
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    // Offset-less timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// True for the header row of either schema, with or without a byte order mark.
pub fn is_header(line: &str) -> bool {
    split_fields(line)
        .and_then(|fields| fields.into_iter().next())
        .is_some_and(|first| first == "DateString")
}

// ---------------------------------------------------------------------------
// ChangeRecorder
// ---------------------------------------------------------------------------

/// Appends records to an audit log. The file is opened and closed per record.
#[derive(Debug, Clone)]
pub struct ChangeRecorder {
    path: PathBuf,
}

impl ChangeRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record`, writing the header first if the log is new or empty.
    pub fn record(&self, record: &ChangeRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if f.metadata()?.len() == 0 {
            writeln!(f, "{HEADER}")?;
        }
        writeln!(f, "{}", record.to_csv_line())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
