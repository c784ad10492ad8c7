//! Issue date (`dhEmi`) formatting.

use std::fmt::Write;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::models::config::ExtractionConfig;

const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Outcome of converting a raw issue timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueDate {
    /// The source element was missing or empty.
    Empty,
    /// The timestamp was understood and rendered with the display pattern.
    Formatted(String),
    /// The timestamp could not be converted; the source text is kept as is.
    Raw(String),
}

impl IssueDate {
    /// Value stored in the item record.
    pub fn into_string(self) -> String {
        match self {
            IssueDate::Empty => String::new(),
            IssueDate::Formatted(s) | IssueDate::Raw(s) => s,
        }
    }
}

/// Converts NF-e timestamps into a display string.
///
/// By default a `dhEmi` carrying an offset is rendered in that offset, the
/// wall-clock time the issuer recorded, not in the machine's local zone.
/// Use [`IssueDateFormatter::with_local_time`] (or `extraction.local_time`)
/// to convert to the local zone instead.
#[derive(Debug, Clone)]
pub struct IssueDateFormatter {
    pattern: String,
    local_time: bool,
}

impl IssueDateFormatter {
    /// Formatter with the Brazilian `dd/mm/yyyy hh:mm:ss` pattern.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            pattern: config.date_format.clone(),
            local_time: config.local_time,
        }
    }

    /// Set the chrono display pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Convert offset timestamps to the local time zone.
    pub fn with_local_time(mut self, local_time: bool) -> Self {
        self.local_time = local_time;
        self
    }

    /// Convert a raw `dhEmi` value.
    pub fn format(&self, raw: &str) -> IssueDate {
        let raw = raw.trim();
        if raw.is_empty() {
            return IssueDate::Empty;
        }

        match self.render(raw) {
            Some(formatted) => IssueDate::Formatted(formatted),
            None => IssueDate::Raw(raw.to_string()),
        }
    }

    fn render(&self, raw: &str) -> Option<String> {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return if self.local_time {
                self.write(timestamp.with_timezone(&Local).format(&self.pattern))
            } else {
                self.write(timestamp.format(&self.pattern))
            };
        }

        for format in NAIVE_DATE_TIME_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
                return self.write(timestamp.format(&self.pattern));
            }
        }

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        self.write(date.and_hms_opt(0, 0, 0)?.format(&self.pattern))
    }

    // An invalid pattern surfaces as a fmt error rather than a panic here.
    fn write(&self, formatted: impl std::fmt::Display) -> Option<String> {
        let mut out = String::new();
        write!(out, "{}", formatted).ok()?;
        Some(out)
    }
}

impl Default for IssueDateFormatter {
    fn default() -> Self {
        Self::new()
    }
}
