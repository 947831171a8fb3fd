//! Fixation records and their semicolon-delimited line format.
//!
//! One line per fixation:
//!
//! ```text
//! wallClockStart;trackerStart;trackerEnd;primary;secondary
//! ```
//!
//! A missing title is written as a single space, which is what older logs
//! contain.

pub mod log;

use std::fmt;

/// Field separator in the log format.
const SEPARATOR: char = ';';

/// Written in place of a missing window title.
const BLANK_TITLE: &str = " ";

/// Log parse or I/O failure.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("fixation log: {0}")]
    Io(#[from] std::io::Error),
}

/// One completed fixation and the window(s) it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct FixationRecord {
    /// Host clock at Begin, seconds since the Unix epoch.
    pub wall_clock_start: f64,
    /// Tracker clock at Begin. Zero when no Begin was seen.
    pub tracker_start: f64,
    /// Tracker clock at End.
    pub tracker_end: f64,
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl FixationRecord {
    /// Build a record from resolver output, frontmost title first.
    pub fn new(
        wall_clock_start: f64,
        tracker_start: f64,
        tracker_end: f64,
        mut titles: Vec<String>,
    ) -> Self {
        titles.truncate(2);
        let mut titles = titles.into_iter();
        Self {
            wall_clock_start,
            tracker_start,
            tracker_end,
            primary: titles.next(),
            secondary: titles.next(),
        }
    }

    /// Records without an observed Begin carry a zero start and are
    /// excluded from aggregation.
    pub fn is_valid(&self) -> bool {
        self.tracker_start != 0.0
    }

    pub fn duration(&self) -> f64 {
        self.tracker_end - self.tracker_start
    }

    /// Parse one log line. `line_no` is 1-based and only used in errors.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self, RecordError> {
        let malformed = |reason: String| RecordError::Malformed {
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line
            .trim_end_matches(['\r', '\n'])
            .split(SEPARATOR)
            .collect();
        if fields.len() != 5 {
            return Err(malformed(format!("expected 5 fields, got {}", fields.len())));
        }

        let number = |idx: usize, what: &str| {
            let value = fields[idx]
                .trim()
                .parse::<f64>()
                .map_err(|e| malformed(format!("{what} {:?}: {e}", fields[idx])))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(malformed(format!("{what} {:?} is not finite", fields[idx])))
            }
        };

        let wall_clock_start = number(0, "wall clock start")?;
        let tracker_start = number(1, "tracker start")?;
        let tracker_end = number(2, "tracker end")?;
        if tracker_end < tracker_start {
            return Err(malformed(format!(
                "fixation ends at {tracker_end} before it starts at {tracker_start}"
            )));
        }

        Ok(Self {
            wall_clock_start,
            tracker_start,
            tracker_end,
            primary: parse_title(fields[3]),
            secondary: parse_title(fields[4]),
        })
    }
}

/// Formats the record as one log line, newline included.
impl fmt::Display for FixationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.wall_clock_start,
            self.tracker_start,
            self.tracker_end,
            format_title(self.primary.as_deref()),
            format_title(self.secondary.as_deref()),
        )
    }
}

fn parse_title(field: &str) -> Option<String> {
    if field.trim().is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// Separator and line breaks inside a title would split the line, so they
/// become spaces.
fn format_title(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => t.replace([SEPARATOR, '\r', '\n'], " "),
        _ => BLANK_TITLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_line_with_blank_secondary() {
        let record = FixationRecord::parse_line("1;1.0;1.5;Mail; ", 2).unwrap();
        assert_eq!(record.tracker_start, 1.0);
        assert_eq!(record.tracker_end, 1.5);
        assert_eq!(record.primary.as_deref(), Some("Mail"));
        assert_eq!(record.secondary, None);
        assert_eq!(record.duration(), 0.5);
    }

    #[test]
    fn empty_and_space_titles_are_blank() {
        let record = FixationRecord::parse_line("0;1;1.0; ;", 1).unwrap();
        assert_eq!(record.primary, None);
        assert_eq!(record.secondary, None);
    }

    #[test]
    fn zero_tracker_start_is_invalid() {
        let record = FixationRecord::parse_line("5;0;12.5;Doc; ", 1).unwrap();
        assert!(!record.is_valid());
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let err = FixationRecord::parse_line("1;2;3;Doc", 7).unwrap_err();
        assert!(matches!(err, RecordError::Malformed { line: 7, .. }));
    }

    #[test]
    fn bad_number_is_malformed() {
        let err = FixationRecord::parse_line("1;abc;3;Doc; ", 3).unwrap_err();
        assert!(err.to_string().contains("tracker start"));
    }

    #[test]
    fn non_finite_timestamps_are_malformed() {
        for line in ["0;6;NaN;A; ", "0;inf;7;A; ", "NaN;1;2;A; "] {
            let err = FixationRecord::parse_line(line, 4).unwrap_err();
            assert!(matches!(err, RecordError::Malformed { line: 4, .. }), "{line}");
        }
    }

    #[test]
    fn end_before_start_is_malformed() {
        let err = FixationRecord::parse_line("0;5;4;A; ", 2).unwrap_err();
        assert!(err.to_string().contains("before it starts"));
    }

    #[test]
    fn blank_titles_are_written_as_single_space() {
        let record = FixationRecord::new(10.0, 1.0, 1.5, Vec::new());
        assert_eq!(record.to_string(), "10;1;1.5; ; \n");
    }

    #[test]
    fn titles_with_separators_stay_on_one_line() {
        let record = FixationRecord::new(
            10.0,
            1.0,
            2.0,
            vec!["a;b".into(), "two\nlines".into()],
        );
        let line = record.to_string();
        assert_eq!(line, "10;1;2;a b;two lines\n");
        let parsed = FixationRecord::parse_line(&line, 1).unwrap();
        assert_eq!(parsed.primary.as_deref(), Some("a b"));
        assert_eq!(parsed.secondary.as_deref(), Some("two lines"));
    }

    #[test]
    fn extra_titles_are_dropped() {
        let record = FixationRecord::new(0.0, 1.0, 2.0, vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(record.primary.as_deref(), Some("a"));
        assert_eq!(record.secondary.as_deref(), Some("b"));
    }
}
