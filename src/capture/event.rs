//! Gaze event source — newline-delimited device events.
//!
//! The tracker bridge writes one event per line:
//!
//! ```text
//! begin 1203.5 812.0 440.2
//! data  1203.6 814.1 441.0
//! end   1203.9 815.3 439.8
//! presence absent
//! ```
//!
//! Fixation lines carry the tracker timestamp and the gaze position in
//! screen pixels. Blank lines and `#` comments are ignored.

use std::str::FromStr;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use crate::resolver::GazePoint;

/// Longest line accepted from the device bridge.
const MAX_LINE_LEN: usize = 16 * 1024;

/// Event line parse or read failure.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("unknown event {0:?}")]
    UnknownKind(String),
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("bad {field} {value:?}")]
    BadNumber { field: &'static str, value: String },
    #[error("unknown presence state {0:?}")]
    UnknownPresence(String),
    #[error("trailing input {0:?}")]
    Trailing(String),
    #[error("event stream: {0}")]
    Read(#[from] std::io::Error),
}

/// Fixation event tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixationPhase {
    Begin,
    Data,
    End,
}

/// One fixation event from the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationEvent {
    pub phase: FixationPhase,
    /// Tracker clock.
    pub timestamp: f64,
    pub point: GazePoint,
}

/// User presence as sensed by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
    /// The tracker cannot tell.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent {
    Fixation(FixationEvent),
    Presence(Presence),
}

impl FromStr for DeviceEvent {
    type Err = EventError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        let kind = fields.next().ok_or(EventError::MissingField("event"))?;

        let phase = match kind.to_ascii_lowercase().as_str() {
            "begin" => FixationPhase::Begin,
            "data" => FixationPhase::Data,
            "end" => FixationPhase::End,
            "presence" => {
                let state = fields.next().ok_or(EventError::MissingField("presence state"))?;
                let presence = match state.to_ascii_lowercase().as_str() {
                    "present" => Presence::Present,
                    "absent" | "not_present" => Presence::Absent,
                    "unknown" => Presence::Unknown,
                    other => return Err(EventError::UnknownPresence(other.to_string())),
                };
                reject_trailing(fields)?;
                return Ok(DeviceEvent::Presence(presence));
            }
            other => return Err(EventError::UnknownKind(other.to_string())),
        };

        let timestamp = number(fields.next(), "timestamp")?;
        let x = number(fields.next(), "x")?;
        let y = number(fields.next(), "y")?;
        reject_trailing(fields)?;

        Ok(DeviceEvent::Fixation(FixationEvent {
            phase,
            timestamp,
            point: GazePoint::from_device(x, y),
        }))
    }
}

fn number(field: Option<&str>, name: &'static str) -> Result<f64, EventError> {
    let value = field.ok_or(EventError::MissingField(name))?;
    value.parse().map_err(|_| EventError::BadNumber {
        field: name,
        value: value.to_string(),
    })
}

fn reject_trailing<'a>(mut fields: impl Iterator<Item = &'a str>) -> Result<(), EventError> {
    match fields.next() {
        Some(extra) => Err(EventError::Trailing(extra.to_string())),
        None => Ok(()),
    }
}

/// Pull-based reader over a device event stream.
pub struct EventSource<R> {
    lines: FramedRead<R, LinesCodec>,
    line_no: usize,
}

impl<R: AsyncRead + Unpin> EventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LEN)),
            line_no: 0,
        }
    }

    /// Next well-formed event, or `None` at end of stream.
    ///
    /// Malformed and overlong lines are logged and skipped. Cancel safe:
    /// dropping the future loses no buffered input.
    pub async fn next_event(&mut self) -> Result<Option<DeviceEvent>, EventError> {
        while let Some(line) = self.lines.next().await {
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    tracing::warn!(line = self.line_no, "event line too long, skipped");
                    continue;
                }
                Err(LinesCodecError::Io(e)) => return Err(EventError::Read(e)),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match trimmed.parse() {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    tracing::warn!(line = self.line_no, error = %e, "malformed event, skipped");
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<DeviceEvent, EventError> {
        line.parse()
    }

    #[test]
    fn parses_fixation_phases() {
        let event = parse("begin 1203.5 812.7 440.2").unwrap();
        assert_eq!(
            event,
            DeviceEvent::Fixation(FixationEvent {
                phase: FixationPhase::Begin,
                timestamp: 1203.5,
                point: GazePoint::new(812, 440),
            })
        );
        assert!(matches!(
            parse("DATA 1 2 3").unwrap(),
            DeviceEvent::Fixation(FixationEvent { phase: FixationPhase::Data, .. })
        ));
        assert!(matches!(
            parse("end 1 2 3").unwrap(),
            DeviceEvent::Fixation(FixationEvent { phase: FixationPhase::End, .. })
        ));
    }

    #[test]
    fn parses_presence() {
        assert_eq!(parse("presence present").unwrap(), DeviceEvent::Presence(Presence::Present));
        assert_eq!(parse("presence absent").unwrap(), DeviceEvent::Presence(Presence::Absent));
        assert_eq!(parse("presence unknown").unwrap(), DeviceEvent::Presence(Presence::Unknown));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(parse("blink 1 2 3"), Err(EventError::UnknownKind(_))));
        assert!(matches!(parse("begin 1 2"), Err(EventError::MissingField("y"))));
        assert!(matches!(parse("end x 2 3"), Err(EventError::BadNumber { field: "timestamp", .. })));
        assert!(matches!(parse("end 1 2 3 4"), Err(EventError::Trailing(_))));
        assert!(matches!(parse("presence maybe"), Err(EventError::UnknownPresence(_))));
    }

    #[test]
    fn non_finite_coordinates_saturate() {
        let DeviceEvent::Fixation(event) = parse("data 5 NaN 1e300").unwrap() else {
            panic!("expected fixation event");
        };
        assert_eq!(event.point, GazePoint::new(0, i32::MAX));
    }

    #[tokio::test]
    async fn source_skips_noise() {
        let input = b"# recorded session\n\nbegin 1 10 10\nwhat is this\ndata 1.1 11 10\nend 1.2 12 10\n";
        let mut source = EventSource::new(&input[..]);

        let mut phases = Vec::new();
        while let Some(event) = source.next_event().await.unwrap() {
            if let DeviceEvent::Fixation(f) = event {
                phases.push(f.phase);
            }
        }
        assert_eq!(
            phases,
            vec![FixationPhase::Begin, FixationPhase::Data, FixationPhase::End]
        );
    }

    #[tokio::test]
    async fn empty_stream_ends_immediately() {
        let mut source = EventSource::new(&b""[..]);
        assert!(source.next_event().await.unwrap().is_none());
    }
}
