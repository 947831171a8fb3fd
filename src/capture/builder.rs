//! Fixation record builder — Begin/Data/End state machine.
//!
//! Holds at most one open fixation. A Begin opens it (replacing any
//! fixation that never saw its End), Data moves the gaze point, End
//! resolves the gaze point and emits exactly one record.

use crate::record::FixationRecord;
use crate::resolver::GazePoint;

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenFixation {
    wall_clock_start: f64,
    tracker_start: f64,
}

#[derive(Debug, Default)]
pub struct FixationRecordBuilder {
    open: Option<OpenFixation>,
    gaze: GazePoint,
}

impl FixationRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fixation. Returns `true` if an unterminated one was
    /// discarded.
    pub fn begin(&mut self, wall_clock: f64, tracker_ts: f64, point: GazePoint) -> bool {
        let replaced = self.open.replace(OpenFixation {
            wall_clock_start: wall_clock,
            tracker_start: tracker_ts,
        });
        self.gaze = point;
        if let Some(stale) = replaced {
            tracing::debug!(
                tracker_start = stale.tracker_start,
                "fixation without End discarded"
            );
        }
        replaced.is_some()
    }

    pub fn data(&mut self, point: GazePoint) {
        self.gaze = point;
    }

    /// Close the fixation and emit its record.
    ///
    /// `resolve` maps the final gaze point to window titles and is called
    /// exactly once. Without a prior Begin both start timestamps are zero,
    /// which marks the record invalid for aggregation.
    pub fn end<F>(&mut self, tracker_ts: f64, point: GazePoint, resolve: F) -> FixationRecord
    where
        F: FnOnce(GazePoint) -> Vec<String>,
    {
        self.gaze = point;
        let open = self.open.take().unwrap_or(OpenFixation {
            wall_clock_start: 0.0,
            tracker_start: 0.0,
        });
        FixationRecord::new(
            open.wall_clock_start,
            open.tracker_start,
            tracker_ts,
            resolve(self.gaze),
        )
    }

    /// Drop the open fixation without emitting anything. Returns `true` if
    /// there was one.
    pub fn cancel(&mut self) -> bool {
        self.open.take().is_some()
    }
}
