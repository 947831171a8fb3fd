//! Session aggregation — folds fixation records into per-window statistics.
//!
//! A single forward pass over records in capture order. Each window name
//! gets one [`WindowSession`], created on first sighting and updated in
//! place. Whenever attention moves from one window to another, the window
//! that was left records an interruption.

pub mod report;

use std::collections::HashMap;

use crate::config::BACKGROUND_WINDOW;
use crate::record::FixationRecord;

/// Accumulated attention on one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSession {
    pub name: String,
    /// Summed fixation durations, in tracker units.
    pub total_time: f64,
    /// Raw count of departures from this window. See
    /// [`WindowSession::reported_interruptions`].
    pub interruptions: u32,
    /// `(interrupting window, last time this window was viewed)`, in
    /// chronological order.
    pub interruption_log: Vec<(String, f64)>,
    /// End of the most recent fixation on this window.
    pub last_time_viewed: f64,
    /// Start of every fixation on this window, chronological.
    pub start_timestamps: Vec<f64>,
}

impl WindowSession {
    fn new(name: String) -> Self {
        Self {
            name,
            total_time: 0.0,
            interruptions: 0,
            interruption_log: Vec::new(),
            last_time_viewed: 0.0,
            start_timestamps: Vec::new(),
        }
    }

    /// Interruption count as reported to the user.
    ///
    /// Leaving a window once is not an interruption unless attention comes
    /// back, so the first departure is not counted.
    pub fn reported_interruptions(&self) -> u32 {
        self.interruptions.saturating_sub(1)
    }
}

/// Incremental aggregator. Feed records in capture order, then
/// [`finish`](Aggregator::finish).
#[derive(Debug, Default)]
pub struct Aggregator {
    sessions: HashMap<String, WindowSession>,
    first_seen: Vec<String>,
    previous: Option<String>,
    skipped: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record. Records without an observed Begin are skipped.
    pub fn push(&mut self, record: &FixationRecord) {
        if !record.is_valid() {
            self.skipped += 1;
            return;
        }

        let name = record.primary.as_deref().unwrap_or(BACKGROUND_WINDOW);

        if !self.sessions.contains_key(name) {
            self.sessions
                .insert(name.to_string(), WindowSession::new(name.to_string()));
            self.first_seen.push(name.to_string());
        }

        let left = self
            .previous
            .as_deref()
            .filter(|p| *p != name)
            .and_then(|p| self.sessions.get_mut(p));
        if let Some(left) = left {
            left.interruptions += 1;
            let at = left.last_time_viewed;
            left.interruption_log.push((name.to_string(), at));
        }

        if let Some(session) = self.sessions.get_mut(name) {
            session.total_time += record.duration();
            session.start_timestamps.push(record.tracker_start);
            session.last_time_viewed = record.tracker_end;
        }

        if self.previous.as_deref() != Some(name) {
            self.previous = Some(name.to_string());
        }
    }

    pub fn finish(self) -> SessionTable {
        if self.skipped > 0 {
            tracing::debug!(skipped = self.skipped, "records without a fixation start skipped");
        }
        SessionTable {
            sessions: self.sessions,
            order: self.first_seen,
        }
    }
}

/// Aggregate a complete, ordered record sequence.
pub fn aggregate<'a, I>(records: I) -> SessionTable
where
    I: IntoIterator<Item = &'a FixationRecord>,
{
    let mut aggregator = Aggregator::new();
    for record in records {
        aggregator.push(record);
    }
    aggregator.finish()
}

/// Result of one aggregation pass: sessions keyed by window name.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<String, WindowSession>,
    order: Vec<String>,
}

impl SessionTable {
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&WindowSession> {
        self.sessions.get(name)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions in the order their windows were first looked at.
    pub fn iter(&self) -> impl Iterator<Item = &WindowSession> {
        self.order.iter().filter_map(|name| self.sessions.get(name))
    }

    /// Dwell time summed over every window.
    pub fn total_time(&self) -> f64 {
        self.iter().map(|s| s.total_time).sum()
    }
}
