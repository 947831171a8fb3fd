//! Session summaries — reported interruption counts, distraction and focus
//! classification, console rendering and MessagePack export.

use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::HeuristicsConfig;

use super::{SessionTable, WindowSession};

/// Per-window line of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub name: String,
    pub total_time: f64,
    /// Raw interruption count minus the first departure.
    pub interruptions: u32,
    /// Interruptions short enough to count as distractions.
    pub distractions: u32,
    /// Whether time away from the window stayed below the focus fraction.
    pub focused: bool,
}

/// Summary of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub windows: Vec<WindowSummary>,
    pub total_time: f64,
    pub heuristics: HeuristicsConfig,
}

/// Export failure.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("encode summary: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("write summary: {0}")]
    Io(#[from] io::Error),
}

/// How long attention stayed away after each interruption.
///
/// The return is the first fixation on the window that starts strictly
/// after the interruption; interruptions never followed by a return yield
/// nothing.
pub fn away_times(session: &WindowSession) -> Vec<f64> {
    session
        .interruption_log
        .iter()
        .filter_map(|(_, at)| {
            session
                .start_timestamps
                .iter()
                .find(|&&start| start > *at)
                .map(|start| start - at)
        })
        .collect()
}

/// An interruption is a distraction when it is noticeable but short
/// relative to the time spent on the window.
pub fn is_distraction(away: f64, session: &WindowSession, config: &HeuristicsConfig) -> bool {
    away > config.distraction_min_away
        && away < config.distraction_max_fraction * session.total_time
}

/// A window was focused on when little of its span was spent elsewhere.
pub fn was_focused(session: &WindowSession, config: &HeuristicsConfig) -> bool {
    let away: f64 = away_times(session).iter().sum();
    away < config.focus_max_away_fraction * session.total_time
}

pub fn summarize(table: &SessionTable, config: &HeuristicsConfig) -> Summary {
    let windows = table
        .iter()
        .map(|session| WindowSummary {
            name: session.name.clone(),
            total_time: session.total_time,
            interruptions: session.reported_interruptions(),
            distractions: away_times(session)
                .into_iter()
                .filter(|&away| is_distraction(away, session, config))
                .count() as u32,
            focused: was_focused(session, config),
        })
        .collect();

    Summary {
        windows,
        total_time: table.total_time(),
        heuristics: config.clone(),
    }
}

impl Summary {
    /// Human-readable report, one paragraph per window.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        for window in &self.windows {
            writeln!(
                out,
                "Spent {} tracker time units on window '{}'. There were {} interruptions while viewing this window.",
                window.total_time, window.name, window.interruptions
            )?;
            if window.distractions > 0 {
                writeln!(out, "  {} of them looked like distractions.", window.distractions)?;
            }
            if window.focused {
                writeln!(out, "  Attention on this window was focused.")?;
            }
            writeln!(out)?;
        }
        writeln!(
            out,
            "There were a total of {} tracker time units across {} windows.",
            self.total_time,
            self.windows.len()
        )
    }

    /// Write the summary as MessagePack with named fields.
    pub async fn export(&self, path: &Path) -> Result<(), ExportError> {
        let bytes = rmp_serde::to_vec_named(self)?;
        tokio::fs::write(path, bytes).await?;
        tracing::info!(path = %path.display(), "summary exported");
        Ok(())
    }
}
