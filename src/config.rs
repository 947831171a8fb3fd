//! Tunable thresholds for resolution and interruption reporting.
//!
//! Defaults match the values the tracker was originally calibrated with;
//! every field can be overridden from the command line or environment
//! (see `main.rs`).

use serde::{Deserialize, Serialize};

/// Name attributed to fixations that landed on no window.
pub const BACKGROUND_WINDOW: &str = "OS background or notification, or off-screen data";

/// Active window resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Percentage of the rear window the front window must cover before
    /// attention is attributed to the front window alone.
    pub overlap_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 33.0,
        }
    }
}

/// Interruption classification settings. Durations are in tracker
/// timestamp units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// An interruption shorter than this is not a distraction.
    pub distraction_min_away: f64,
    /// An interruption at least this fraction of the window's dwell time
    /// is not a distraction either.
    pub distraction_max_fraction: f64,
    /// A window is focused if its summed away time is below this fraction
    /// of its dwell time.
    pub focus_max_away_fraction: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            distraction_min_away: 0.08,
            distraction_max_fraction: 0.2,
            focus_max_away_fraction: 0.75,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub heuristics: HeuristicsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.resolver.overlap_threshold, 33.0);
        assert_eq!(config.heuristics.distraction_min_away, 0.08);
        assert_eq!(config.heuristics.distraction_max_fraction, 0.2);
        assert_eq!(config.heuristics.focus_max_away_fraction, 0.75);
    }
}
