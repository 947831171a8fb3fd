//! Active window resolution — which window(s) a fixation most likely hit.
//!
//! Filters a snapshot down to the windows under the gaze point, keeps the
//! two frontmost with a single streaming pass over the z-order oracle, and
//! reports the one behind as a second candidate only when the front window
//! leaves enough of it uncovered.

use crate::config::ResolverConfig;

use super::geometry::GazePoint;
use super::snapshot::WindowSnapshot;
use super::zorder::ZOrderOracle;

/// Resolves a gaze point against a window snapshot.
#[derive(Debug, Clone)]
pub struct ActiveWindowResolver {
    overlap_threshold: f64,
}

impl ActiveWindowResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            overlap_threshold: config.overlap_threshold,
        }
    }

    /// Return up to two titles, frontmost first.
    ///
    /// - No window under `point` → empty (background or off-screen).
    /// - One window → that title.
    /// - Several → the topmost, followed by the next one down if the
    ///   topmost covers less than the overlap threshold of it.
    pub fn resolve<O, I>(&self, oracle: &O, snapshot: I, point: GazePoint) -> Vec<String>
    where
        O: ZOrderOracle + ?Sized,
        I: IntoIterator<Item = WindowSnapshot>,
    {
        let mut candidates = snapshot.into_iter().filter(|w| w.rect.contains(point));

        let Some(first) = candidates.next() else {
            return Vec::new();
        };
        let Some(second) = candidates.next() else {
            return vec![first.title];
        };

        let (mut champion, mut runner_up) = if is_above(oracle, &second, &first) {
            (second, first)
        } else {
            (first, second)
        };

        for candidate in candidates {
            if is_above(oracle, &candidate, &champion) {
                let previous = std::mem::replace(&mut champion, candidate);
                if is_above(oracle, &previous, &runner_up) {
                    runner_up = previous;
                }
            } else if is_above(oracle, &candidate, &runner_up) {
                runner_up = candidate;
            }
        }

        let overlap = champion.rect.overlap_percent(&runner_up.rect);
        tracing::debug!(
            champion = %champion.title,
            runner_up = %runner_up.title,
            overlap,
            "resolved overlapping windows"
        );

        if overlap < self.overlap_threshold {
            vec![champion.title, runner_up.title]
        } else {
            vec![champion.title]
        }
    }
}

/// Oracle query that never fails: a fault is logged and answered `false`,
/// which leaves the current ordering as it is.
fn is_above<O>(oracle: &O, a: &WindowSnapshot, b: &WindowSnapshot) -> bool
where
    O: ZOrderOracle + ?Sized,
{
    match oracle.is_above(a.handle, b.handle) {
        Ok(above) => above,
        Err(e) => {
            tracing::warn!(
                a = %a.handle,
                b = %b.handle,
                error = %e,
                "z-order resolution fault, keeping current order"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::resolver::geometry::Rect;
    use crate::resolver::snapshot::WindowHandle;
    use crate::resolver::zorder::StackingOrder;
    use crate::resolver::ResolverError;

    fn window(id: u32, title: &str, rect: Rect) -> WindowSnapshot {
        WindowSnapshot {
            handle: WindowHandle(id),
            title: title.into(),
            rect,
        }
    }

    fn stacking(front_to_back: &[u32]) -> StackingOrder {
        StackingOrder::front_to_back(front_to_back.iter().map(|&id| WindowHandle(id)).collect())
    }

    fn resolver() -> ActiveWindowResolver {
        ActiveWindowResolver::new(&ResolverConfig::default())
    }

    /// Counts queries and fails every one of them.
    struct BrokenOracle {
        queries: Cell<u32>,
    }

    impl ZOrderOracle for BrokenOracle {
        fn is_above(&self, a: WindowHandle, b: WindowHandle) -> Result<bool, ResolverError> {
            self.queries.set(self.queries.get() + 1);
            Err(ResolverError::NotStacked { a, b })
        }
    }

    /// Delegates to a stacking order and counts queries.
    struct CountingOracle {
        inner: StackingOrder,
        queries: Cell<u32>,
    }

    impl ZOrderOracle for CountingOracle {
        fn is_above(&self, a: WindowHandle, b: WindowHandle) -> Result<bool, ResolverError> {
            self.queries.set(self.queries.get() + 1);
            self.inner.is_above(a, b)
        }
    }

    #[test]
    fn point_outside_every_window_is_empty() {
        let windows = vec![
            window(1, "Doc", Rect::new(0, 0, 100, 100)),
            window(2, "Mail", Rect::new(200, 0, 100, 100)),
        ];
        let titles = resolver().resolve(&stacking(&[1, 2]), windows, GazePoint::new(150, 50));
        assert!(titles.is_empty());
    }

    #[test]
    fn empty_snapshot_is_empty() {
        let titles = resolver().resolve(&stacking(&[]), Vec::new(), GazePoint::new(0, 0));
        assert!(titles.is_empty());
    }

    #[test]
    fn single_covering_window() {
        let windows = vec![
            window(1, "Doc", Rect::new(0, 0, 100, 100)),
            window(2, "Mail", Rect::new(200, 0, 100, 100)),
        ];
        let titles = resolver().resolve(&stacking(&[2, 1]), windows, GazePoint::new(250, 10));
        assert_eq!(titles, vec!["Mail"]);
    }

    #[test]
    fn heavy_overlap_returns_only_topmost() {
        // Front covers 100% of back.
        let windows = vec![
            window(1, "Back", Rect::new(10, 10, 50, 50)),
            window(2, "Front", Rect::new(0, 0, 200, 200)),
        ];
        let titles = resolver().resolve(&stacking(&[2, 1]), windows, GazePoint::new(20, 20));
        assert_eq!(titles, vec!["Front"]);
    }

    #[test]
    fn light_overlap_returns_both_front_first() {
        // Front covers 25% of back.
        let windows = vec![
            window(1, "Front", Rect::new(0, 0, 100, 100)),
            window(2, "Back", Rect::new(50, 50, 100, 100)),
        ];
        let titles = resolver().resolve(&stacking(&[1, 2]), windows, GazePoint::new(60, 60));
        assert_eq!(titles, vec!["Front", "Back"]);
    }

    #[test]
    fn two_candidates_are_ordered_by_the_oracle() {
        // Snapshot order puts the back window first.
        let windows = vec![
            window(1, "Back", Rect::new(50, 50, 100, 100)),
            window(2, "Front", Rect::new(0, 0, 100, 100)),
        ];
        let titles = resolver().resolve(&stacking(&[2, 1]), windows, GazePoint::new(60, 60));
        assert_eq!(titles, vec!["Front", "Back"]);
    }

    #[test]
    fn overlap_at_threshold_attributes_to_front() {
        // 33 x 100 strip over a 100 x 100 back window: exactly 33%.
        let windows = vec![
            window(1, "Front", Rect::new(0, 0, 33, 100)),
            window(2, "Back", Rect::new(0, 0, 100, 100)),
        ];
        let titles = resolver().resolve(&stacking(&[1, 2]), windows, GazePoint::new(10, 10));
        assert_eq!(titles, vec!["Front"]);
    }

    #[test]
    fn threshold_is_configurable() {
        let windows = vec![
            window(1, "Front", Rect::new(0, 0, 100, 100)),
            window(2, "Back", Rect::new(50, 50, 100, 100)),
        ];
        let strict = ActiveWindowResolver::new(&ResolverConfig {
            overlap_threshold: 20.0,
        });
        let titles = strict.resolve(&stacking(&[1, 2]), windows, GazePoint::new(60, 60));
        assert_eq!(titles, vec!["Front"]);
    }

    #[test]
    fn picks_two_frontmost_of_many() {
        let big = Rect::new(0, 0, 100, 100);
        let windows = vec![
            window(1, "W1", big),
            window(2, "W2", Rect::new(0, 0, 30, 100)),
            window(3, "W3", big),
            window(4, "W4", big),
            window(5, "W5", big),
        ];
        // W2 is frontmost but covers only 30% of W4 behind it.
        let oracle = CountingOracle {
            inner: stacking(&[2, 4, 1, 5, 3]),
            queries: Cell::new(0),
        };
        let titles = resolver().resolve(&oracle, windows, GazePoint::new(5, 5));
        assert_eq!(titles, vec!["W2", "W4"]);
        // One query for the initial pair, at most two per remaining window.
        assert!(oracle.queries.get() <= 1 + 2 * 3);
    }

    #[test]
    fn every_stacking_permutation_finds_the_top_two() {
        let big = Rect::new(0, 0, 100, 100);
        let small = Rect::new(0, 0, 10, 100);
        let ids = [1u32, 2, 3, 4];
        let mut perms = Vec::new();
        permute(&mut ids.to_vec(), 0, &mut perms);

        for perm in perms {
            // The frontmost is narrow so the runner-up is always reported.
            let windows: Vec<_> = ids
                .iter()
                .map(|&id| {
                    let rect = if id == perm[0] { small } else { big };
                    window(id, &format!("W{id}"), rect)
                })
                .collect();
            let titles = resolver().resolve(&stacking(&perm), windows, GazePoint::new(1, 1));
            assert_eq!(
                titles,
                vec![format!("W{}", perm[0]), format!("W{}", perm[1])],
                "stacking {perm:?}"
            );
        }
    }

    fn permute(ids: &mut Vec<u32>, k: usize, out: &mut Vec<Vec<u32>>) {
        if k == ids.len() {
            out.push(ids.clone());
            return;
        }
        for i in k..ids.len() {
            ids.swap(k, i);
            permute(ids, k + 1, out);
            ids.swap(k, i);
        }
    }

    #[test]
    fn oracle_faults_keep_snapshot_order() {
        let windows = vec![
            window(1, "First", Rect::new(0, 0, 10, 100)),
            window(2, "Second", Rect::new(0, 0, 100, 100)),
            window(3, "Third", Rect::new(0, 0, 100, 100)),
        ];
        let oracle = BrokenOracle {
            queries: Cell::new(0),
        };
        let titles = resolver().resolve(&oracle, windows, GazePoint::new(1, 1));
        assert_eq!(titles, vec!["First", "Second"]);
        assert!(oracle.queries.get() > 0);
    }
}
