//! Capture — turns the device event stream into persisted fixation records.
//!
//! [`CaptureContext`] owns everything a capture needs: the window system
//! handle, the resolver, the fixation builder and the log. It is created
//! when capture starts and consumed by [`CaptureContext::close`], so the
//! display connection and log file are released on every exit path.
//!
//! Each event is handled to completion (snapshot, resolve, append) before
//! the next one is read; a stop request is only observed between events.

pub mod builder;
pub mod event;

use std::io::{self, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::config::ResolverConfig;
use crate::record::log::FixationLog;
use crate::record::RecordError;
use crate::resolver::{ActiveWindowResolver, ResolverError, WindowSnapshotProvider, ZOrderOracle};

use self::builder::FixationRecordBuilder;
use self::event::{DeviceEvent, EventError, EventSource, FixationEvent, FixationPhase, Presence};

/// Fatal capture failure.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Events(#[from] EventError),
    #[error(transparent)]
    Windows(#[from] ResolverError),
    #[error(transparent)]
    Log(#[from] RecordError),
}

/// Why a capture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The device closed its event stream.
    EndOfStream,
    /// The tracker stopped seeing the user.
    UserAbsent,
    /// Stop requested (Ctrl-C).
    Cancelled,
}

/// Counters for one capture run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Records appended to the log.
    pub records: u64,
    /// Records appended without an observed Begin.
    pub orphaned_ends: u64,
    /// Fixations dropped because a new Begin arrived or capture stopped.
    pub discarded: u64,
    /// Records whose gaze point hit no window.
    pub background: u64,
    /// Host time spent in [`CaptureContext::run`].
    pub elapsed: Duration,
}

impl CaptureStats {
    /// Print the capture totals shown before the session summary.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "Recorded {} fixations ({} discarded).",
            self.records, self.discarded
        )?;
        writeln!(
            out,
            "Total time elapsed: {:.2} seconds.",
            self.elapsed.as_secs_f64()
        )?;
        writeln!(out)
    }
}

pub struct CaptureContext<W> {
    windows: W,
    resolver: ActiveWindowResolver,
    builder: FixationRecordBuilder,
    log: FixationLog,
    stats: CaptureStats,
}

impl<W> CaptureContext<W>
where
    W: WindowSnapshotProvider + ZOrderOracle,
{
    pub fn new(windows: W, config: &ResolverConfig, log: FixationLog) -> Self {
        Self {
            windows,
            resolver: ActiveWindowResolver::new(config),
            builder: FixationRecordBuilder::new(),
            log,
            stats: CaptureStats::default(),
        }
    }

    /// Feed one fixation event through the state machine, appending a
    /// record on End.
    pub async fn handle(&mut self, event: FixationEvent) -> Result<(), CaptureError> {
        match event.phase {
            FixationPhase::Begin => {
                if self.builder.begin(wall_clock(), event.timestamp, event.point) {
                    self.stats.discarded += 1;
                }
            }
            FixationPhase::Data => self.builder.data(event.point),
            FixationPhase::End => {
                // Fresh snapshot per fixation; windows change between events.
                let snapshot = match self.windows.snapshot() {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        if self.builder.cancel() {
                            self.stats.discarded += 1;
                        }
                        return Err(e.into());
                    }
                };

                let windows = &self.windows;
                let resolver = &self.resolver;
                let record = self.builder.end(event.timestamp, event.point, |point| {
                    resolver.resolve(windows, snapshot, point)
                });

                if !record.is_valid() {
                    self.stats.orphaned_ends += 1;
                }
                if record.primary.is_none() {
                    self.stats.background += 1;
                }

                tracing::debug!(
                    start = record.tracker_start,
                    end = record.tracker_end,
                    primary = record.primary.as_deref().unwrap_or(""),
                    secondary = record.secondary.as_deref().unwrap_or(""),
                    "fixation"
                );

                self.log.append(&record).await?;
                self.stats.records += 1;
            }
        }
        Ok(())
    }

    /// Read and handle events until the stream ends, the user leaves, or
    /// `cancel` fires. A fixation still open at that point is discarded.
    pub async fn run<R>(
        &mut self,
        events: &mut EventSource<R>,
        cancel: &CancellationToken,
    ) -> Result<StopReason, CaptureError>
    where
        R: AsyncRead + Unpin,
    {
        let started = Instant::now();
        let result = self.pump(events, cancel).await;
        self.stats.elapsed += started.elapsed();
        if self.builder.cancel() {
            self.stats.discarded += 1;
            tracing::debug!("in-flight fixation discarded at stop");
        }
        result
    }

    async fn pump<R>(
        &mut self,
        events: &mut EventSource<R>,
        cancel: &CancellationToken,
    ) -> Result<StopReason, CaptureError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = events.next_event() => Some(next),
            };
            let Some(next) = next else {
                return Ok(StopReason::Cancelled);
            };

            match next? {
                None => return Ok(StopReason::EndOfStream),
                Some(DeviceEvent::Presence(Presence::Present)) => {
                    tracing::debug!("user present");
                }
                Some(DeviceEvent::Presence(presence)) => {
                    tracing::info!(?presence, "user presence lost");
                    return Ok(StopReason::UserAbsent);
                }
                Some(DeviceEvent::Fixation(event)) => self.handle(event).await?,
            }
        }
    }

    /// Tear down: release the display handle and the log.
    pub fn close(self) -> CaptureStats {
        tracing::info!(
            path = %self.log.path().display(),
            records = self.log.written(),
            "capture closed"
        );
        self.stats
    }
}

/// Host clock in seconds since the Unix epoch.
fn wall_clock() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
