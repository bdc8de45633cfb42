// tile-forge-app/src/progress.rs

use crate::config::ProgressLogLevel;
use anyhow::Result;
use log::Level;
use std::time::{Duration, Instant};
use wfc_core::{ProgressInfo, WfcError, WorldStatus};

/// Trait for reporting the progress of a generation run.
pub trait ProgressReporter: Send {
    /// Called after every step with updated progress information.
    fn report(&mut self, info: &ProgressInfo) -> Result<()>;

    /// Called when an attempt ends in a contradiction and another follows.
    fn retry(&mut self, attempt: u32, next_seed: u64) -> Result<()>;

    /// Called when the world is done.
    fn finish(&mut self, info: &ProgressInfo) -> Result<()>;

    /// Called when the run fails with an error.
    fn fail(&mut self, error: &WfcError) -> Result<()>;
}

impl From<ProgressLogLevel> for Level {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

/// Writes progress to the log, at most once per `interval`.
#[derive(Debug)]
pub struct LogProgressReporter {
    interval: Duration,
    level: Level,
    last_report: Option<Instant>,
    reports: u64,
}

impl LogProgressReporter {
    pub fn new(interval: Duration, level: ProgressLogLevel) -> Self {
        Self {
            interval,
            level: level.into(),
            last_report: None,
            reports: 0,
        }
    }

    /// Number of progress lines written so far.
    pub const fn reports(&self) -> u64 {
        self.reports
    }

    /// Whether a report is due at `now`. Marks the report as made if so.
    pub fn should_report(&mut self, now: Instant) -> bool {
        let due = self
            .last_report
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last_report = Some(now);
        }
        due
    }
}

fn percentage(info: &ProgressInfo) -> f32 {
    if info.total_cells > 0 {
        (info.collapsed_cells as f32 / info.total_cells as f32) * 100.0
    } else {
        100.0
    }
}

impl ProgressReporter for LogProgressReporter {
    fn report(&mut self, info: &ProgressInfo) -> Result<()> {
        if info.status != WorldStatus::Running || !self.should_report(Instant::now()) {
            return Ok(());
        }
        let elapsed_secs = info.elapsed_time.as_secs_f32();
        let collapse_rate = if elapsed_secs > 0.0 {
            info.collapsed_cells as f32 / elapsed_secs
        } else {
            0.0
        };
        log::log!(
            self.level,
            "Progress: step {}, collapsed {}/{} ({:.1}%), {:.0} cells/s",
            info.iterations,
            info.collapsed_cells,
            info.total_cells,
            percentage(info),
            collapse_rate
        );
        self.reports += 1;
        Ok(())
    }

    fn retry(&mut self, attempt: u32, next_seed: u64) -> Result<()> {
        log::warn!("Attempt {} hit a contradiction, retrying with seed {}", attempt, next_seed);
        self.last_report = None;
        Ok(())
    }

    fn finish(&mut self, info: &ProgressInfo) -> Result<()> {
        log::log!(
            self.level,
            "Finished: {} cells in {} steps ({:?})",
            info.total_cells,
            info.iterations,
            info.elapsed_time
        );
        Ok(())
    }

    fn fail(&mut self, error: &WfcError) -> Result<()> {
        log::error!("Generation failed: {}", error);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(collapsed: usize, status: WorldStatus) -> ProgressInfo {
        ProgressInfo {
            collapsed_cells: collapsed,
            total_cells: 16,
            elapsed_time: Duration::from_millis(10),
            iterations: collapsed as u64,
            status,
        }
    }

    #[test]
    fn throttles_to_the_interval() {
        let mut reporter = LogProgressReporter::new(Duration::from_secs(1), ProgressLogLevel::Info);
        let start = Instant::now();
        assert!(reporter.should_report(start));
        assert!(!reporter.should_report(start + Duration::from_millis(999)));
        assert!(reporter.should_report(start + Duration::from_secs(1)));
        assert!(!reporter.should_report(start + Duration::from_millis(1500)));
    }

    #[test]
    fn terminal_infos_are_not_progress() {
        let mut reporter = LogProgressReporter::new(Duration::from_millis(1), ProgressLogLevel::Debug);
        reporter.report(&info(16, WorldStatus::Done)).unwrap();
        reporter.report(&info(3, WorldStatus::Failed)).unwrap();
        assert_eq!(reporter.reports(), 0);
        reporter.report(&info(3, WorldStatus::Running)).unwrap();
        assert_eq!(reporter.reports(), 1);
    }

    #[test]
    fn retry_resets_the_throttle() {
        let mut reporter = LogProgressReporter::new(Duration::from_secs(3600), ProgressLogLevel::Info);
        reporter.report(&info(1, WorldStatus::Running)).unwrap();
        reporter.report(&info(2, WorldStatus::Running)).unwrap();
        assert_eq!(reporter.reports(), 1);
        reporter.retry(0, 8).unwrap();
        reporter.report(&info(1, WorldStatus::Running)).unwrap();
        assert_eq!(reporter.reports(), 2);
    }

    #[test]
    fn empty_grid_counts_as_complete() {
        let mut empty = info(0, WorldStatus::Running);
        empty.total_cells = 0;
        assert!((percentage(&empty) - 100.0).abs() < f32::EPSILON);
        assert!((percentage(&info(4, WorldStatus::Running)) - 25.0).abs() < f32::EPSILON);
    }
}
