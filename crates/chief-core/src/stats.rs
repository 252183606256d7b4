//! Run statistics
//!
//! Stats are a side channel: they summarize a run and never influence
//! control flow.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};

use crate::reconcile::ActionOutcome;

/// Summary of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub created: usize,
    pub deleted: usize,
    pub updated: usize,
    /// Wall-clock duration of the pass
    pub elapsed: Duration,
    /// When the pass started
    pub started_at: DateTime<Utc>,
}

impl RunStats {
    /// Total number of mutations
    pub fn changes(&self) -> usize {
        self.created + self.deleted + self.updated
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} deleted={} elapsed={:?} started_at={}",
            self.created,
            self.updated,
            self.deleted,
            self.elapsed,
            self.started_at.to_rfc3339()
        )
    }
}

/// Accumulates outcomes into [`RunStats`]
#[derive(Debug, Clone)]
pub struct StatsCollector {
    started: Instant,
    started_at: DateTime<Utc>,
    created: usize,
    deleted: usize,
    updated: usize,
}

impl StatsCollector {
    /// Start the clock
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            created: 0,
            deleted: 0,
            updated: 0,
        }
    }

    /// Count one successful outcome
    pub fn record(&mut self, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Created { .. } => self.created += 1,
            ActionOutcome::Patched { .. } => self.updated += 1,
            ActionOutcome::Deleted { .. } => self.deleted += 1,
            ActionOutcome::NoOp { .. } | ActionOutcome::SkippedMissing { .. } => {}
        }
    }

    /// Current totals, with elapsed time measured now
    pub fn snapshot(&self) -> RunStats {
        RunStats {
            created: self.created,
            deleted: self.deleted,
            updated: self.updated,
            elapsed: self.started.elapsed(),
            started_at: self.started_at,
        }
    }
}
