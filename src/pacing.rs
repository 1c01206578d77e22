use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::config::Pacing;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Lookup,
    MatchDetail,
    Telemetry,
}

/// Serializes upstream calls by sleeping a fixed amount after each one.
/// Every upstream request in a run goes through `after_call`.
pub struct Pacer {
    pacing: Pacing,
    calls: usize,
}

impl Pacer {
    pub fn new(pacing: Pacing) -> Pacer {
        Pacer { pacing, calls: 0 }
    }

    pub fn delay_for(&self, kind: CallKind) -> Duration {
        match kind {
            CallKind::Lookup => self.pacing.lookup,
            CallKind::MatchDetail => self.pacing.match_detail,
            CallKind::Telemetry => self.pacing.telemetry,
        }
    }

    pub async fn after_call(&mut self, kind: CallKind) {
        self.calls += 1;
        let delay = self.delay_for(kind);
        if !delay.is_zero() {
            debug!(?kind, delay_ms = delay.as_millis() as u64, "pacing");
            sleep(delay).await;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

/// Wall-clock allowance for one run, checked before each new match.
#[derive(Clone, Copy, Debug)]
pub struct RunBudget {
    started: Instant,
    limit: Duration,
}

impl RunBudget {
    pub fn start(limit: Duration) -> RunBudget {
        RunBudget {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn exhausted(&self) -> bool {
        self.elapsed() >= self.limit
    }
}
