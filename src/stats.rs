use serde::Serialize;

use crate::prober::{AttemptOutcome, OutcomeSink};

/// Totals for a run so far.
///
/// `loss_percent` is `None` until something was sent; the latency fields are
/// `None` until something was delivered. Nothing here divides by zero.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub sent: u64,
    pub delivered: u64,
    pub lost: u64,
    pub loss_percent: Option<u64>,
    pub min_millis: Option<u64>,
    pub max_millis: Option<u64>,
    pub avg_millis: Option<u64>,
}

impl RunSummary {
    /// No counted attempt resolved yet.
    pub fn is_empty(&self) -> bool {
        self.sent == 0
    }
}

/// Running reduction over outcomes. Constant memory, so unbounded runs are fine.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    sent: u64,
    delivered: u64,
    lost: u64,
    min: Option<u64>,
    max: Option<u64>,
    sum: u128,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, outcome: &AttemptOutcome) {
        self.sent += 1;
        if !outcome.delivered {
            self.lost += 1;
            return;
        }
        let d = outcome.delay_millis;
        self.delivered += 1;
        self.sum += u128::from(d);
        self.min = Some(self.min.map_or(d, |m| m.min(d)));
        self.max = Some(self.max.map_or(d, |m| m.max(d)));
    }

    pub fn summarize(&self) -> RunSummary {
        let loss_percent = (self.sent > 0).then(|| self.lost * 100 / self.sent);
        let avg_millis = (self.delivered > 0).then(|| (self.sum / u128::from(self.delivered)) as u64);
        RunSummary {
            sent: self.sent,
            delivered: self.delivered,
            lost: self.lost,
            loss_percent,
            min_millis: self.min,
            max_millis: self.max,
            avg_millis,
        }
    }
}

impl OutcomeSink for StatsAccumulator {
    fn on_outcome(&mut self, outcome: &AttemptOutcome) {
        self.observe(outcome);
    }
}
