//! Production KPIs: throughput, WIP, lead time, OEE and the bottleneck.
//!
//! [`KpiTracker`] keeps the few pieces of history the KPIs need (completion
//! times in the trailing window, recent lead times, the sampled series) and
//! recomputes a [`GlobalStats`] record from current station loads on every
//! `update()`.
//!
//! All factors are percentages in `[0, 100]`:
//!
//! - Availability = (busy + blocked time) / (stations x elapsed)
//! - Performance = rate throughput / (stations x reference rate), capped at 100
//! - Quality = good completions / all completions (100 before any completion)
//! - OEE = A x P x Q / 10 000
//!
//! Elapsed time is measured from the last statistics reset and floored at one
//! second for every division.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::entity::Classification;
use crate::fixed::{SimTime, to_f64};
use crate::id::EntityId;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Cap on the completion log kept for inspection.
const COMPLETION_LOG_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// Line-wide statistics at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Simulated clock, seconds.
    pub time: f64,
    /// Seconds since the last statistics reset (floored at 1).
    pub elapsed: f64,
    pub throughput_per_hour: f64,
    /// Completions within the trailing window.
    pub throughput_window: u64,
    pub wip: u64,
    /// Mean creation-to-completion span of recent good completions, seconds.
    pub avg_lead_time: f64,
    pub completed: u64,
    pub good: u64,
    pub scrapped: u64,
    pub generated: u64,
    pub oee: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub bottleneck: Option<String>,
    pub bottleneck_utilization: f64,
}

/// One point of the KPI time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub time: f64,
    pub throughput_per_hour: f64,
    pub throughput_window: u64,
    pub wip: u64,
    pub avg_lead_time: f64,
    pub oee: f64,
    pub bottleneck_utilization: f64,
}

impl From<&GlobalStats> for HistorySample {
    fn from(s: &GlobalStats) -> Self {
        Self {
            time: s.time,
            throughput_per_hour: s.throughput_per_hour,
            throughput_window: s.throughput_window,
            wip: s.wip,
            avg_lead_time: s.avg_lead_time,
            oee: s.oee,
            bottleneck_utilization: s.bottleneck_utilization,
        }
    }
}

/// A finished entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub entity: EntityId,
    pub created_at: SimTime,
    pub completed_at: SimTime,
    pub classification: Classification,
}

/// Per-station load fed into [`KpiTracker::compute`].
#[derive(Debug, Clone, Copy)]
pub struct StationLoad<'a> {
    pub name: &'a str,
    /// Process or Quality; only these can be the bottleneck.
    pub workstation: bool,
    pub busy_time: SimTime,
    pub blocked_time: SimTime,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct KpiTracker {
    window: SimTime,
    history_interval: SimTime,
    history_capacity: usize,
    lead_time_samples: usize,
    performance_reference: f64,

    /// Start of the current statistics period.
    epoch: SimTime,
    /// WIP present when the period started.
    wip_baseline: u64,

    generated: u64,
    completed: u64,
    good: u64,
    scrapped: u64,

    /// Completion times inside the trailing window, oldest first.
    recent: VecDeque<SimTime>,
    /// Lead times of the most recent good completions.
    lead_times: VecDeque<SimTime>,
    completions: VecDeque<CompletionRecord>,
    history: VecDeque<HistorySample>,
    last_sample: Option<SimTime>,
}

impl KpiTracker {
    pub fn new(
        window: SimTime,
        history_interval: SimTime,
        history_capacity: usize,
        lead_time_samples: usize,
        performance_reference: f64,
    ) -> Self {
        Self {
            window,
            history_interval,
            history_capacity: history_capacity.max(1),
            lead_time_samples: lead_time_samples.max(1),
            performance_reference,
            epoch: SimTime::ZERO,
            wip_baseline: 0,
            generated: 0,
            completed: 0,
            good: 0,
            scrapped: 0,
            recent: VecDeque::new(),
            lead_times: VecDeque::new(),
            completions: VecDeque::new(),
            history: VecDeque::new(),
            last_sample: None,
        }
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    pub fn record_generated(&mut self, count: u64) {
        self.generated += count;
    }

    pub fn record_scrapped(&mut self) {
        self.scrapped += 1;
    }

    pub fn record_completion(&mut self, record: CompletionRecord) {
        self.completed += 1;
        self.recent.push_back(record.completed_at);
        if record.classification == Classification::Good {
            self.good += 1;
            self.lead_times
                .push_back(record.completed_at - record.created_at);
            while self.lead_times.len() > self.lead_time_samples {
                self.lead_times.pop_front();
            }
        }
        self.completions.push_back(record);
        while self.completions.len() > COMPLETION_LOG_CAPACITY {
            self.completions.pop_front();
        }
    }

    /// Zero every counter and series; the new period starts at `now` with
    /// `wip` entities already in the line.
    pub fn reset(&mut self, now: SimTime, wip: u64) {
        self.epoch = now;
        self.wip_baseline = wip;
        self.generated = 0;
        self.completed = 0;
        self.good = 0;
        self.scrapped = 0;
        self.recent.clear();
        self.lead_times.clear();
        self.completions.clear();
        self.history.clear();
        self.last_sample = None;
    }

    // -----------------------------------------------------------------------
    // Aggregation
    // -----------------------------------------------------------------------

    /// Seconds since the period start, floored at one.
    pub fn elapsed(&self, now: SimTime) -> f64 {
        to_f64(now - self.epoch).max(1.0)
    }

    /// Recompute line-wide statistics.
    pub fn compute(&mut self, now: SimTime, wip: u64, stations: &[StationLoad<'_>]) -> GlobalStats {
        let horizon = now - self.window;
        while self.recent.front().is_some_and(|&t| t <= horizon) {
            self.recent.pop_front();
        }

        let elapsed = self.elapsed(now);
        let throughput_per_hour = self.completed as f64 / elapsed * SECONDS_PER_HOUR;

        let avg_lead_time = if self.lead_times.is_empty() {
            0.0
        } else {
            self.lead_times.iter().map(|&t| to_f64(t)).sum::<f64>() / self.lead_times.len() as f64
        };

        let mut bottleneck: Option<(&str, f64)> = None;
        let mut loaded = 0.0;
        for s in stations {
            loaded += to_f64(s.busy_time) + to_f64(s.blocked_time);
            if s.workstation {
                let utilization = utilization(s.busy_time, elapsed);
                if bottleneck.is_none_or(|(_, best)| utilization > best) {
                    bottleneck = Some((s.name, utilization));
                }
            }
        }

        let n = stations.len() as f64;
        let (availability, performance) = if stations.is_empty() {
            (0.0, 0.0)
        } else {
            (
                (loaded / (n * elapsed) * 100.0).clamp(0.0, 100.0),
                (throughput_per_hour / (n * self.performance_reference) * 100.0).clamp(0.0, 100.0),
            )
        };
        let quality = if self.completed == 0 {
            100.0
        } else {
            self.good as f64 / self.completed as f64 * 100.0
        };

        GlobalStats {
            time: to_f64(now),
            elapsed,
            throughput_per_hour,
            throughput_window: self.recent.len() as u64,
            wip,
            avg_lead_time,
            completed: self.completed,
            good: self.good,
            scrapped: self.scrapped,
            generated: self.generated,
            oee: availability * performance * quality / 10_000.0,
            availability,
            performance,
            quality,
            bottleneck: bottleneck.map(|(name, _)| name.to_string()),
            bottleneck_utilization: bottleneck.map_or(0.0, |(_, u)| u),
        }
    }

    /// Append a history sample if at least one interval has passed since the
    /// previous one. Returns whether a sample was taken.
    pub fn maybe_sample(&mut self, now: SimTime, stats: &GlobalStats) -> bool {
        if let Some(last) = self.last_sample {
            if now - last < self.history_interval {
                return false;
            }
        }
        self.history.push_back(HistorySample::from(stats));
        while self.history.len() > self.history_capacity {
            self.history.pop_front();
        }
        self.last_sample = Some(now);
        true
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn epoch(&self) -> SimTime {
        self.epoch
    }

    pub fn wip_baseline(&self) -> u64 {
        self.wip_baseline
    }

    pub fn generated(&self) -> u64 {
        self.generated
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn scrapped(&self) -> u64 {
        self.scrapped
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistorySample> + '_ {
        self.history.iter()
    }

    /// Most recent completions, oldest first.
    pub fn completions(&self) -> impl ExactSizeIterator<Item = &CompletionRecord> + '_ {
        self.completions.iter()
    }
}

/// Busy share of elapsed time, in percent.
pub fn utilization(busy: SimTime, elapsed: f64) -> f64 {
    (to_f64(busy) / elapsed.max(1.0) * 100.0).clamp(0.0, 100.0)
}
