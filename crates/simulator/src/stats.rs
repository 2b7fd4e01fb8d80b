//! Per-run statistics.

use crate::computer::Computer;
use crate::message::Message;
use crate::network::percentage;
use hdrhistogram::Histogram;
use netsim_core::SimTime;
use netsim_simulation::Station;
use serde::Serialize;

/// How one computer spent the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub computer: Computer,
    pub received: u64,
    pub processed: u64,
    /// Messages still queued at the end of the run.
    pub waiting: usize,
    pub peak_queue_len: usize,
    pub busy_time: f64,
    pub busy_percentage: f64,
}

impl StationSummary {
    pub(crate) fn new(computer: Computer, station: &Station<Message>, now: SimTime) -> Self {
        let busy_time = station.busy_time_at(now);
        Self {
            computer,
            received: station.received(),
            processed: station.processed(),
            waiting: station.queue_len(),
            peak_queue_len: station.peak_queue_len(),
            busy_time,
            busy_percentage: percentage(busy_time, now.as_secs()),
        }
    }
}

/// Time-in-system percentiles, in seconds.
///
/// Recorded in milliseconds with three significant figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePercentiles {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub max: f64,
}

impl TimePercentiles {
    /// `None` when there are no samples.
    fn from_secs(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut histogram = Histogram::<u64>::new(3).ok()?;
        for secs in samples {
            histogram.saturating_record((secs * 1000.0).round() as u64);
        }
        let secs = |millis: u64| millis as f64 / 1000.0;
        Some(Self {
            p50: secs(histogram.value_at_quantile(0.50)),
            p90: secs(histogram.value_at_quantile(0.90)),
            p99: secs(histogram.value_at_quantile(0.99)),
            max: secs(histogram.max()),
        })
    }
}

/// Messages that left the system one way (sent from a source, or rejected).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub count: u64,
    pub avg_time_in_system: Option<f64>,
    pub avg_wait: Option<f64>,
    /// Share of the time in system spent waiting in queues.
    pub efficiency_coefficient: Option<f64>,
    pub time_in_system: Option<TimePercentiles>,
}

impl ClassSummary {
    pub(crate) fn from_samples(times_in_system: &[f64], waits: &[f64]) -> Self {
        let avg_time_in_system = mean(times_in_system);
        let avg_wait = mean(waits);
        let efficiency_coefficient = match (avg_wait, avg_time_in_system) {
            (Some(wait), Some(total)) if total > 0.0 => Some(wait / total),
            _ => None,
        };
        Self {
            count: times_in_system.len() as u64,
            avg_time_in_system,
            avg_wait,
            efficiency_coefficient,
            time_in_system: TimePercentiles::from_secs(times_in_system),
        }
    }
}

/// Everything measured in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Clock at termination.
    pub simulated_time: f64,
    pub stations: Vec<StationSummary>,
    pub sent_from_worker: ClassSummary,
    pub sent_from_lazy: ClassSummary,
    pub rejected: ClassSummary,
    /// Time all three computers were busy at once.
    pub joint_work_time: f64,
    pub joint_work_percentage: f64,
}

impl RunSummary {
    pub fn station(&self, computer: Computer) -> Option<&StationSummary> {
        self.stations.iter().find(|s| s.computer == computer)
    }

    /// Messages sent out through the master.
    pub fn sent(&self) -> u64 {
        self.sent_from_worker.count + self.sent_from_lazy.count
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
