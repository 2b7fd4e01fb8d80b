//! Batch report: per-run results plus across-run means.

use crate::computer::Computer;
use crate::error::SimulatorError;
use crate::stats::{mean, ClassSummary, RunSummary};
use netsim_simulation::{RunConfig, RunResult, RunStatus, StopReason};
use serde::Serialize;

/// One run, flattened for printing and serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run: u32,
    pub seed: u64,
    pub status: String,
    pub steps: u64,
    pub end_time: f64,
    pub discarded_events: usize,
    pub summary: Option<RunSummary>,
}

impl RunReport {
    fn new(result: &RunResult<RunSummary>) -> Self {
        Self {
            run: result.run,
            seed: result.seed,
            status: status_label(&result.status),
            steps: result.steps,
            end_time: result.end_time.as_secs(),
            discarded_events: result.discarded_events,
            summary: result.summary.clone(),
        }
    }
}

/// Means of one computer's busy time across runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMean {
    pub computer: Computer,
    pub busy_time: f64,
    pub busy_percentage: f64,
}

/// Means over every run that produced a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchMeans {
    pub summarized_runs: usize,
    pub sent_from_worker: f64,
    pub sent_from_lazy: f64,
    pub rejected: f64,
    pub avg_time_in_system_worker: Option<f64>,
    pub avg_time_in_system_lazy: Option<f64>,
    pub avg_wait_worker: Option<f64>,
    pub avg_wait_lazy: Option<f64>,
    pub efficiency_worker: Option<f64>,
    pub efficiency_lazy: Option<f64>,
    pub stations: Vec<StationMean>,
    pub joint_work_time: f64,
    pub joint_work_percentage: f64,
}

impl BatchMeans {
    fn new(summaries: &[&RunSummary]) -> Self {
        if summaries.is_empty() {
            return Self::default();
        }

        let over = |f: &dyn Fn(&RunSummary) -> f64| {
            let values: Vec<f64> = summaries.iter().map(|s| f(s)).collect();
            mean(&values).unwrap_or(0.0)
        };
        let over_some = |f: &dyn Fn(&RunSummary) -> Option<f64>| {
            let values: Vec<f64> = summaries.iter().filter_map(|s| f(s)).collect();
            mean(&values)
        };

        let stations = Computer::ALL
            .iter()
            .map(|&computer| StationMean {
                computer,
                busy_time: over(&|s| s.station(computer).map_or(0.0, |st| st.busy_time)),
                busy_percentage: over(&|s| {
                    s.station(computer).map_or(0.0, |st| st.busy_percentage)
                }),
            })
            .collect();

        Self {
            summarized_runs: summaries.len(),
            sent_from_worker: over(&|s| s.sent_from_worker.count as f64),
            sent_from_lazy: over(&|s| s.sent_from_lazy.count as f64),
            rejected: over(&|s| s.rejected.count as f64),
            avg_time_in_system_worker: over_some(&|s| s.sent_from_worker.avg_time_in_system),
            avg_time_in_system_lazy: over_some(&|s| s.sent_from_lazy.avg_time_in_system),
            avg_wait_worker: over_some(&|s| s.sent_from_worker.avg_wait),
            avg_wait_lazy: over_some(&|s| s.sent_from_lazy.avg_wait),
            efficiency_worker: over_some(&|s| s.sent_from_worker.efficiency_coefficient),
            efficiency_lazy: over_some(&|s| s.sent_from_lazy.efficiency_coefficient),
            stations,
            joint_work_time: over(&|s| s.joint_work_time),
            joint_work_percentage: over(&|s| s.joint_work_percentage),
        }
    }
}

/// Results of a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub runs: u32,
    pub time_horizon: f64,
    pub seed: u64,
    pub results: Vec<RunReport>,
    pub means: BatchMeans,
}

impl BatchReport {
    pub fn new(config: &RunConfig, results: &[RunResult<RunSummary>]) -> Self {
        let summaries: Vec<&RunSummary> =
            results.iter().filter_map(|r| r.summary.as_ref()).collect();
        Self {
            runs: config.run_count,
            time_horizon: config.time_horizon,
            seed: config.seed,
            results: results.iter().map(RunReport::new).collect(),
            means: BatchMeans::new(&summaries),
        }
    }

    /// Runs that ended with an engine or handler error.
    pub fn failed_runs(&self) -> usize {
        self.results.iter().filter(|r| r.summary.is_none()).count()
    }

    pub fn to_json(&self) -> Result<String, SimulatorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Print a human-readable report to stdout.
    pub fn print_summary(&self) {
        println!("\n═══════════════════════════════════════════");
        println!("      COMPUTER MESSAGE SYSTEM REPORT        ");
        println!("═══════════════════════════════════════════");
        println!();
        println!("Batch:");
        println!("  Runs:     {} ({} failed)", self.runs, self.failed_runs());
        println!("  Horizon:  {:.3}s", self.time_horizon);
        println!("  Seed:     {}", self.seed);

        for result in &self.results {
            println!();
            println!(
                "Run {} [{}] seed={} steps={}",
                result.run, result.status, result.seed, result.steps
            );
            let Some(summary) = &result.summary else {
                continue;
            };
            for station in &summary.stations {
                println!(
                    "  {:<7} received={:<5} processed={:<5} waiting={:<4} busy={:.3}s ({:.2}%)",
                    station.computer,
                    station.received,
                    station.processed,
                    station.waiting,
                    station.busy_time,
                    station.busy_percentage
                );
            }
            print_class("Sent from worker", &summary.sent_from_worker);
            print_class("Sent from lazy", &summary.sent_from_lazy);
            print_class("Rejected", &summary.rejected);
            println!(
                "  Joint work: {:.3}s ({:.2}%)",
                summary.joint_work_time, summary.joint_work_percentage
            );
        }

        let means = &self.means;
        println!();
        println!("Means over {} run(s):", means.summarized_runs);
        println!("  Sent from worker: {:.2}", means.sent_from_worker);
        println!("  Sent from lazy:   {:.2}", means.sent_from_lazy);
        println!("  Rejected:         {:.2}", means.rejected);
        println!(
            "  Time in system:   worker {} / lazy {}",
            secs(means.avg_time_in_system_worker),
            secs(means.avg_time_in_system_lazy)
        );
        println!(
            "  Wait:             worker {} / lazy {}",
            secs(means.avg_wait_worker),
            secs(means.avg_wait_lazy)
        );
        println!(
            "  Efficiency:       worker {} / lazy {}",
            ratio(means.efficiency_worker),
            ratio(means.efficiency_lazy)
        );
        for station in &means.stations {
            println!(
                "  Busy {:<7}      {:.3}s ({:.2}%)",
                station.computer, station.busy_time, station.busy_percentage
            );
        }
        println!(
            "  Joint work:       {:.3}s ({:.2}%)",
            means.joint_work_time, means.joint_work_percentage
        );
        println!("═══════════════════════════════════════════\n");
    }
}

fn print_class(label: &str, class: &ClassSummary) {
    let percentiles = class
        .time_in_system
        .map(|p| {
            format!(
                " p50={:.3}s p90={:.3}s p99={:.3}s max={:.3}s",
                p.p50, p.p90, p.p99, p.max
            )
        })
        .unwrap_or_default();
    println!(
        "  {label}: {} in system={} wait={} efficiency={}{percentiles}",
        class.count,
        secs(class.avg_time_in_system),
        secs(class.avg_wait),
        ratio(class.efficiency_coefficient)
    );
}

fn secs(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}s"))
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

fn status_label(status: &RunStatus) -> String {
    match status {
        RunStatus::Completed(StopReason::EndOfSimulation) => "completed".to_string(),
        RunStatus::Completed(StopReason::Drained) => "drained".to_string(),
        RunStatus::NonTerminating { max_steps } => format!("stopped after {max_steps} steps"),
        RunStatus::Failed(err) => format!("failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_core::{EngineError, EventKind, SimTime};

    fn summary(sent_from_worker: u64, joint_work_time: f64) -> RunSummary {
        let class = |count: u64| ClassSummary {
            count,
            avg_time_in_system: (count > 0).then_some(10.0),
            avg_wait: (count > 0).then_some(2.0),
            efficiency_coefficient: (count > 0).then_some(0.2),
            time_in_system: None,
        };
        RunSummary {
            simulated_time: 100.0,
            stations: Vec::new(),
            sent_from_worker: class(sent_from_worker),
            sent_from_lazy: class(0),
            rejected: class(0),
            joint_work_time,
            joint_work_percentage: joint_work_time,
        }
    }

    fn result(run: u32, status: RunStatus, summary: Option<RunSummary>) -> RunResult<RunSummary> {
        RunResult {
            run,
            seed: run as u64,
            status,
            steps: 10,
            end_time: SimTime::new(100.0).unwrap(),
            discarded_events: 0,
            summary,
        }
    }

    #[test]
    fn test_means_skip_failed_runs() {
        let completed = RunStatus::Completed(StopReason::EndOfSimulation);
        let results = vec![
            result(1, completed.clone(), Some(summary(4, 10.0))),
            result(
                2,
                RunStatus::Failed(EngineError::UnknownEventKind {
                    kind: EventKind::InternalArrival,
                    time: SimTime::ZERO,
                }),
                None,
            ),
            result(3, completed, Some(summary(2, 20.0))),
        ];

        let report = BatchReport::new(&RunConfig::new(3, 100.0, 9), &results);
        assert_eq!(report.failed_runs(), 1);
        assert_eq!(report.means.summarized_runs, 2);
        assert_eq!(report.means.sent_from_worker, 3.0);
        assert_eq!(report.means.joint_work_time, 15.0);
        assert_eq!(report.means.avg_time_in_system_worker, Some(10.0));
        assert_eq!(report.means.avg_time_in_system_lazy, None);
        assert!(report.results[1].status.starts_with("failed: no handler"));
    }

    #[test]
    fn test_json_report() {
        let results = vec![result(
            1,
            RunStatus::NonTerminating { max_steps: 10 },
            Some(summary(1, 0.0)),
        )];
        let json = BatchReport::new(&RunConfig::new(1, 100.0, 5), &results)
            .to_json()
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seed"], 5);
        assert_eq!(value["results"][0]["status"], "stopped after 10 steps");
        assert_eq!(value["means"]["sent_from_worker"], 1.0);
    }

    #[test]
    fn test_empty_batch_has_zero_means() {
        let report = BatchReport::new(&RunConfig::new(0, 10.0, 1), &[]);
        assert_eq!(report.means, BatchMeans::default());
    }
}
