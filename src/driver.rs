//! Runs each configured strategy once, in a fixed order, against the same
//! groups.

use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::partition::{chunk, dataset, Group};
use crate::profile::{profile, Measurement, MeasurementSink};
use crate::strategy::{
    Cooperative, Outcome, ParallelMap, ProcessPool, Sequential, Strategy, StrategyKind, ThreadPerGroup,
    ThreadPoolStrategy,
};
use crate::worker::WorkerCommand;
use crate::workload::Workload;
use colored::Colorize;

/// Result of one timed strategy run.
#[derive(Debug)]
pub struct StrategyReport {
    pub kind: StrategyKind,
    pub measurement: Measurement,
    pub outcome: Result<Outcome, BenchError>,
}

impl StrategyReport {
    pub fn label(&self) -> &str {
        &self.measurement.label
    }

    pub fn completed(&self) -> usize {
        self.outcome.as_ref().map_or(0, |o| o.completed.len())
    }

    pub fn failures(&self) -> usize {
        match &self.outcome {
            Ok(outcome) => outcome.failures.len(),
            Err(_) => 1,
        }
    }
}

pub struct Driver {
    config: BenchConfig,
    groups: Vec<Group>,
    workload: Workload,
    worker_command: WorkerCommand,
}

impl Driver {
    /// Builds the dataset and partitions it. Fails before any worker exists
    /// if the group size is invalid.
    pub fn new(config: BenchConfig) -> Result<Self, BenchError> {
        let groups = chunk(dataset(config.dataset_size), config.group_size)?;
        Ok(Driver {
            config,
            groups,
            workload: Workload::PRIME,
            worker_command: WorkerCommand::current_exe()?,
        })
    }

    pub fn with_worker_command(mut self, command: WorkerCommand) -> Self {
        self.worker_command = command;
        self
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = workload;
        self
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn strategy(&self, kind: StrategyKind) -> Box<dyn Strategy> {
        let config = &self.config;
        match kind {
            StrategyKind::ProcessPool => Box::new(ProcessPool::new(config.process_workers, self.worker_command.clone())),
            StrategyKind::ThreadPool => Box::new(ThreadPoolStrategy::new(config.thread_workers)),
            StrategyKind::ThreadPerGroup if config.strict_thread_per_group => Box::new(ThreadPerGroup::strict()),
            StrategyKind::ThreadPerGroup => Box::new(ThreadPerGroup::detached()),
            StrategyKind::Cooperative => Box::new(Cooperative),
            StrategyKind::Sequential => Box::new(Sequential),
            StrategyKind::ParallelMapProcesses => {
                Box::new(ParallelMap::processes(config.library_workers, self.worker_command.clone()))
            }
            StrategyKind::ParallelMapThreads => Box::new(ParallelMap::threads(config.library_workers)),
        }
    }

    /// Runs one strategy under the timer.
    pub fn run_one(&self, kind: StrategyKind, sink: &dyn MeasurementSink) -> StrategyReport {
        let strategy = self.strategy(kind);
        let (outcome, measurement) = profile(strategy.label(), sink, || strategy.run(&self.groups, self.workload));
        StrategyReport {
            kind,
            measurement,
            outcome,
        }
    }

    /// Runs every enabled strategy. A failing strategy is reported on stderr
    /// and the next one still runs.
    pub fn run(&self, sink: &dyn MeasurementSink) -> Vec<StrategyReport> {
        log::info!(
            "{} values in {} groups of {}",
            self.config.dataset_size,
            self.groups.len(),
            self.config.group_size
        );

        StrategyKind::ALL
            .into_iter()
            .filter(|kind| self.config.strategies.contains(kind))
            .map(|kind| {
                let report = self.run_one(kind, sink);
                report_failures(&report);
                report
            })
            .collect()
    }
}

fn report_failures(report: &StrategyReport) {
    match &report.outcome {
        Ok(outcome) => {
            log::debug!("{}: {} groups completed", report.label(), outcome.completed.len());
            for failure in &outcome.failures {
                log::warn!("{}", failure);
                eprintln!("{} {}", "warning:".yellow().bold(), failure);
            }
        }
        Err(err) => {
            log::warn!("{} failed: {}", report.label(), err);
            eprintln!("{} {} failed: {}", "error:".red().bold(), report.label(), err);
        }
    }
}
