use super::{Outcome, Strategy, StrategyKind};
use crate::error::BenchError;
use crate::partition::Group;
use crate::worker::{WorkerCommand, WorkerProcess};
use crate::workload::Workload;
use crossbeam::channel::unbounded;
use std::thread;

/// Bounded pool of child processes, one feeder thread per child.
///
/// Every group is copied into the child and its results copied back; that
/// serialization is part of what gets timed.
pub struct ProcessPool {
    workers: usize,
    command: WorkerCommand,
}

impl ProcessPool {
    pub fn new(workers: usize, command: WorkerCommand) -> Self {
        Self { workers, command }
    }
}

impl Strategy for ProcessPool {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ProcessPool
    }

    fn run(&self, groups: &[Group], workload: Workload) -> Result<Outcome, BenchError> {
        let label = self.label();
        if self.workers == 0 {
            return Err(BenchError::invalid_configuration("process_workers", 0));
        }

        let size = self.workers.min(groups.len());
        let processes = WorkerProcess::spawn_many(&self.command, size)
            .map_err(|e| BenchError::resource_exhaustion(label, format!("{} worker processes", size), e))?;
        log::debug!("{}: {} processes for {} groups", label, processes.len(), groups.len());

        let (job_tx, job_rx) = unbounded::<&Group>();
        let (done_tx, done_rx) = unbounded();
        let mut outcome = Outcome::default();

        thread::scope(|s| {
            for mut process in processes {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                s.spawn(move || {
                    for group in job_rx.iter() {
                        let result = process.evaluate(group, workload);
                        if done_tx.send((group.index, result)).is_err() {
                            break;
                        }
                    }
                    process.shutdown();
                });
            }
            drop(done_tx);

            for group in groups {
                // The receiver above keeps the channel open, so this cannot fail.
                let _ = job_tx.send(group);
            }
            drop(job_tx);

            // Completion order, not submission order.
            for (index, result) in done_rx.iter() {
                match result {
                    Ok(result) => outcome.record(label, index, result),
                    Err(e) => outcome
                        .failures
                        .push(BenchError::resource_exhaustion(label, format!("group {}", index), e)),
                }
            }
        });

        Ok(outcome)
    }
}
