use super::{evaluate, Outcome, Strategy, StrategyKind};
use crate::error::BenchError;
use crate::partition::Group;
use crate::worker::{WorkerCommand, WorkerProcess};
use crate::workload::Workload;
use crossbeam::channel::bounded;
use rayon::prelude::*;
use std::io;

#[derive(Debug, Clone)]
pub enum Backend {
    Threads,
    /// Each rayon job borrows an idle worker process for its group.
    Processes(WorkerCommand),
}

/// Hands the per-group dispatch to rayon on a dedicated pool.
pub struct ParallelMap {
    workers: usize,
    backend: Backend,
}

impl ParallelMap {
    pub fn threads(workers: usize) -> Self {
        Self {
            workers,
            backend: Backend::Threads,
        }
    }

    pub fn processes(workers: usize, command: WorkerCommand) -> Self {
        Self {
            workers,
            backend: Backend::Processes(command),
        }
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool, BenchError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("primebench-rayon-{}", i))
            .build()
            .map_err(|e| {
                BenchError::resource_exhaustion(self.label(), "rayon thread pool", io::Error::new(io::ErrorKind::Other, e))
            })
    }

    fn run_on_processes(
        &self,
        pool: &rayon::ThreadPool,
        command: &WorkerCommand,
        groups: &[Group],
        workload: Workload,
    ) -> Result<Outcome, BenchError> {
        let label = self.label();
        let size = self.workers.min(groups.len());
        let processes = WorkerProcess::spawn_many(command, size)
            .map_err(|e| BenchError::resource_exhaustion(label, format!("{} worker processes", size), e))?;

        let (idle_tx, idle_rx) = bounded(size.max(1));
        for process in processes {
            let _ = idle_tx.send(process);
        }

        let results: Vec<(usize, io::Result<Result<Vec<bool>, String>>)> = pool.install(|| {
            groups
                .par_iter()
                .map(|group| {
                    let Ok(mut process) = idle_rx.recv() else {
                        let closed = io::Error::new(io::ErrorKind::BrokenPipe, "no idle worker process");
                        return (group.index, Err(closed));
                    };
                    let result = process.evaluate(group, workload);
                    let _ = idle_tx.send(process);
                    (group.index, result)
                })
                .collect()
        });

        drop(idle_tx);
        idle_rx.try_iter().for_each(WorkerProcess::shutdown);

        let mut outcome = Outcome::default();
        for (index, result) in results {
            match result {
                Ok(result) => outcome.record(label, index, result),
                Err(e) => outcome
                    .failures
                    .push(BenchError::resource_exhaustion(label, format!("group {}", index), e)),
            }
        }
        Ok(outcome)
    }
}

impl Strategy for ParallelMap {
    fn kind(&self) -> StrategyKind {
        match self.backend {
            Backend::Threads => StrategyKind::ParallelMapThreads,
            Backend::Processes(_) => StrategyKind::ParallelMapProcesses,
        }
    }

    fn run(&self, groups: &[Group], workload: Workload) -> Result<Outcome, BenchError> {
        if self.workers == 0 {
            return Err(BenchError::invalid_configuration("library_workers", 0));
        }
        let pool = self.build_pool()?;
        log::debug!("{}: {} rayon threads for {} groups", self.label(), pool.current_num_threads(), groups.len());

        match &self.backend {
            Backend::Threads => {
                let results: Vec<(usize, Result<Vec<bool>, String>)> = pool.install(|| {
                    groups
                        .par_iter()
                        .map(|group| (group.index, evaluate(group.values(), workload)))
                        .collect()
                });

                let mut outcome = Outcome::default();
                for (index, result) in results {
                    outcome.record(self.label(), index, result);
                }
                Ok(outcome)
            }
            Backend::Processes(command) => self.run_on_processes(&pool, command, groups, workload),
        }
    }
}
