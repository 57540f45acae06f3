use super::{evaluate, panic_message, Outcome, Strategy, StrategyKind};
use crate::error::BenchError;
use crate::partition::Group;
use crate::workload::Workload;
use std::hint::black_box;
use std::thread;

/// One fresh OS thread per group, with no upper bound.
///
/// By default the threads are detached and `run` returns as soon as the last
/// one is spawned, so the measured time covers spawning only while the work
/// keeps running in the background. Strict mode joins them instead.
pub struct ThreadPerGroup {
    strict: bool,
}

impl ThreadPerGroup {
    pub fn detached() -> Self {
        Self { strict: false }
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl Strategy for ThreadPerGroup {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ThreadPerGroup
    }

    fn label(&self) -> &'static str {
        if self.strict {
            "thread_per_group_strict"
        } else {
            "thread_per_group"
        }
    }

    fn run(&self, groups: &[Group], workload: Workload) -> Result<Outcome, BenchError> {
        let label = self.label();
        let mut outcome = Outcome::default();
        let mut handles = Vec::new();

        for group in groups {
            let owned = group.clone();
            let spawned = thread::Builder::new()
                .name(format!("primebench-group-{}", group.index))
                .spawn(move || black_box(evaluate(owned.values(), workload)));

            match spawned {
                Ok(handle) if self.strict => handles.push((group.index, handle)),
                Ok(_detached) => {}
                Err(e) => outcome
                    .failures
                    .push(BenchError::resource_exhaustion(label, format!("group {}", group.index), e)),
            }
        }

        if !self.strict {
            log::debug!(
                "{}: {} threads left running without a join",
                label,
                groups.len() - outcome.failures.len()
            );
        }

        for (index, handle) in handles {
            match handle.join() {
                Ok(result) => outcome.record(label, index, result),
                Err(payload) => outcome
                    .failures
                    .push(BenchError::worker_failure(label, index, panic_message(payload))),
            }
        }

        Ok(outcome)
    }
}
