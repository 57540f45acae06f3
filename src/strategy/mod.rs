//! Interchangeable ways of applying a [`Workload`] to every [`Group`].
//!
//! Every strategy returns only after each group has been evaluated once,
//! except [`ThreadPerGroup`] in its default detached mode, which returns as
//! soon as the threads are spawned.

mod cooperative;
mod parallel_map;
mod process_pool;
mod sequential;
mod thread_per_group;
mod thread_pool;

pub use cooperative::Cooperative;
pub use parallel_map::{Backend, ParallelMap};
pub use process_pool::ProcessPool;
pub use sequential::Sequential;
pub use thread_per_group::ThreadPerGroup;
pub use thread_pool::{ThreadPool, ThreadPoolStrategy};

use crate::error::BenchError;
use crate::partition::Group;
use crate::workload::Workload;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum StrategyKind {
    ProcessPool,
    ThreadPool,
    ThreadPerGroup,
    Cooperative,
    Sequential,
    ParallelMapProcesses,
    ParallelMapThreads,
}

impl StrategyKind {
    /// Driver order.
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::ProcessPool,
        StrategyKind::ThreadPool,
        StrategyKind::ThreadPerGroup,
        StrategyKind::Cooperative,
        StrategyKind::Sequential,
        StrategyKind::ParallelMapProcesses,
        StrategyKind::ParallelMapThreads,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::ProcessPool => "process_pool",
            StrategyKind::ThreadPool => "thread_pool",
            StrategyKind::ThreadPerGroup => "thread_per_group",
            StrategyKind::Cooperative => "cooperative",
            StrategyKind::Sequential => "sequential",
            StrategyKind::ParallelMapProcesses => "parallel_map_processes",
            StrategyKind::ParallelMapThreads => "parallel_map_threads",
        }
    }
}

/// Per-element results of one group, in element order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub index: usize,
    pub values: Vec<bool>,
}

/// What a strategy observed while running.
///
/// Groups a strategy never waited on (detached threads) appear in neither
/// list.
#[derive(Debug, Default)]
pub struct Outcome {
    pub completed: Vec<GroupResult>,
    pub failures: Vec<BenchError>,
}

impl Outcome {
    pub fn record(&mut self, strategy: &str, index: usize, result: Result<Vec<bool>, String>) {
        match result {
            Ok(values) => self.completed.push(GroupResult { index, values }),
            Err(reason) => self
                .failures
                .push(BenchError::worker_failure(strategy, index, reason)),
        }
    }

    /// `(input, result)` pairs for every completed group, sorted by input.
    pub fn pairs(&self, groups: &[Group]) -> Vec<(i64, bool)> {
        let mut pairs: Vec<(i64, bool)> = self
            .completed
            .iter()
            .filter_map(|result| groups.get(result.index).map(|group| (group, result)))
            .flat_map(|(group, result)| group.values().iter().copied().zip(result.values.iter().copied()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Inputs classified `true` within one group.
    pub fn hits_in(&self, groups: &[Group], index: usize) -> Option<Vec<i64>> {
        let result = self.completed.iter().find(|r| r.index == index)?;
        let group = groups.get(index)?;
        Some(
            group
                .values()
                .iter()
                .zip(&result.values)
                .filter(|&(_, &hit)| hit)
                .map(|(&n, _)| n)
                .collect(),
        )
    }
}

pub trait Strategy {
    fn kind(&self) -> StrategyKind;

    fn label(&self) -> &'static str {
        self.kind().name()
    }

    fn run(&self, groups: &[Group], workload: Workload) -> Result<Outcome, BenchError>;
}

/// Applies `workload` to `values`, turning a panic into an error message.
pub fn evaluate(values: &[i64], workload: Workload) -> Result<Vec<bool>, String> {
    panic::catch_unwind(AssertUnwindSafe(|| workload.apply(values))).map_err(panic_message)
}

pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked with a non-string payload".to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::groups;
    use super::*;

    #[test]
    fn test_names_match_config_spelling() {
        for kind in StrategyKind::ALL {
            let quoted = format!("\"{}\"", kind.name());
            let parsed: StrategyKind = parse_kind(&quoted);
            assert_eq!(parsed, kind);
        }
    }

    fn parse_kind(quoted: &str) -> StrategyKind {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: StrategyKind,
        }
        let wrapper: Wrapper = toml::from_str(&format!("kind = {}", quoted)).unwrap();
        wrapper.kind
    }

    #[test]
    fn test_evaluate_catches_panics() {
        let workload = Workload::new("always_panics", |_| panic!("nope"));
        let err = evaluate(&[1, 2, 3], workload).unwrap_err();
        assert_eq!(err, "panicked: nope");
    }

    #[test]
    fn test_outcome_helpers() {
        let groups = groups(20, 10);
        let mut outcome = Outcome::default();
        outcome.record("sequential", 1, Ok(Workload::PRIME.apply(groups[1].values())));
        outcome.record("sequential", 0, Err("panicked: boom".to_string()));

        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(outcome.failures[0].group(), Some(0));
        assert_eq!(outcome.hits_in(&groups, 1), Some(vec![11, 13, 17, 19]));
        assert_eq!(outcome.hits_in(&groups, 0), None);
        assert_eq!(outcome.pairs(&groups).first(), Some(&(10, false)));
    }
}
