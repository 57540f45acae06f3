use super::{evaluate, Outcome, Strategy, StrategyKind};
use crate::error::BenchError;
use crate::partition::Group;
use crate::workload::Workload;

/// The baseline: one group after another on the calling thread.
pub struct Sequential;

impl Strategy for Sequential {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sequential
    }

    fn run(&self, groups: &[Group], workload: Workload) -> Result<Outcome, BenchError> {
        let mut outcome = Outcome::default();
        for group in groups {
            outcome.record(self.label(), group.index, evaluate(group.values(), workload));
        }
        Ok(outcome)
    }
}
