use super::{panic_message, Outcome, Strategy, StrategyKind};
use crate::error::BenchError;
use crate::partition::Group;
use crate::workload::Workload;
use futures::future::join_all;
use tokio::runtime::Builder;
use tokio::task::{self, LocalSet};

/// One local task per group on a single-threaded tokio runtime.
///
/// The workload never awaits, so each task runs to completion once polled and
/// the strategy behaves like [`super::Sequential`] with scheduling overhead.
pub struct Cooperative;

impl Strategy for Cooperative {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Cooperative
    }

    fn run(&self, groups: &[Group], workload: Workload) -> Result<Outcome, BenchError> {
        let label = self.label();
        let runtime = Builder::new_current_thread().build()?;
        let local = LocalSet::new();

        let joined = local.block_on(&runtime, async {
            let (indices, handles): (Vec<usize>, Vec<_>) = groups
                .iter()
                .map(|group| {
                    let group = group.clone();
                    (group.index, task::spawn_local(async move { workload.apply(group.values()) }))
                })
                .unzip();

            indices.into_iter().zip(join_all(handles).await).collect::<Vec<_>>()
        });

        let mut outcome = Outcome::default();
        for (index, result) in joined {
            let result = result.map_err(|err| {
                if err.is_panic() {
                    panic_message(err.into_panic())
                } else {
                    err.to_string()
                }
            });
            outcome.record(label, index, result);
        }

        Ok(outcome)
    }
}
