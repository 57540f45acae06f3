use super::{evaluate, Outcome, Strategy, StrategyKind};
use crate::error::BenchError;
use crate::partition::Group;
use crate::workload::Workload;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of OS threads pulling jobs off a shared channel.
///
/// Dropping the pool closes the channel and joins every worker.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<Sender<Job>>,
}

impl ThreadPool {
    pub fn new(size: usize) -> Result<Self, BenchError> {
        if size == 0 {
            return Err(BenchError::invalid_configuration("thread_workers", 0));
        }

        let (sender, receiver) = unbounded();
        let mut pool = ThreadPool {
            workers: Vec::with_capacity(size),
            sender: Some(sender),
        };

        // On a failed spawn the partial pool is dropped, which joins what did start.
        for id in 0..size {
            pool.workers.push(Worker::new(id, receiver.clone())?);
        }

        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job. Returns `false` if no worker is left to run it.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    log::warn!("thread pool worker {} panicked", worker.id);
                }
            }
        }
    }
}

struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, receiver: Receiver<Job>) -> Result<Self, BenchError> {
        let thread = thread::Builder::new()
            .name(format!("primebench-worker-{}", id))
            .spawn(move || {
                for job in receiver.iter() {
                    job();
                }
                log::trace!("worker {} shutting down", id);
            })
            .map_err(|e| BenchError::resource_exhaustion("thread_pool", format!("worker thread {}", id), e))?;

        Ok(Worker {
            id,
            thread: Some(thread),
        })
    }
}

pub struct ThreadPoolStrategy {
    workers: usize,
}

impl ThreadPoolStrategy {
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }
}

impl Strategy for ThreadPoolStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ThreadPool
    }

    fn run(&self, groups: &[Group], workload: Workload) -> Result<Outcome, BenchError> {
        let label = self.label();
        let pool = ThreadPool::new(self.workers)?;
        log::debug!("{}: {} threads for {} groups", label, pool.size(), groups.len());

        let (done_tx, done_rx) = unbounded();
        let mut outcome = Outcome::default();
        let mut pending = 0;

        for group in groups {
            let index = group.index;
            let group = group.clone();
            let done_tx = done_tx.clone();
            let accepted = pool.execute(move || {
                let result = evaluate(group.values(), workload);
                let _ = done_tx.send((group.index, result));
            });

            if accepted {
                pending += 1;
            } else {
                outcome.failures.push(BenchError::worker_failure(
                    label,
                    index,
                    "thread pool shut down before accepting the job",
                ));
            }
        }
        drop(done_tx);

        // Completion order, not submission order.
        for (index, result) in done_rx.iter().take(pending) {
            outcome.record(label, index, result);
        }

        drop(pool);
        Ok(outcome)
    }
}
