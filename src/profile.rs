//! Wall-clock timing around a single operation.
//!
//! [`profile`] brackets an operation with a [`ProfileGuard`]. The guard
//! records its measurement when finished or, if the operation unwinds, when it
//! is dropped, so every exit path produces exactly one measurement.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub label: String,
    pub elapsed: Duration,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} exec time: {} sec", self.label, self.elapsed.as_secs_f64())
    }
}

/// Where measurements go once taken.
pub trait MeasurementSink: Send + Sync {
    fn record(&self, measurement: &Measurement);
}

/// Prints each measurement on its own line.
pub struct StdoutSink;

impl MeasurementSink for StdoutSink {
    fn record(&self, measurement: &Measurement) {
        println!("{}", measurement);
    }
}

/// Emits measurements through the `log` facade at debug level.
pub struct LogSink;

impl MeasurementSink for LogSink {
    fn record(&self, measurement: &Measurement) {
        log::debug!("{}", measurement);
    }
}

/// Keeps every measurement in memory.
#[derive(Default)]
pub struct MemorySink {
    measurements: Mutex<Vec<Measurement>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn measurements(&self) -> Vec<Measurement> {
        self.measurements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl MeasurementSink for MemorySink {
    fn record(&self, measurement: &Measurement) {
        self.measurements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(measurement.clone());
    }
}

pub struct ProfileGuard<'a> {
    label: Option<String>,
    start: Instant,
    sink: &'a dyn MeasurementSink,
}

impl<'a> ProfileGuard<'a> {
    pub fn new(label: impl Into<String>, sink: &'a dyn MeasurementSink) -> Self {
        ProfileGuard {
            label: Some(label.into()),
            start: Instant::now(),
            sink,
        }
    }

    /// Stops the clock and records the measurement.
    pub fn finish(mut self) -> Measurement {
        let label = self.label.take().unwrap_or_default();
        self.emit(label)
    }

    fn emit(&self, label: String) -> Measurement {
        let measurement = Measurement {
            label,
            elapsed: self.start.elapsed(),
        };
        self.sink.record(&measurement);
        measurement
    }
}

impl Drop for ProfileGuard<'_> {
    fn drop(&mut self) {
        if let Some(label) = self.label.take() {
            self.emit(label);
        }
    }
}

/// Runs `op` synchronously and times it.
///
/// Whatever `op` returns, `Ok` or `Err`, is handed back untouched alongside
/// the measurement. A panic inside `op` still records a measurement before it
/// keeps unwinding.
pub fn profile<T>(label: &str, sink: &dyn MeasurementSink, op: impl FnOnce() -> T) -> (T, Measurement) {
    let guard = ProfileGuard::new(label, sink);
    let value = op();
    let measurement = guard.finish();
    (value, measurement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    #[test]
    fn test_elapsed_covers_blocking_operation() {
        let sink = MemorySink::new();
        let delay = Duration::from_millis(30);

        let (_, measurement) = profile("sleepy", &sink, || thread::sleep(delay));

        assert!(measurement.elapsed >= delay);
        assert_eq!(sink.measurements(), vec![measurement]);
    }

    #[test]
    fn test_error_is_returned_unchanged_after_one_measurement() {
        let sink = MemorySink::new();

        let (result, _) = profile("failing", &sink, || -> Result<(), BenchError> {
            Err(BenchError::worker_failure("sequential", 3, "bad input"))
        });

        match result {
            Err(BenchError::WorkerFailure { strategy, group, reason }) => {
                assert_eq!(strategy, "sequential");
                assert_eq!(group, 3);
                assert_eq!(reason, "bad input");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(sink.measurements().len(), 1);
        assert_eq!(sink.measurements()[0].label, "failing");
    }

    #[test]
    fn test_panic_still_records_measurement() {
        let sink = MemorySink::new();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            profile("exploding", &sink, || -> u32 { panic!("kaboom") })
        }));

        let payload = outcome.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"kaboom"));
        let measurements = sink.measurements();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].label, "exploding");
    }

    #[test]
    fn test_display_format() {
        let measurement = Measurement {
            label: "thread_pool".to_string(),
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(measurement.to_string(), "thread_pool exec time: 1.5 sec");
    }
}
