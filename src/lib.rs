//! # primebench
//!
//! Runs one CPU-bound workload (trial-division primality) over the same
//! partitioned dataset under several execution models and reports how long
//! each one takes.
//!
//! ## Strategies
//!
//! 1. **Process pool** - child processes fed over stdin/stdout
//! 2. **Thread pool** - fixed set of OS threads pulling jobs from a channel
//! 3. **Thread per group** - one detached OS thread per group
//! 4. **Cooperative** - local tasks on a single-threaded tokio runtime
//! 5. **Sequential** - the baseline loop
//! 6. **Parallel map** - rayon, backed either by threads or worker processes
//!
//! ## Running
//!
//! ```bash
//! cargo run --release -- --dataset-size 200000 --group-size 1000
//! cargo run --release -- --only sequential --only cooperative
//! RUST_LOG=debug cargo run --release -- --log
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod partition;
pub mod profile;
pub mod strategy;
pub mod worker;
pub mod workload;

pub use config::{BenchConfig, RawConfig};
pub use driver::{Driver, StrategyReport};
pub use error::BenchError;
pub use partition::{chunk, Group};
pub use profile::{profile, Measurement, MeasurementSink};
pub use strategy::{GroupResult, Outcome, Strategy, StrategyKind};
pub use workload::{is_prime, Workload};
