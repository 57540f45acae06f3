use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use primebench::config::RawConfig;
use primebench::profile::{LogSink, MeasurementSink, StdoutSink};
use primebench::{worker, BenchError, Driver, StrategyKind};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Times the same prime-classification workload under several concurrency
/// strategies.
#[derive(Parser, Debug)]
#[command(name = "primebench", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve work requests on stdin/stdout (spawned by the process strategies).
    #[command(hide = true)]
    Worker,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML file with benchmark settings; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, allow_negative_numbers = true)]
    dataset_size: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    group_size: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    process_workers: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    thread_workers: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    library_workers: Option<i64>,

    /// Join the one-thread-per-group threads instead of detaching them.
    #[arg(long)]
    strict: bool,

    /// Run only these strategies (repeatable).
    #[arg(long = "only", value_enum)]
    only: Vec<StrategyKind>,

    /// Send measurements to the logger at debug level instead of stdout.
    #[arg(long)]
    log: bool,
}

impl RunArgs {
    fn resolve(&self) -> Result<RawConfig, BenchError> {
        let mut raw = match &self.config {
            Some(path) => RawConfig::load(path)?,
            None => RawConfig::default(),
        };

        if let Some(size) = self.dataset_size {
            raw.dataset_size = size;
        }
        raw.group_size = self.group_size.or(raw.group_size);
        raw.process_workers = self.process_workers.or(raw.process_workers);
        raw.thread_workers = self.thread_workers.or(raw.thread_workers);
        raw.library_workers = self.library_workers.or(raw.library_workers);
        raw.strict_thread_per_group |= self.strict;
        raw.log_measurements |= self.log;
        if !self.only.is_empty() {
            raw.strategies = Some(self.only.clone());
        }

        Ok(raw)
    }
}

/// With `log_measurements`, the default filter lets this crate's debug
/// records (the measurements) through; `RUST_LOG` still wins when set.
fn init_logging(log_measurements: bool) {
    let default_filter = if log_measurements { "primebench=debug,info" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn run(args: RunArgs) -> Result<(), BenchError> {
    let config = args.resolve()?.validate(num_cpus::get())?;
    init_logging(config.log_measurements);
    log::debug!(
        "{} process / {} thread / {} library workers",
        config.process_workers,
        config.thread_workers,
        config.library_workers
    );

    let sink: Box<dyn MeasurementSink> = if config.log_measurements {
        Box::new(LogSink)
    } else {
        Box::new(StdoutSink)
    };

    let driver = Driver::new(config)?;
    let reports = driver.run(sink.as_ref());

    let failed: usize = reports.iter().map(|r| r.failures()).sum();
    if failed > 0 {
        log::warn!(
            "{} failures across {} strategies on {} values",
            failed,
            reports.len(),
            driver.config().dataset_size
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Some(Command::Worker) => {
            init_logging(false);
            worker::serve(io::stdin().lock(), io::stdout().lock())
        }
        None => run(cli.run),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
