use primebench::config::RawConfig;
use primebench::partition::{chunk, dataset};
use primebench::profile::MemorySink;
use primebench::strategy::{ParallelMap, ProcessPool, Sequential, Strategy, ThreadPoolStrategy};
use primebench::worker::WorkerCommand;
use primebench::{is_prime, BenchError, Driver, Group, StrategyKind, Workload};
use std::process::Command;

fn worker_command() -> WorkerCommand {
    WorkerCommand::new(env!("CARGO_BIN_EXE_primebench"))
}

fn groups(size: usize, group_size: usize) -> Vec<Group> {
    chunk(dataset(size), group_size).unwrap()
}

fn expected_pairs(size: usize) -> Vec<(i64, bool)> {
    (0..size as i64).map(|n| (n, is_prime(n))).collect()
}

#[test]
fn test_fourth_group_agrees_across_pools_and_baseline() {
    let groups = groups(100, 10);
    assert_eq!(groups.len(), 10);

    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(ProcessPool::new(3, worker_command())),
        Box::new(ThreadPoolStrategy::new(3)),
        Box::new(Sequential),
    ];

    for strategy in strategies {
        let outcome = strategy.run(&groups, Workload::PRIME).unwrap();
        assert!(outcome.failures.is_empty(), "{}: {:?}", strategy.label(), outcome.failures);
        assert_eq!(
            outcome.hits_in(&groups, 4),
            Some(vec![41, 43, 47]),
            "{} disagrees on group 40..49",
            strategy.label()
        );
    }
}

#[test]
fn test_process_backed_strategies_match_sequential() {
    let groups = groups(3_000, 128);
    let expected = expected_pairs(3_000);

    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(ProcessPool::new(4, worker_command())),
        Box::new(ParallelMap::processes(3, worker_command())),
    ];

    for strategy in strategies {
        let outcome = strategy.run(&groups, Workload::PRIME).unwrap();
        assert!(outcome.failures.is_empty(), "{}: {:?}", strategy.label(), outcome.failures);
        assert_eq!(outcome.completed.len(), groups.len());
        assert_eq!(outcome.pairs(&groups), expected, "{}", strategy.label());
    }
}

#[test]
fn test_process_pool_with_more_workers_than_groups() {
    let groups = groups(25, 10);
    let outcome = ProcessPool::new(16, worker_command()).run(&groups, Workload::PRIME).unwrap();

    assert_eq!(outcome.completed.len(), 3);
    assert_eq!(outcome.pairs(&groups), expected_pairs(25));
}

fn is_odd(n: i64) -> bool {
    n % 2 != 0
}

#[test]
fn test_unregistered_workload_fails_per_group_in_worker_processes() {
    let groups = groups(30, 10);
    let workload = Workload::new("is_odd", is_odd);

    for strategy in [
        Box::new(ProcessPool::new(2, worker_command())) as Box<dyn Strategy>,
        Box::new(ParallelMap::processes(2, worker_command())),
    ] {
        let outcome = strategy.run(&groups, workload).unwrap();
        assert!(outcome.completed.is_empty());
        assert_eq!(outcome.failures.len(), 3);

        let mut failed: Vec<usize> = outcome.failures.iter().filter_map(|f| f.group()).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![0, 1, 2]);
        assert!(outcome.failures[0].to_string().contains(strategy.label()));
    }
}

#[test]
fn test_shadowed_workload_name_is_not_run_in_worker_processes() {
    let groups = groups(30, 10);
    let never = Workload::new("is_prime", |_| false);

    for strategy in [
        Box::new(ProcessPool::new(1, worker_command())) as Box<dyn Strategy>,
        Box::new(ParallelMap::processes(2, worker_command())),
    ] {
        let outcome = strategy.run(&groups, never).unwrap();
        assert!(outcome.completed.is_empty(), "{} ran the built-in is_prime", strategy.label());
        assert_eq!(outcome.failures.len(), 3);
        assert!(outcome
            .failures
            .iter()
            .all(|f| matches!(f, BenchError::WorkerFailure { .. })));
    }
}

#[cfg(unix)]
#[test]
fn test_process_pool_survives_workers_that_exit_immediately() {
    let groups = groups(30, 10);
    let command = WorkerCommand {
        program: "/bin/true".into(),
        args: Vec::new(),
    };

    let outcome = ProcessPool::new(1, command).run(&groups, Workload::PRIME).unwrap();

    assert!(outcome.completed.is_empty());
    let mut failed: Vec<usize> = outcome
        .failures
        .iter()
        .map(|f| match f {
            BenchError::WorkerFailure { strategy, group, .. } => {
                assert_eq!(strategy, "process_pool");
                *group
            }
            other => panic!("unexpected failure: {:?}", other),
        })
        .collect();
    failed.sort_unstable();
    assert_eq!(failed, vec![0, 1, 2]);
}

#[test]
fn test_driver_runs_every_strategy_once() {
    let config = RawConfig::from_toml_str(
        r#"
        dataset_size = 200
        group_size = 20
        process_workers = 2
        thread_workers = 4
        library_workers = 2
        "#,
    )
    .unwrap()
    .validate(2)
    .unwrap();

    let driver = Driver::new(config).unwrap().with_worker_command(worker_command());
    let sink = MemorySink::new();
    let reports = driver.run(&sink);

    let labels: Vec<&str> = reports.iter().map(|r| r.label()).collect();
    assert_eq!(
        labels,
        vec![
            "process_pool",
            "thread_pool",
            "thread_per_group",
            "cooperative",
            "sequential",
            "parallel_map_processes",
            "parallel_map_threads",
        ]
    );
    assert_eq!(sink.measurements().len(), 7);

    for report in &reports {
        assert_eq!(report.failures(), 0, "{}", report.label());
        if report.kind != StrategyKind::ThreadPerGroup {
            assert_eq!(report.completed(), 10, "{}", report.label());
        }
    }
}

#[test]
fn test_driver_with_custom_workload_on_threads() {
    let config = RawConfig::from_toml_str(
        r#"
        dataset_size = 50
        group_size = 10
        strategies = ["thread_pool", "parallel_map_threads"]
        "#,
    )
    .unwrap()
    .validate(2)
    .unwrap();

    let driver = Driver::new(config)
        .unwrap()
        .with_workload(Workload::new("is_odd", is_odd));
    let reports = driver.run(&MemorySink::new());

    for report in reports {
        let outcome = report.outcome.unwrap();
        let odd = outcome.pairs(driver.groups()).iter().filter(|&&(_, hit)| hit).count();
        assert_eq!(odd, 25);
    }
}

#[test]
fn test_binary_prints_one_line_per_strategy() {
    let output = Command::new(env!("CARGO_BIN_EXE_primebench"))
        .args([
            "--dataset-size",
            "500",
            "--group-size",
            "50",
            "--only",
            "sequential",
            "--only",
            "process_pool",
            "--process-workers",
            "2",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{}", stdout);
    assert!(lines[0].starts_with("process_pool exec time: "));
    assert!(lines[1].starts_with("sequential exec time: "));
    assert!(lines.iter().all(|l| l.ends_with(" sec")));
}

#[test]
fn test_binary_log_flag_sends_measurements_to_stderr() {
    let output = Command::new(env!("CARGO_BIN_EXE_primebench"))
        .args(["--dataset-size", "100", "--group-size", "10", "--only", "sequential", "--log"])
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("sequential exec time: "), "{}", stderr);
}

#[test]
fn test_binary_rejects_zero_group_size_without_running() {
    let output = Command::new(env!("CARGO_BIN_EXE_primebench"))
        .args(["--dataset-size", "100", "--group-size", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("group_size"));
}

#[test]
fn test_negative_group_size_is_invalid_configuration() {
    let err = RawConfig::from_toml_str("group_size = -4")
        .unwrap()
        .validate(4)
        .unwrap_err();
    assert!(matches!(err, BenchError::InvalidConfiguration { field: "group_size", value: -4 }));
}
