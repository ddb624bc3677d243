//! Tests for command-line parsing of the demo driver.

use clap::Parser;
use periodic_batching::config::{LogFormat, LogLevel, Opt};
use periodic_batching::BatchingOptions;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_cli_defaults() {
    let opt = Opt::try_parse_from(["periodic_batching"]).expect("Should parse without arguments");

    // LogLevel and LogFormat don't implement PartialEq, so compare via conversion
    assert_eq!(
        log::LevelFilter::from(opt.log_level.clone()),
        log::LevelFilter::Info
    );
    match opt.log_format {
        LogFormat::Plain => {}
        _ => panic!("Should be Plain format"),
    }
    assert_eq!(opt.db_path, PathBuf::from("./periodic_batching.db"));
    assert_eq!(opt.namespace, "dbo");
    assert_eq!(opt.records, 6);

    let options = BatchingOptions::from(&opt);
    assert_eq!(options.period, Duration::from_secs(5));
    assert_eq!(options.batch_size_limit, 50);
    assert_eq!(options.retry_count, 3);
}

#[test]
fn test_cli_with_options() {
    let args = [
        "periodic_batching",
        "--log-level",
        "debug",
        "--log-format",
        "json",
        "--period-ms",
        "250",
        "--namespace",
        "audit",
        "--batch-size-limit",
        "20",
        "--retry-count",
        "0",
        "--records",
        "500",
    ];
    let opt = Opt::try_parse_from(args).expect("Should parse options");

    assert_eq!(
        log::LevelFilter::from(opt.log_level.clone()),
        log::LevelFilter::from(LogLevel::Debug)
    );
    match opt.log_format {
        LogFormat::Json => {}
        _ => panic!("Should be Json format"),
    }

    let options = BatchingOptions::from(&opt);
    assert_eq!(options.period, Duration::from_millis(250));
    assert_eq!(options.destination_namespace, "audit");
    assert_eq!(options.batch_size_limit, 20);
    assert_eq!(options.retry_count, 0);
    assert!(options.validate().is_ok());
    assert_eq!(opt.records, 500);
}

#[test]
fn test_cli_rejects_bad_values() {
    assert!(Opt::try_parse_from(["periodic_batching", "--log-level", "loud"]).is_err());
    assert!(Opt::try_parse_from(["periodic_batching", "--period-ms", "-5"]).is_err());
    assert!(Opt::try_parse_from(["periodic_batching", "--records", "many"]).is_err());
}

#[test]
fn test_cli_zero_period_fails_validation() {
    let opt = Opt::try_parse_from(["periodic_batching", "--period-ms", "0"]).unwrap();
    assert!(BatchingOptions::from(&opt).validate().is_err());
}
