//! Demo driver (CLI binary).
//!
//! A thin wrapper around the `periodic_batching` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Database setup for the demo `request_log` table
//!
//! It enqueues a number of demo request logs, flushes on shutdown and
//! reports how many rows the destination holds.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use periodic_batching::config::Opt;
use periodic_batching::initialization::init_logger_with;
use periodic_batching::storage::{ensure_destination, init_db_pool_with_path, schema};
use periodic_batching::{BatchScheduler, BatchingOptions, Record, RequestLog, SqliteBulkWriter};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    match run(&opt).await {
        Ok(rows) => {
            println!(
                "Enqueued {} record{}; {}.request_log now holds {} row{}",
                opt.records,
                if opt.records == 1 { "" } else { "s" },
                opt.namespace,
                rows,
                if rows == 1 { "" } else { "s" }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("periodic_batching error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(opt: &Opt) -> Result<i64> {
    let options = BatchingOptions::from(opt);
    options.validate().context("Invalid batching options")?;

    let pool = init_db_pool_with_path(&opt.db_path, &options.destination_namespace)
        .await
        .context("Failed to open database")?;

    let sample = demo_record(0);
    ensure_destination(&pool, &options.destination_namespace, &sample)
        .await
        .context("Failed to create destination table")?;

    let writer = SqliteBulkWriter::new(pool.clone(), options.destination_namespace.clone());
    let scheduler = BatchScheduler::new(options, writer)?;

    for n in 0..opt.records {
        scheduler.enqueue(demo_record(n))?;
    }
    scheduler.dispose_and_flush().await;

    let count_sql = format!(
        "SELECT COUNT(*) FROM {}",
        schema::qualified_name(&opt.namespace, &sample.destination_name())
    );
    let rows: i64 = sqlx::query_scalar(&count_sql)
        .fetch_one(&pool)
        .await
        .context("Failed to count stored rows")?;
    Ok(rows)
}

fn demo_record(n: usize) -> RequestLog {
    RequestLog {
        url: "https://www.google.com.au".to_string(),
        response: "Hello World".to_string(),
        time_taken: 5 + n as i64,
    }
}
