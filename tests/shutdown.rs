//! Shutdown behavior: final flush, idempotent dispose and the blocking paths.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{fast_options, wait_until, Event, Script, ScriptedSink};
use periodic_batching::{BatchScheduler, BatchingOptions, Lifecycle};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

#[tokio::test]
async fn test_dispose_flushes_queued_records() {
    let sink = Arc::new(ScriptedSink::new(Script::Healthy));
    let options = BatchingOptions::new(Duration::from_secs(3600));
    let scheduler = BatchScheduler::new(options, Arc::clone(&sink)).unwrap();

    scheduler.enqueue(Event::new(0)).unwrap();
    assert!(wait_until(Duration::from_secs(5), || sink.delivered_seqs() == vec![0]).await);

    // Next periodic tick is an hour away
    for seq in 1..4 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    scheduler.dispose_and_flush().await;

    assert_eq!(sink.delivered_seqs(), vec![0, 1, 2, 3]);
    assert_eq!(scheduler.lifecycle(), Lifecycle::Unloading);
}

#[tokio::test]
async fn test_dispose_waits_for_retries() {
    let sink = Arc::new(ScriptedSink::new(Script::FailFirst(2)));
    let options = BatchingOptions {
        retry_count: 3,
        retry_delay: Duration::from_millis(30),
        ..fast_options(3_600_000, 10)
    };
    let scheduler = BatchScheduler::new(options, Arc::clone(&sink)).unwrap();

    for seq in 0..3 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    scheduler.dispose_and_flush().await;

    // The start-up tick may race the final one; either way nothing is lost
    assert!(sink.attempts() >= 3);
    assert_eq!(sink.delivered_seqs(), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_dispose_twice_flushes_once() {
    let sink = Arc::new(ScriptedSink::new(Script::Healthy));
    let scheduler = BatchScheduler::new(fast_options(3_600_000, 10), Arc::clone(&sink)).unwrap();

    for seq in 0..3 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    scheduler.dispose_and_flush().await;
    let attempts = sink.attempts();

    scheduler.dispose_and_flush().await;
    scheduler.dispose_and_flush_blocking();

    assert_eq!(sink.attempts(), attempts);
    assert_eq!(sink.delivered_seqs(), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_final_flush_failure_does_not_escape() {
    let sink = Arc::new(ScriptedSink::new(Script::AlwaysFail));
    let options = BatchingOptions {
        retry_count: 1,
        ..fast_options(3_600_000, 10)
    };
    let scheduler = BatchScheduler::new(options, Arc::clone(&sink)).unwrap();

    scheduler.enqueue(Event::new(0)).unwrap();
    scheduler.dispose_and_flush().await;

    assert!(sink.attempts() >= 2);
    assert!(sink.delivered().is_empty());
    assert_eq!(scheduler.lifecycle(), Lifecycle::Unloading);
}

#[tokio::test]
async fn test_records_after_dispose_are_discarded() {
    let sink = Arc::new(ScriptedSink::new(Script::Healthy));
    let scheduler = BatchScheduler::new(fast_options(2, 10), Arc::clone(&sink)).unwrap();

    scheduler.enqueue(Event::new(0)).unwrap();
    scheduler.dispose_and_flush().await;
    scheduler.enqueue(Event::new(1)).unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(sink.delivered_seqs(), vec![0]);
}

#[tokio::test]
async fn test_drop_inside_runtime_flushes_before_returning() {
    let sink = Arc::new(ScriptedSink::new(Script::Healthy));
    let scheduler = BatchScheduler::new(fast_options(3_600_000, 10), Arc::clone(&sink)).unwrap();

    scheduler.enqueue(Event::new(0)).unwrap();
    assert!(wait_until(Duration::from_secs(5), || sink.delivered_seqs() == vec![0]).await);

    for seq in 1..5 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    drop(scheduler);

    assert_eq!(sink.delivered_seqs(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_drop_at_end_of_current_thread_block_on() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");
    let sink = Arc::new(ScriptedSink::new(Script::Healthy));

    runtime.block_on(async {
        let options = BatchingOptions::new(Duration::from_secs(3600));
        let scheduler = BatchScheduler::new(options, Arc::clone(&sink)).unwrap();
        for seq in 0..5 {
            scheduler.enqueue(Event::new(seq)).unwrap();
        }
    });
    drop(runtime);

    assert_eq!(sink.delivered_seqs(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_drop_at_end_of_multi_thread_block_on() {
    let runtime = runtime();
    let sink = Arc::new(ScriptedSink::with_delay(
        Script::Healthy,
        Duration::from_millis(5),
    ));

    runtime.block_on(async {
        let options = BatchingOptions::new(Duration::from_secs(3600));
        let scheduler = BatchScheduler::new(options, Arc::clone(&sink)).unwrap();
        for seq in 0..5 {
            scheduler.enqueue(Event::new(seq)).unwrap();
        }
    });
    drop(runtime);

    assert_eq!(sink.delivered_seqs(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_drop_mid_tick_on_current_thread_flushes_in_background() {
    let sink = Arc::new(ScriptedSink::with_delay(
        Script::Healthy,
        Duration::from_millis(50),
    ));
    let scheduler = BatchScheduler::new(fast_options(3_600_000, 10), Arc::clone(&sink)).unwrap();

    for seq in 0..5 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    // The first tick is now parked inside the slow write
    tokio::time::sleep(Duration::from_millis(10)).await;
    for seq in 5..10 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    drop(scheduler);

    assert!(wait_until(Duration::from_secs(5), || sink.delivered_events().len() == 10).await);
    assert_eq!(sink.delivered_seqs(), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_blocking_dispose_outside_runtime() {
    let runtime = runtime();
    let sink = Arc::new(ScriptedSink::with_delay(
        Script::Healthy,
        Duration::from_millis(5),
    ));
    let scheduler = BatchScheduler::with_runtime(
        fast_options(3_600_000, 4),
        Arc::clone(&sink),
        runtime.handle().clone(),
    )
    .unwrap();

    for seq in 0..10 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    scheduler.dispose_and_flush_blocking();

    assert_eq!(sink.delivered_seqs(), (0..10).collect::<Vec<_>>());
    assert!(sink.delivered().iter().all(|b| b.len() <= 4));
}

#[test]
fn test_drop_outside_runtime_blocks_until_flushed() {
    let runtime = runtime();
    let sink = Arc::new(ScriptedSink::new(Script::FailFirst(1)));
    let options = BatchingOptions {
        retry_count: 2,
        ..fast_options(3_600_000, 10)
    };
    let scheduler =
        BatchScheduler::with_runtime(options, Arc::clone(&sink), runtime.handle().clone()).unwrap();

    for seq in 0..3 {
        scheduler.enqueue(Event::new(seq)).unwrap();
    }
    drop(scheduler);

    assert_eq!(sink.delivered_seqs(), vec![0, 1, 2]);
}

#[test]
fn test_new_requires_runtime() {
    let sink = ScriptedSink::new(Script::Healthy);
    assert!(BatchScheduler::<Event, _>::new(fast_options(5, 10), sink).is_err());
}
