mod common;

use bulkload::{BatchDriver, BatchResult, RunTotals, Sink};
use common::{RecordingProgress, Reply, ScriptedSink, records};
use std::num::NonZeroUsize;

fn size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[tokio::test]
async fn trailing_partial_batch_is_flushed() {
    let mut sink = ScriptedSink::default();
    let totals = BatchDriver::new(size(100)).run(records(250), &mut sink).await;

    assert_eq!(sink.calls, vec![100, 100, 50]);
    assert_eq!(totals.success_count, 250);
    assert_eq!(totals.failure_count, 0);
    assert_eq!(totals.batches, 3);
}

#[tokio::test]
async fn failed_last_batch_does_not_affect_earlier_ones() {
    let mut sink = ScriptedSink::new([Reply::Accept, Reply::Accept, Reply::Raise]);
    let totals = BatchDriver::new(size(100)).run(records(250), &mut sink).await;

    assert_eq!(
        totals,
        RunTotals {
            success_count: 200,
            failure_count: 50,
            batches: 3,
        }
    );
}

#[tokio::test]
async fn failing_batch_in_the_middle_does_not_stop_the_run() {
    let mut sink = ScriptedSink::new([Reply::Accept, Reply::Raise, Reply::Accept]);
    let totals = BatchDriver::new(size(10)).run(records(30), &mut sink).await;

    assert_eq!(sink.calls, vec![10, 10, 10]);
    assert_eq!(totals.success_count, 20);
    assert_eq!(totals.failure_count, 10);
}

#[tokio::test]
async fn backend_raising_on_every_call_fails_every_record() {
    let mut sink = ScriptedSink::always(Reply::Raise, 10);
    let totals = BatchDriver::new(size(7)).run(records(50), &mut sink).await;

    assert_eq!(totals.success_count, 0);
    assert_eq!(totals.failure_count, 50);
    assert_eq!(sink.count().await.unwrap(), 0);
}

#[tokio::test]
async fn item_rejections_within_one_batch() {
    let mut sink = ScriptedSink::new([Reply::Reject(3)]);
    let totals = BatchDriver::new(size(10)).run(records(10), &mut sink).await;

    assert_eq!(
        BatchResult::new(totals.success_count, totals.failure_count),
        BatchResult::new(7, 3)
    );
    assert_eq!(totals.batches, 1);
}

#[tokio::test]
async fn aggregate_shortfall_is_counted_as_failures() {
    let mut sink = ScriptedSink::new([Reply::Inserted(18), Reply::Accept]);
    let totals = BatchDriver::new(size(20)).run(records(35), &mut sink).await;

    assert_eq!(totals.success_count, 33);
    assert_eq!(totals.failure_count, 2);
}

#[tokio::test]
async fn empty_input_makes_no_calls() {
    let mut sink = ScriptedSink::default();
    let progress = RecordingProgress::default();
    let totals = BatchDriver::new(size(5))
        .with_progress(Box::new(progress.clone()))
        .run(Vec::new(), &mut sink)
        .await;

    assert!(sink.calls.is_empty());
    assert_eq!(totals, RunTotals::default());
    assert!(progress.updates().is_empty());
}

#[tokio::test]
async fn progress_is_reported_after_each_batch() {
    let mut sink = ScriptedSink::new([Reply::Accept, Reply::Raise]);
    let progress = RecordingProgress::default();
    BatchDriver::new(size(4))
        .with_progress(Box::new(progress.clone()))
        .run(records(10), &mut sink)
        .await;

    assert_eq!(progress.updates(), vec![(4, 10), (8, 10), (10, 10)]);
}

#[tokio::test]
async fn free_function_matches_driver() {
    let mut sink = ScriptedSink::default();
    let totals = bulkload::pipeline::run(records(9), &mut sink, size(4)).await;

    assert_eq!(sink.calls, vec![4, 4, 1]);
    assert_eq!(totals.processed(), 9);
}
