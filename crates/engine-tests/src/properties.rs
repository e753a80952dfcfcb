use crate::utils::*;
use engine_core::state::{CursorStore, SessionStore};
use engine_runtime::{reaper::SessionReaper, scheduler::{BatchRun, StartOutcome}};
use engine_core::settings::EngineSettings;
use model::{
    core::resource::ResourceType,
    filter::ImportOptions,
    pagination::cursor::Cursor,
    session::status::SessionStatus,
};

/// Replaying a page after a simulated crash never double-advances the cursor:
/// it lands on the same value a single execution would have produced.
#[tokio::test]
async fn replayed_page_advances_the_cursor_once() {
    // The source serves the identical page twice, as it would if the first
    // attempt crashed after classification but the trigger was re-fired.
    let harness = Harness::new(vec![
        ok(count_page(10, true)),
        ok(products_page(0, 5, true, Some("c1"))),
        ok(products_page(0, 5, true, Some("c1"))),
    ]);

    let started = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
        .await
        .unwrap();
    let first = harness.dispatcher.pop().unwrap();

    harness.scheduler.run_scheduled(&first).await.unwrap();
    assert_eq!(
        harness.state.get(ResourceType::Products).await.unwrap(),
        Some(Cursor::At("c1".into()))
    );
    harness.dispatcher.pop();

    // Replay of the same trigger: same page, same end cursor. The scheduler
    // detects the repeat and force-completes instead of looping.
    let run = harness.scheduler.run_scheduled(&first).await.unwrap();
    assert!(matches!(run, BatchRun::CompletedAnomalously));

    let session = harness
        .state
        .find(started.session_id())
        .await
        .unwrap()
        .unwrap();
    let sum = session.items_succeeded + session.items_failed + session.items_skipped;
    assert_eq!(session.items_processed, sum, "totals stay internally consistent");
}

/// Repeated start requests while a session is active all resolve to one id.
#[tokio::test]
async fn all_duplicate_starts_resolve_to_one_session() {
    let harness = Harness::new(vec![ok(count_page(3, false))]);

    let first = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
        .await
        .unwrap();
    for _ in 0..5 {
        let again = harness
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        assert!(matches!(again, StartOutcome::AlreadyRunning { .. }));
        assert_eq!(again.session_id(), first.session_id());
    }
    assert_eq!(harness.state.count_running(None).await.unwrap(), 1);
}

/// `items_processed` never decreases across successive progress reads.
#[tokio::test]
async fn processed_count_is_monotonic() {
    let harness = Harness::new(vec![
        ok(count_page(9, false)),
        ok(products_page(0, 3, true, Some("c1"))),
        ok(products_page(3, 3, true, Some("c2"))),
        ok(products_page(6, 3, false, Some("c3"))),
    ]);

    let started = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
        .await
        .unwrap();

    let mut last_processed = 0;
    while let Some(batch) = harness.dispatcher.pop() {
        harness.scheduler.run_scheduled(&batch).await.unwrap();
        let report = harness
            .progress
            .get_progress(started.session_id())
            .await
            .unwrap();
        assert!(report.items_processed >= last_processed);
        last_processed = report.items_processed;
    }
    assert_eq!(last_processed, 9);
}

/// A terminal session never transitions again: not by a late batch, not by
/// the reaper.
#[tokio::test]
async fn terminal_status_is_final() {
    let harness = Harness::new(vec![
        ok(count_page(2, false)),
        ok(products_page(0, 2, false, None)),
    ]);

    let started = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
        .await
        .unwrap();
    let first = harness.dispatcher.pop().unwrap();
    let run = harness.scheduler.run_scheduled(&first).await.unwrap();
    assert!(matches!(run, BatchRun::Completed));

    // Late duplicate trigger for the now-completed session.
    let late = harness.scheduler.run_scheduled(&first).await.unwrap();
    assert!(matches!(late, BatchRun::Suppressed));

    // Zero threshold makes every active session reapable; completed ones
    // must still be left alone.
    let mut settings = EngineSettings::default();
    settings.stuck_threshold_secs = 0;
    SessionReaper::new(harness.state.clone(), settings)
        .reap()
        .await
        .unwrap();

    let session = harness
        .state
        .find(started.session_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
}

/// The `edges` and `nodes` response shapes produce identical imports.
#[tokio::test]
async fn dual_shape_responses_import_identically() {
    let nodes = Harness::new(vec![
        ok(count_page(3, false)),
        ok(products_page(0, 3, false, None)),
    ]);
    let edges = Harness::new(vec![
        ok(count_page(3, false)),
        ok(products_page_edges(0, 3, false, None)),
    ]);

    for harness in [&nodes, &edges] {
        harness
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        harness.executor.drain().await.unwrap();
    }

    assert_eq!(nodes.upserter.seen_ids(), edges.upserter.seen_ids());
    assert_eq!(nodes.upserter.seen_ids().len(), 3);
}
