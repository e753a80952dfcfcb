use crate::utils::*;
use engine_core::{settings::EngineSettings, state::SessionStore};
use engine_runtime::{reaper::SessionReaper, scheduler::{BatchRun, StartOutcome}};
use model::{
    core::resource::ResourceType,
    filter::{ImportFilters, ImportOptions},
    session::status::SessionStatus,
};

fn active_products() -> ImportOptions {
    ImportOptions::with_filters(ImportFilters {
        status: Some("active".into()),
        ..Default::default()
    })
}

/// 520 products at page size 250: three batches (250, 250, 20), session ends
/// completed, and the total reflects the capped count probe.
#[tokio::test]
async fn full_import_drains_in_three_batches() {
    let harness = Harness::new(vec![
        ok(count_page(250, true)),
        ok(products_page(0, 250, true, Some("c1"))),
        ok(products_page(250, 250, true, Some("c2"))),
        ok(products_page(500, 20, false, Some("c3"))),
    ]);

    let outcome = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, active_products())
        .await
        .unwrap();
    let StartOutcome::Started {
        session_id,
        items_total,
        total_estimated,
    } = outcome
    else {
        panic!("expected a fresh session");
    };
    assert_eq!(items_total, 250, "count probe capped at one page");
    assert!(total_estimated);

    let last = harness.executor.drain().await.unwrap();
    assert!(matches!(last, Some(BatchRun::Completed)));

    let session = harness.state.find(&session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.items_processed, 520);
    assert_eq!(session.items_succeeded, 520);
    assert_eq!(harness.upserter.seen_ids().len(), 520);

    let report = harness.progress.get_progress(&session_id).await.unwrap();
    assert!(report.is_complete);
    assert_eq!(report.percentage, 100, "clamped against the estimated total");
}

/// A second start request while the first session is active returns the same
/// session id and creates no new row.
#[tokio::test]
async fn concurrent_start_is_deduplicated() {
    let harness = Harness::new(vec![
        ok(count_page(3, false)),
        ok(products_page(0, 3, false, Some("c1"))),
    ]);

    let first = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, active_products())
        .await
        .unwrap();
    let second = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, active_products())
        .await
        .unwrap();

    assert!(matches!(second, StartOutcome::AlreadyRunning { .. }));
    assert_eq!(second.session_id(), first.session_id());
    assert_eq!(harness.state.count_running(None).await.unwrap(), 1);
}

/// An HTTP 401 on the page fetch fails the session with an authorization
/// message and leaves no cursor behind.
#[tokio::test]
async fn auth_failure_fails_the_session_without_cursor() {
    let harness = Harness::new(vec![
        ok(count_page(10, false)),
        http_status(401, "{\"errors\":\"Invalid API key\"}"),
    ]);

    let started = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, active_products())
        .await
        .unwrap();

    let last = harness.executor.drain().await.unwrap();
    let Some(BatchRun::Failed { message }) = last else {
        panic!("expected a failed run");
    };
    assert!(message.contains("Authorization"));

    let session = harness
        .state
        .find(started.session_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Failed);
    assert!(session.message.unwrap().contains("Authorization"));

    use engine_core::state::CursorStore;
    assert!(
        harness
            .state
            .get(ResourceType::Products)
            .await
            .unwrap()
            .is_none()
    );
}

/// 3 of 50 records fail transformation: the batch finishes the page, counts
/// the failures, and still reschedules for the next page.
#[tokio::test]
async fn partial_failures_keep_the_batch_going() {
    let failing = vec![
        "gid://shopify/Product/3".to_string(),
        "gid://shopify/Product/17".to_string(),
        "gid://shopify/Product/42".to_string(),
    ];
    let harness = Harness::with_failing_ids(
        vec![
            ok(count_page(100, true)),
            ok(products_page(0, 50, true, Some("c1"))),
        ],
        failing,
    );

    let started = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, active_products())
        .await
        .unwrap();
    let first = harness.dispatcher.pop().unwrap();

    let run = harness.scheduler.run_scheduled(&first).await.unwrap();
    assert!(matches!(run, BatchRun::Continued { .. }));
    assert_eq!(harness.dispatcher.len(), 1, "follow-up batch enqueued");

    let session = harness
        .state
        .find(started.session_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.items_failed, 3);
    assert_eq!(session.items_succeeded, 47);
    assert_eq!(session.items_processed, 50);
}

/// A session stuck past the threshold gets reaped, freeing the slot for a
/// fresh start.
#[tokio::test]
async fn reaped_session_frees_the_slot() {
    let harness = Harness::new(vec![ok(count_page(5, false))]);

    let mut stuck = model::session::record::ImportSession::new(
        store_id(),
        ResourceType::Products,
        ImportOptions::default(),
    );
    stuck.status = SessionStatus::InProgress;
    stuck.updated_at = chrono::Utc::now() - chrono::Duration::minutes(61);
    harness.state.create(&stuck).await.unwrap();

    let mut settings = EngineSettings::default();
    settings.stuck_threshold_secs = 3600;
    let reaper = SessionReaper::new(harness.state.clone(), settings);
    let reaped = reaper.reap().await.unwrap();
    assert_eq!(reaped, vec![stuck.id.clone()]);

    let failed = harness.state.find(&stuck.id).await.unwrap().unwrap();
    assert_eq!(failed.status, SessionStatus::Failed);
    assert!(failed.message.unwrap().contains("timed out"));

    let outcome = harness
        .scheduler
        .start_import(&store_id(), ResourceType::Products, active_products())
        .await
        .unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));
    assert_ne!(outcome.session_id(), &stuck.id);
}
