use crate::{
    dispatch::{Dispatcher, ScheduledBatch},
    error::SchedulerError,
};
use engine_core::{
    connectors::RecordSource,
    settings::EngineSettings,
    state::{CursorStore, ExecutionGuards, SessionStore},
};
use engine_processing::{
    batch::{BatchContext, BatchProcessor},
    error::BatchError,
};
use model::{
    core::identifiers::{SessionId, StoreId},
    core::resource::ResourceType,
    filter::ImportOptions,
    pagination::cursor::Cursor,
    session::{
        record::{ImportSession, SessionPatch},
        status::SessionStatus,
    },
};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a start-import request.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    Started {
        session_id: SessionId,
        items_total: u64,
        total_estimated: bool,
    },
    /// An active session already holds the (store, resource) slot; the caller
    /// gets its id instead of a duplicate run.
    AlreadyRunning { session_id: SessionId },
}

impl StartOutcome {
    pub fn session_id(&self) -> &SessionId {
        match self {
            StartOutcome::Started { session_id, .. } => session_id,
            StartOutcome::AlreadyRunning { session_id } => session_id,
        }
    }
}

/// Result of one scheduled batch invocation, after the scheduler has folded
/// any batch failure into session state.
#[derive(Debug, Clone)]
pub enum BatchRun {
    /// More pages remain; exactly one follow-up invocation was enqueued.
    Continued { next: ScheduledBatch },
    Completed,
    /// The source repeated a cursor; the session was force-completed to
    /// break the loop.
    CompletedAnomalously,
    Failed { message: String },
    /// Nothing ran: the execution guard is held elsewhere, or the session is
    /// already terminal or gone.
    Suppressed,
}

/// Concurrency-control heart of the engine.
///
/// Guarantees at most one active session per (store, resource) and at most
/// one executing batch per session, and owns every session state transition
/// that is not a plain counter update.
pub struct ImportScheduler {
    sessions: Arc<dyn SessionStore>,
    cursors: Arc<dyn CursorStore>,
    guards: Arc<dyn ExecutionGuards>,
    source: Arc<dyn RecordSource>,
    processor: Arc<BatchProcessor>,
    dispatcher: Arc<dyn Dispatcher>,
    settings: EngineSettings,
}

impl ImportScheduler {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        cursors: Arc<dyn CursorStore>,
        guards: Arc<dyn ExecutionGuards>,
        source: Arc<dyn RecordSource>,
        processor: Arc<BatchProcessor>,
        dispatcher: Arc<dyn Dispatcher>,
        settings: EngineSettings,
    ) -> Self {
        ImportScheduler {
            sessions,
            cursors,
            guards,
            source,
            processor,
            dispatcher,
            settings,
        }
    }

    /// Accept or reject a start-import request.
    ///
    /// Single-flight: an existing `initializing`/`in_progress` session for the
    /// same (store, resource) wins, and the caller is handed its id. A fresh
    /// start clears the resource's cursor slot so it can never resume from a
    /// previous run's position.
    pub async fn start_import(
        &self,
        store: &StoreId,
        resource: ResourceType,
        options: ImportOptions,
    ) -> Result<StartOutcome, SchedulerError> {
        if let Some(active) = self.sessions.find_active(store, resource).await? {
            info!(
                store = %store,
                resource = %resource,
                session = %active.id,
                "Import already running, returning existing session"
            );
            return Ok(StartOutcome::AlreadyRunning {
                session_id: active.id,
            });
        }

        self.cursors.clear(resource).await?;

        let mut session = ImportSession::new(store.clone(), resource, options);
        if resource == ResourceType::Products {
            let count = self
                .source
                .count(resource, &session.options.filters)
                .await?;
            session.items_total = count.count;
            session.total_estimated = count.is_partial;
        }
        self.sessions.create(&session).await?;

        info!(
            store = %store,
            resource = %resource,
            session = %session.id,
            items_total = session.items_total,
            total_estimated = session.total_estimated,
            "Import session created"
        );

        self.dispatcher
            .schedule_once(ScheduledBatch::immediate(
                session.id.clone(),
                store.clone(),
            ))
            .await?;

        Ok(StartOutcome::Started {
            session_id: session.id,
            items_total: session.items_total,
            total_estimated: session.total_estimated,
        })
    }

    /// Execute one scheduled batch under the time-boxed execution guard.
    ///
    /// All batch failures are absorbed here into session transitions; the
    /// caller only ever sees a [`BatchRun`].
    pub async fn run_scheduled(
        &self,
        batch: &ScheduledBatch,
    ) -> Result<BatchRun, SchedulerError> {
        let acquired = self
            .guards
            .try_acquire(&batch.session_id, self.settings.guard_ttl_secs)
            .await?;
        if !acquired {
            warn!(session = %batch.session_id, "Execution guard held, suppressing duplicate batch");
            return Ok(BatchRun::Suppressed);
        }

        let run = self.execute(batch).await;

        // Released whatever happened inside; the guard also self-expires in
        // case the process dies before reaching this line.
        self.guards.release(&batch.session_id).await?;
        run
    }

    async fn execute(&self, batch: &ScheduledBatch) -> Result<BatchRun, SchedulerError> {
        let Some(session) = self.sessions.find(&batch.session_id).await? else {
            warn!(session = %batch.session_id, "Scheduled batch for unknown session, dropping");
            return Ok(BatchRun::Suppressed);
        };
        let resource = session.resource;
        let starting_cursor = self
            .cursors
            .get(resource)
            .await?
            .unwrap_or(Cursor::Start);

        let ctx = BatchContext::new(batch.session_id.clone(), batch.store.clone());
        let outcome = match self.processor.run_batch(&ctx).await {
            Ok(outcome) => outcome,
            Err(BatchError::State(e)) => return Err(e.into()),
            Err(BatchError::SessionNotActive { id, status }) => {
                warn!(session = %id, status = %status, "Session no longer active, dropping batch");
                return Ok(BatchRun::Suppressed);
            }
            Err(err) => return self.fail_session(&session.id, err).await,
        };

        if !outcome.has_next_page {
            self.sessions
                .update(
                    &session.id,
                    &SessionPatch::status(SessionStatus::Completed)
                        .with_message("Import completed"),
                )
                .await?;
            info!(session = %session.id, "Import completed");
            return Ok(BatchRun::Completed);
        }

        // A repeated or missing cursor means the source has no more
        // distinguishable pages; rescheduling would loop forever.
        if outcome.next_cursor == starting_cursor || outcome.next_cursor.is_start() {
            self.cursors.clear(resource).await?;
            self.sessions
                .update(
                    &session.id,
                    &SessionPatch::status(SessionStatus::Completed).with_message(
                        "Import completed: source repeated a page cursor, no further pages",
                    ),
                )
                .await?;
            warn!(session = %session.id, "Repeated cursor from source, forcing completion");
            return Ok(BatchRun::CompletedAnomalously);
        }

        let next = ScheduledBatch {
            session_id: session.id.clone(),
            store: batch.store.clone(),
            delay_secs: self.settings.reschedule_delay_secs,
        };
        self.dispatcher.schedule_once(next.clone()).await?;
        Ok(BatchRun::Continued { next })
    }

    async fn fail_session(
        &self,
        id: &SessionId,
        err: BatchError,
    ) -> Result<BatchRun, SchedulerError> {
        let message = err.to_string();
        warn!(session = %id, error = %message, auth = err.is_auth(), "Batch failed, marking session failed");
        self.sessions
            .update(
                id,
                &SessionPatch::status(SessionStatus::Failed).with_message(message.clone()),
            )
            .await?;
        Ok(BatchRun::Failed { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::QueueDispatcher;
    use async_trait::async_trait;
    use connectors::error::FetchError;
    use engine_core::state::sled_store::SledStateStore;
    use engine_processing::upsert::EntityUpserter;
    use model::records::{
        outcome::{UpsertOutcome, UpsertReport},
        page::{CountResult, PageResult},
        record::Record,
    };
    use model::filter::ImportFilters;
    use serde_json::json;
    use std::{collections::VecDeque, sync::Mutex};
    use tempfile::tempdir;

    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<PageResult, FetchError>>>,
        count: CountResult,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<PageResult, FetchError>>, count: CountResult) -> Self {
            ScriptedSource {
                pages: Mutex::new(pages.into()),
                count,
            }
        }
    }

    #[async_trait]
    impl RecordSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _resource: ResourceType,
            _filters: &ImportFilters,
            _page_size: u32,
            _after: &Cursor,
        ) -> Result<PageResult, FetchError> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted page left")
        }

        async fn count(
            &self,
            _resource: ResourceType,
            _filters: &ImportFilters,
        ) -> Result<CountResult, FetchError> {
            Ok(self.count)
        }
    }

    struct ImportAll;

    #[async_trait]
    impl EntityUpserter for ImportAll {
        async fn upsert(
            &self,
            _resource: ResourceType,
            _record: &Record,
            _options: &ImportOptions,
        ) -> UpsertReport {
            UpsertReport::new(UpsertOutcome::Imported)
        }
    }

    fn page(count: usize, has_next: bool, cursor: Option<&str>) -> PageResult {
        PageResult {
            records: (0..count)
                .map(|i| Record::new(json!({"id": format!("p{i}")})))
                .collect(),
            has_next_page: has_next,
            end_cursor: cursor.map(str::to_string),
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<SledStateStore>,
        dispatcher: Arc<QueueDispatcher>,
        scheduler: ImportScheduler,
    }

    fn fixture(pages: Vec<Result<PageResult, FetchError>>, count: CountResult) -> Fixture {
        let dir = tempdir().unwrap();
        let store = Arc::new(SledStateStore::open(dir.path()).unwrap());
        let source = Arc::new(ScriptedSource::new(pages, count));
        let dispatcher = Arc::new(QueueDispatcher::new());
        let mut settings = EngineSettings::default();
        settings.reschedule_delay_secs = 0;

        let processor = Arc::new(BatchProcessor::new(
            source.clone(),
            Arc::new(ImportAll),
            store.clone(),
            store.clone(),
            settings.clone(),
        ));
        let scheduler = ImportScheduler::new(
            store.clone(),
            store.clone(),
            store.clone(),
            source,
            processor,
            dispatcher.clone(),
            settings,
        );
        Fixture {
            _dir: dir,
            store,
            dispatcher,
            scheduler,
        }
    }

    fn store_id() -> StoreId {
        StoreId::new("store-7")
    }

    #[tokio::test]
    async fn start_import_counts_products_and_enqueues_first_batch() {
        let f = fixture(
            vec![],
            CountResult {
                count: 250,
                is_partial: true,
            },
        );

        let outcome = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
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
        assert_eq!(items_total, 250);
        assert!(total_estimated);
        assert_eq!(f.dispatcher.len(), 1);

        let session = f.store.find(&session_id).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Initializing);
    }

    #[tokio::test]
    async fn second_start_returns_existing_session_without_a_new_row() {
        let f = fixture(
            vec![],
            CountResult {
                count: 0,
                is_partial: false,
            },
        );
        let first = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        let second = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();

        assert!(matches!(second, StartOutcome::AlreadyRunning { .. }));
        assert_eq!(second.session_id(), first.session_id());
        assert_eq!(f.store.count_running(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fresh_start_clears_a_stale_cursor() {
        let f = fixture(
            vec![],
            CountResult {
                count: 0,
                is_partial: false,
            },
        );
        f.store
            .set(ResourceType::Products, &Cursor::At("stale".into()))
            .await
            .unwrap();

        f.scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();

        assert!(f.store.get(ResourceType::Products).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batch_with_more_pages_reschedules_exactly_once() {
        let f = fixture(
            vec![Ok(page(3, true, Some("c1")))],
            CountResult {
                count: 6,
                is_partial: false,
            },
        );
        let started = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        let first = f.dispatcher.pop().unwrap();

        let run = f.scheduler.run_scheduled(&first).await.unwrap();
        let BatchRun::Continued { next } = run else {
            panic!("expected a follow-up batch");
        };
        assert_eq!(&next.session_id, started.session_id());
        assert_eq!(f.dispatcher.len(), 1, "exactly one follow-up enqueued");
    }

    #[tokio::test]
    async fn final_batch_completes_the_session() {
        let f = fixture(
            vec![Ok(page(3, false, Some("c1")))],
            CountResult {
                count: 3,
                is_partial: false,
            },
        );
        let started = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        let first = f.dispatcher.pop().unwrap();

        let run = f.scheduler.run_scheduled(&first).await.unwrap();
        assert!(matches!(run, BatchRun::Completed));

        let session = f.store.find(started.session_id()).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.completed_at.is_some());
    }

    #[tokio::test]
    async fn repeated_cursor_forces_completion_instead_of_looping() {
        let f = fixture(
            vec![Ok(page(2, true, Some("same"))), Ok(page(2, true, Some("same")))],
            CountResult {
                count: 100,
                is_partial: false,
            },
        );
        let started = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        let first = f.dispatcher.pop().unwrap();

        let run = f.scheduler.run_scheduled(&first).await.unwrap();
        let BatchRun::Continued { next } = run else {
            panic!("first page should continue");
        };
        f.dispatcher.pop();

        let run = f.scheduler.run_scheduled(&next).await.unwrap();
        assert!(matches!(run, BatchRun::CompletedAnomalously));
        assert!(f.dispatcher.is_empty(), "no further batch enqueued");

        let session = f.store.find(started.session_id()).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.message.unwrap().contains("repeated"));
        assert!(
            f.store.get(ResourceType::Products).await.unwrap().is_none(),
            "cursor slot freed"
        );
    }

    #[tokio::test]
    async fn fetch_auth_failure_marks_session_failed_with_indicator() {
        let f = fixture(
            vec![Err(FetchError::Auth { status: 401 })],
            CountResult {
                count: 10,
                is_partial: false,
            },
        );
        let started = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        let first = f.dispatcher.pop().unwrap();

        let run = f.scheduler.run_scheduled(&first).await.unwrap();
        let BatchRun::Failed { message } = run else {
            panic!("expected failure");
        };
        assert!(message.contains("Authorization"));

        let session = f.store.find(started.session_id()).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Failed);
        assert!(session.message.unwrap().contains("Authorization"));
        assert!(
            f.store.get(ResourceType::Products).await.unwrap().is_none(),
            "no cursor written on a failed fetch"
        );
    }

    #[tokio::test]
    async fn held_guard_suppresses_a_duplicate_trigger() {
        let f = fixture(
            vec![],
            CountResult {
                count: 0,
                is_partial: false,
            },
        );
        let started = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        let first = f.dispatcher.pop().unwrap();

        f.store.try_acquire(started.session_id(), 300).await.unwrap();
        let run = f.scheduler.run_scheduled(&first).await.unwrap();
        assert!(matches!(run, BatchRun::Suppressed));
    }

    #[tokio::test]
    async fn terminal_session_batch_is_dropped_without_transition() {
        let f = fixture(
            vec![],
            CountResult {
                count: 0,
                is_partial: false,
            },
        );
        let started = f
            .scheduler
            .start_import(&store_id(), ResourceType::Products, ImportOptions::default())
            .await
            .unwrap();
        f.store
            .update(
                started.session_id(),
                &SessionPatch::status(SessionStatus::Failed),
            )
            .await
            .unwrap();
        let first = f.dispatcher.pop().unwrap();

        let run = f.scheduler.run_scheduled(&first).await.unwrap();
        assert!(matches!(run, BatchRun::Suppressed));

        let session = f.store.find(started.session_id()).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Failed, "terminal state untouched");
    }
}
