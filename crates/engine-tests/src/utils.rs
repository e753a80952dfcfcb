use async_trait::async_trait;
use connectors::{
    graphql::client::{GraphQlClient, ShopCredentials},
    transport::{Transport, TransportError, TransportRequest, TransportResponse},
};
use engine_core::{
    progress::ProgressService,
    settings::EngineSettings,
    state::sled_store::SledStateStore,
};
use engine_processing::{batch::BatchProcessor, upsert::EntityUpserter};
use engine_runtime::{
    dispatch::QueueDispatcher,
    executor::ImportExecutor,
    scheduler::ImportScheduler,
};
use model::{
    core::identifiers::StoreId,
    core::resource::ResourceType,
    filter::ImportOptions,
    records::{
        outcome::{UpsertOutcome, UpsertReport},
        record::Record,
    },
};
use serde_json::{Value, json};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

/// Pops one canned HTTP response per request, in script order.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
        ScriptedTransport {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        _request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted transport ran out of responses")
    }
}

pub fn ok(body: Value) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status: 200,
        body: body.to_string(),
    })
}

pub fn http_status(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status,
        body: body.to_string(),
    })
}

/// A products page in the `nodes` shape.
pub fn products_page(start: usize, count: usize, has_next: bool, end_cursor: Option<&str>) -> Value {
    let nodes: Vec<Value> = (start..start + count)
        .map(|i| {
            json!({
                "id": format!("gid://shopify/Product/{i}"),
                "title": format!("Product {i}"),
            })
        })
        .collect();
    json!({
        "data": {
            "products": {
                "pageInfo": {"hasNextPage": has_next, "endCursor": end_cursor},
                "nodes": nodes,
            }
        }
    })
}

/// The same logical page in the `edges`/`node` shape.
pub fn products_page_edges(
    start: usize,
    count: usize,
    has_next: bool,
    end_cursor: Option<&str>,
) -> Value {
    let edges: Vec<Value> = (start..start + count)
        .map(|i| {
            json!({
                "node": {
                    "id": format!("gid://shopify/Product/{i}"),
                    "title": format!("Product {i}"),
                }
            })
        })
        .collect();
    json!({
        "data": {
            "products": {
                "pageInfo": {"hasNextPage": has_next, "endCursor": end_cursor},
                "edges": edges,
            }
        }
    })
}

/// Id-only page answering the count probe.
pub fn count_page(count: usize, has_next: bool) -> Value {
    let nodes: Vec<Value> = (0..count)
        .map(|i| json!({"id": format!("gid://shopify/Product/{i}")}))
        .collect();
    json!({
        "data": {
            "products": {
                "pageInfo": {"hasNextPage": has_next, "endCursor": if count > 0 { Value::from("count-end") } else { Value::Null }},
                "nodes": nodes,
            }
        }
    })
}

/// Records every upserted id; ids in `fail_ids` report transform failures.
#[derive(Default)]
pub struct RecordingUpserter {
    pub seen: Mutex<Vec<String>>,
    pub fail_ids: Vec<String>,
}

impl RecordingUpserter {
    pub fn failing(fail_ids: Vec<String>) -> Self {
        RecordingUpserter {
            seen: Mutex::new(Vec::new()),
            fail_ids,
        }
    }

    pub fn seen_ids(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityUpserter for RecordingUpserter {
    async fn upsert(
        &self,
        _resource: ResourceType,
        record: &Record,
        _options: &ImportOptions,
    ) -> UpsertReport {
        let id = record.id().unwrap_or_default().to_string();
        self.seen.lock().unwrap().push(id.clone());
        if self.fail_ids.contains(&id) {
            UpsertReport::failed("transform error")
        } else {
            UpsertReport::new(UpsertOutcome::Imported)
        }
    }
}

/// Full engine wired against a scripted source and a temp sled store.
pub struct Harness {
    pub _dir: TempDir,
    pub state: Arc<SledStateStore>,
    pub upserter: Arc<RecordingUpserter>,
    pub dispatcher: Arc<QueueDispatcher>,
    pub scheduler: Arc<ImportScheduler>,
    pub executor: ImportExecutor,
    pub progress: ProgressService,
}

impl Harness {
    pub fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self::with_failing_ids(responses, Vec::new())
    }

    pub fn with_failing_ids(
        responses: Vec<Result<TransportResponse, TransportError>>,
        fail_ids: Vec<String>,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let state = Arc::new(SledStateStore::open(dir.path()).unwrap());
        let source = Arc::new(GraphQlClient::new(
            ScriptedTransport::new(responses),
            ShopCredentials::new("test-shop.myshopify.com", "shpat_test"),
        ));
        let upserter = Arc::new(RecordingUpserter::failing(fail_ids));
        let dispatcher = Arc::new(QueueDispatcher::new());

        let mut settings = EngineSettings::default();
        settings.reschedule_delay_secs = 0;

        let processor = Arc::new(BatchProcessor::new(
            source.clone(),
            upserter.clone(),
            state.clone(),
            state.clone(),
            settings.clone(),
        ));
        let scheduler = Arc::new(ImportScheduler::new(
            state.clone(),
            state.clone(),
            state.clone(),
            source,
            processor,
            dispatcher.clone(),
            settings,
        ));
        let executor = ImportExecutor::new(scheduler.clone(), dispatcher.clone());
        let progress = ProgressService::new(state.clone());

        Harness {
            _dir: dir,
            state,
            upserter,
            dispatcher,
            scheduler,
            executor,
            progress,
        }
    }
}

pub fn store_id() -> StoreId {
    StoreId::new("store-7")
}
