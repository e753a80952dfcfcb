use crate::{
    commands::{Commands, FilterArgs, ImportTarget},
    error::CliError,
    export::FileExportUpserter,
};
use clap::Parser;
use connectors::{
    graphql::client::{GraphQlClient, ShopCredentials},
    transport::ReqwestTransport,
};
use engine_core::{
    progress::ProgressService,
    settings::EngineSettings,
    state::sled_store::SledStateStore,
};
use engine_processing::batch::BatchProcessor;
use engine_runtime::{
    dispatch::{QueueDispatcher, ScheduledBatch},
    executor::ImportExecutor,
    reaper::SessionReaper,
    scheduler::{ImportScheduler, StartOutcome},
};
use model::{
    core::identifiers::{SessionId, StoreId},
    filter::ImportOptions,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{Level, info};

mod commands;
mod error;
mod export;
mod output;

#[derive(Parser)]
#[command(name = "shopsync", version = "0.1.0", about = "Shopify import tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Serialize)]
struct StartResponse {
    session_id: String,
    already_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    items_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_estimated: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            target,
            filters,
            page_size,
            out,
        } => {
            let state = open_state_store()?;
            let engine = build_engine(
                state.clone(),
                &target,
                out.as_deref().unwrap_or("./export"),
            )?;
            let options = ImportOptions {
                filters: filters.into_filters(),
                page_size,
            };
            let store = StoreId::new(target.store);

            let outcome = engine
                .scheduler
                .start_import(&store, target.resource, options)
                .await?;
            if let StartOutcome::AlreadyRunning { session_id } = &outcome {
                info!(session = %session_id, "Resuming active session");
                engine
                    .executor
                    .enqueue(ScheduledBatch::immediate(session_id.clone(), store))
                    .await?;
            }
            engine.executor.drain().await?;

            let report = ProgressService::new(state)
                .get_progress(outcome.session_id())
                .await?;
            output::print_progress(&report);
        }
        Commands::Start {
            target,
            filters,
            page_size,
        } => {
            let state = open_state_store()?;
            let engine = build_engine(state, &target, "./export")?;
            let options = ImportOptions {
                filters: filters.into_filters(),
                page_size,
            };
            let store = StoreId::new(target.store);

            let outcome = engine
                .scheduler
                .start_import(&store, target.resource, options)
                .await?;
            let response = match outcome {
                StartOutcome::Started {
                    session_id,
                    items_total,
                    total_estimated,
                } => StartResponse {
                    session_id: session_id.to_string(),
                    already_running: false,
                    items_total: Some(items_total),
                    total_estimated: Some(total_estimated),
                },
                StartOutcome::AlreadyRunning { session_id } => StartResponse {
                    session_id: session_id.to_string(),
                    already_running: true,
                    items_total: None,
                    total_estimated: None,
                },
            };
            output::print_json(&response)?;
        }
        Commands::Progress { session, json } => {
            let state = open_state_store()?;
            let report = ProgressService::new(state)
                .get_progress(&SessionId::new(session))
                .await?;
            if json {
                output::print_json(&report)?;
            } else {
                output::print_progress(&report);
            }
        }
        Commands::Reap { threshold_secs } => {
            let state = open_state_store()?;
            let mut settings = EngineSettings::default();
            settings.stuck_threshold_secs = threshold_secs;

            let reaped = SessionReaper::new(state, settings).reap().await?;
            if reaped.is_empty() {
                info!("No stuck sessions");
            } else {
                for id in &reaped {
                    println!("{id}");
                }
                info!(count = reaped.len(), "Reaped stuck sessions");
            }
        }
    }

    Ok(())
}

struct Engine {
    scheduler: Arc<ImportScheduler>,
    executor: ImportExecutor,
}

fn build_engine(
    state: Arc<SledStateStore>,
    target: &ImportTarget,
    out_dir: &str,
) -> Result<Engine, CliError> {
    let access_token = target
        .access_token
        .clone()
        .or_else(|| std::env::var("SHOPSYNC_ACCESS_TOKEN").ok())
        .ok_or_else(|| {
            CliError::MissingCredential(
                "pass --access-token or set SHOPSYNC_ACCESS_TOKEN".into(),
            )
        })?;

    let source = Arc::new(GraphQlClient::new(
        ReqwestTransport::new(),
        ShopCredentials::new(target.shop_domain.clone(), access_token),
    ));
    let upserter = Arc::new(FileExportUpserter::new(out_dir)?);
    let dispatcher = Arc::new(QueueDispatcher::new());
    let settings = EngineSettings::default();

    let processor = Arc::new(BatchProcessor::new(
        source.clone(),
        upserter,
        state.clone(),
        state.clone(),
        settings.clone(),
    ));
    let scheduler = Arc::new(ImportScheduler::new(
        state.clone(),
        state.clone(),
        state,
        source,
        processor,
        dispatcher.clone(),
        settings,
    ));
    let executor = ImportExecutor::new(scheduler.clone(), dispatcher);

    Ok(Engine { scheduler, executor })
}

fn open_state_store() -> Result<Arc<SledStateStore>, CliError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Unexpected("Could not determine home directory".into()))?;
    let path = home.join(".shopsync/state");
    let store = SledStateStore::open(&path).map_err(|err| {
        CliError::Unexpected(format!(
            "Failed to open state store at {}: {err}",
            path.display()
        ))
    })?;
    Ok(Arc::new(store))
}
