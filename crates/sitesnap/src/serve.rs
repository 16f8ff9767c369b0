// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sitesnap serve` command implementation.
//!
//! Wires the full bot: SQLite storage with migrations, Google Sheets
//! stores, the Telegram dispatcher and transport, the workflow engine,
//! and the export job worker. Shuts down on SIGINT/SIGTERM via a shared
//! cancellation token; the database is checkpointed and closed last.

use std::sync::Arc;
use std::time::Duration;

use sitesnap_config::SitesnapConfig;
use sitesnap_core::SitesnapError;
use sitesnap_engine::WorkflowEngine;
use sitesnap_jobs::{JobStore, JobWorker, SitesnapJobQueue};
use sitesnap_sheets::{SheetCatalog, SheetPersonDirectory, SheetsClient};
use sitesnap_storage::{Database, SqliteSessionStore, SqliteSubmissionLog};
use sitesnap_telegram::SitesnapTransport;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::shutdown;

/// Inbound event channel capacity. Long polling backs off upstream when
/// the engine falls behind.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Runs the `sitesnap serve` command.
pub async fn run_serve(config: SitesnapConfig) -> Result<(), SitesnapError> {
    init_tracing(&config.agent.log_level);
    info!(agent = %config.agent.name, "starting sitesnap serve");

    let bot = sitesnap_telegram::gateway_bot(&config.telegram)?;
    let api_key = config
        .sheets
        .api_key
        .clone()
        .ok_or_else(|| SitesnapError::Config("sheets.api_key is required to serve".into()))?;

    // Storage: one shared connection for sessions and the audit log.
    let db = Database::open(&config.storage.database_path).await?;
    let store = Arc::new(SqliteSessionStore::new(db.clone()));
    let audit = Arc::new(SqliteSubmissionLog::new(db.clone()));

    // Sheets-backed catalog and person directory.
    let client = Arc::new(SheetsClient::with_base_url(
        api_key,
        &config.sheets.base_url,
    )?);
    let catalog = Arc::new(SheetCatalog::new(client.clone(), config.sheets.clone()));
    let persons = Arc::new(SheetPersonDirectory::new(
        client,
        config.sheets.persons.clone(),
        Duration::from_secs(config.sheets.cache_ttl_secs),
    ));

    let transport = Arc::new(SitesnapTransport::new(bot.clone()));

    // Job queue opens its own connection to the same database file; the
    // jobs table already exists after the migrations above.
    let job_store = JobStore::open(&config.storage.database_path).await?;
    let jobs = Arc::new(SitesnapJobQueue::new(
        job_store.clone(),
        config.jobs.max_attempts,
    ));

    let engine = Arc::new(WorkflowEngine::new(
        catalog,
        persons,
        store,
        audit,
        transport.clone(),
        jobs,
        config.media.clone(),
    ));

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let dispatcher = sitesnap_telegram::spawn_dispatcher(bot, events_tx);

    let cancel = shutdown::install_signal_handler();

    let worker = JobWorker::new(job_store, transport, config.jobs.clone());
    let worker_handle = tokio::spawn(worker.run(cancel.clone()));

    // The engine loop owns the current task until shutdown.
    engine.run(events_rx, cancel.clone()).await;

    // Engine returned: either cancellation fired or the event channel
    // closed. Either way, take everything else down.
    cancel.cancel();
    if let Err(e) = worker_handle.await {
        error!(error = %e, "job worker task panicked");
    }
    dispatcher.abort();

    // Close last so every writer is gone before the WAL checkpoint.
    db.close().await?;
    info!("sitesnap serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitesnap={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
