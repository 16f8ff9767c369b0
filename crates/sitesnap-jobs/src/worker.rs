// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background worker draining the job queue.
//!
//! `final_record` jobs are exported as one JSON bundle per record under
//! `[jobs].export_dir/<site>/`, after which a `notify` job is enqueued
//! for the originating chat. Keeping export and notification as
//! separate jobs means a flaky chat transport cannot force a re-export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sitesnap_config::JobsConfig;
use sitesnap_core::{ChatTransport, FinalRecordJob, SitesnapError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::queue::{KIND_FINAL_RECORD, KIND_NOTIFY};
use crate::store::{Job, JobStore};

/// Payload of a `notify` job.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyPayload {
    pub chat_id: i64,
    pub html: String,
}

/// Poll-driven queue consumer.
pub struct JobWorker {
    store: JobStore,
    transport: Arc<dyn ChatTransport>,
    config: JobsConfig,
}

impl JobWorker {
    pub fn new(store: JobStore, transport: Arc<dyn ChatTransport>, config: JobsConfig) -> Self {
        Self {
            store,
            transport,
            config,
        }
    }

    /// Poll until cancelled. Each tick drains everything runnable.
    pub async fn run(self, cancel: CancellationToken) {
        info!(poll_secs = self.config.poll_secs, "job worker started");
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.config.poll_secs.max(1)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.drain().await;
                }
                _ = cancel.cancelled() => break,
            }
        }
        info!("job worker stopped");
    }

    /// Claim and process runnable jobs until the queue is quiet.
    /// Returns the number of jobs handled.
    pub async fn drain(&self) -> usize {
        let mut handled = 0;
        loop {
            let job = match self.store.claim(self.config.lease_secs).await {
                Ok(Some(job)) => job,
                Ok(None) => break,
                Err(err) => {
                    error!(error = %err, "job claim failed");
                    break;
                }
            };

            let job_id = job.id.clone();
            let kind = job.kind.clone();
            match self.process(job).await {
                Ok(()) => {
                    if let Err(err) = self.store.ack(&job_id).await {
                        error!(job_id = %job_id, error = %err, "job ack failed");
                    }
                }
                Err(err) => {
                    warn!(job_id = %job_id, kind = %kind, error = %err, "job failed");
                    if let Err(err) = self.store.fail(&job_id).await {
                        error!(job_id = %job_id, error = %err, "job fail-mark failed");
                    }
                }
            }
            handled += 1;
        }
        handled
    }

    async fn process(&self, job: Job) -> Result<(), SitesnapError> {
        match job.kind.as_str() {
            KIND_FINAL_RECORD => {
                let record: FinalRecordJob =
                    serde_json::from_str(&job.payload).map_err(SitesnapError::storage)?;
                let path = self.export_record(&record).await?;
                info!(
                    session_id = %record.session_id,
                    record_id = %record.record_id,
                    path = %path.display(),
                    files = record.file_count(),
                    "record bundle exported"
                );

                let notify = NotifyPayload {
                    chat_id: record.chat_id,
                    html: format!(
                        "📦 Record <b>{}</b> exported with {} photographs.",
                        record.record_id,
                        record.file_count()
                    ),
                };
                let payload =
                    serde_json::to_string(&notify).map_err(SitesnapError::storage)?;
                self.store
                    .enqueue(KIND_NOTIFY, &payload, self.config.max_attempts)
                    .await?;
                Ok(())
            }
            KIND_NOTIFY => {
                let notify: NotifyPayload =
                    serde_json::from_str(&job.payload).map_err(SitesnapError::storage)?;
                self.transport.send_notice(notify.chat_id, &notify.html).await
            }
            other => Err(SitesnapError::Internal(format!("unknown job kind: {other}"))),
        }
    }

    /// Write the record bundle under `export_dir/<site>/`.
    async fn export_record(&self, record: &FinalRecordJob) -> Result<PathBuf, SitesnapError> {
        let site = if record.site.is_empty() {
            "unknown-site"
        } else {
            record.site.as_str()
        };
        let dir = Path::new(&self.config.export_dir).join(site);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(SitesnapError::storage)?;

        let path = dir.join(format!("{}_{}.json", record.record_id, record.session_id));
        let bytes = serde_json::to_vec_pretty(record).map_err(SitesnapError::storage)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(SitesnapError::storage)?;
        Ok(path)
    }
}
