// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `JobQueue` adapter between the engine and the durable store.

use async_trait::async_trait;
use sitesnap_core::{FinalRecordJob, JobQueue, SitesnapError};
use tracing::info;

use crate::store::JobStore;

/// Job kind for a finalized record set awaiting export.
pub const KIND_FINAL_RECORD: &str = "final_record";
/// Job kind for a chat notification owed after an export.
pub const KIND_NOTIFY: &str = "notify";

/// Durable enqueue of finalized record sets.
pub struct SitesnapJobQueue {
    store: JobStore,
    max_attempts: u32,
}

impl SitesnapJobQueue {
    pub fn new(store: JobStore, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }
}

#[async_trait]
impl JobQueue for SitesnapJobQueue {
    async fn submit_final_record(&self, job: FinalRecordJob) -> Result<bool, SitesnapError> {
        let payload = serde_json::to_string(&job).map_err(SitesnapError::storage)?;
        let job_id = self
            .store
            .enqueue(KIND_FINAL_RECORD, &payload, self.max_attempts)
            .await?;
        info!(
            job_id = %job_id,
            session_id = %job.session_id,
            record_id = %job.record_id,
            files = job.file_count(),
            "final record enqueued"
        );
        Ok(true)
    }
}
