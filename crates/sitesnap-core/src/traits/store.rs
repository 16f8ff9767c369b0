// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session persistence and the submission audit log.

use async_trait::async_trait;

use crate::error::SitesnapError;
use crate::types::{SubmittedFile, UploadSession};

/// Durable session storage with an in-process lookup cache.
///
/// `find` consults the cache first and falls back to the database;
/// writes go through to the database and refresh the cache. Mutual
/// exclusion around read-modify-persist is the caller's job (the engine
/// holds a per-session lock across the whole cycle).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &UploadSession) -> Result<(), SitesnapError>;

    async fn find(&self, session_id: &str) -> Result<Option<UploadSession>, SitesnapError>;

    async fn update(&self, session: &UploadSession) -> Result<(), SitesnapError>;

    async fn delete(&self, session_id: &str) -> Result<(), SitesnapError>;
}

/// Append-only audit trail of session starts and file submissions.
#[async_trait]
pub trait SubmissionLog: Send + Sync {
    /// Record that collection started for a session (one row per entry
    /// into `Collecting`, so re-entries stay visible).
    async fn log_session_started(&self, session: &UploadSession) -> Result<(), SitesnapError>;

    /// Record one submitted file. Resubmissions append again; the audit
    /// trail keeps every attempt even though the session holds only the
    /// latest.
    async fn log_file_submitted(
        &self,
        session_id: &str,
        file: &SubmittedFile,
    ) -> Result<(), SitesnapError>;
}
