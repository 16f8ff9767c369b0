// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound chat transport consumed by the engine.

use async_trait::async_trait;

use crate::error::SitesnapError;
use crate::types::{MaintenanceRecord, PhotoRequest, ReviewDecision, WorkflowKind};

/// Everything the engine needs from the chat side: prompts, notices,
/// review-button edits, and file downloads.
///
/// Send failures are reported as errors but the engine treats most of
/// them as non-fatal (logged, workflow continues); only the session
/// persistence path aborts an operation.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Plain notice, HTML parse mode.
    async fn send_notice(&self, chat_id: i64, html: &str) -> Result<(), SitesnapError>;

    /// Ask the applicant for the maintenance record number, with a
    /// Cancel button.
    async fn prompt_record_id(&self, chat_id: i64, kind: WorkflowKind)
    -> Result<(), SitesnapError>;

    /// Show the resolved record (site, date) with Yes/No buttons.
    async fn prompt_record_confirm(
        &self,
        chat_id: i64,
        record: &MaintenanceRecord,
    ) -> Result<(), SitesnapError>;

    /// Deliver one photo request: example image, rendered caption, and
    /// Accept/Reject buttons carrying `(session_id, request_id)`.
    async fn send_photo_request(
        &self,
        chat_id: i64,
        session_id: &str,
        request: &PhotoRequest,
    ) -> Result<(), SitesnapError>;

    /// Flip a reviewed message's buttons to its outcome label.
    async fn mark_review_outcome(
        &self,
        chat_id: i64,
        message_id: i32,
        decision: ReviewDecision,
    ) -> Result<(), SitesnapError>;

    /// Download a submitted file's bytes by provider file id.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, SitesnapError>;
}
