// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo and document submission handling.

use sitesnap_core::{
    FileHandle, ReviewStatus, SessionPhase, SitesnapError, SubmittedFile, UploadSession, UserRef,
};
use tracing::info;

use crate::WorkflowEngine;

impl WorkflowEngine {
    /// Bind an inbound photo to the open request.
    ///
    /// The audit row is written before the session mutates: a
    /// submission that cannot be audited is refused, and the slot stays
    /// open for a retry.
    pub(crate) async fn photo_submitted(
        &self,
        chat_id: i64,
        user: UserRef,
        file: FileHandle,
    ) -> Result<(), SitesnapError> {
        let session_id = UploadSession::derive_id(chat_id, user.id);
        let _guard = self.session_guard(&session_id).await;
        let Some(mut session) = self.store.find(&session_id).await? else {
            // Stray photo from someone without a session; not our update.
            return Ok(());
        };
        if session.phase == SessionPhase::Entering {
            return Ok(());
        }

        let Some(request_id) = session.awaiting_request_id.clone() else {
            return Err(SitesnapError::NoActiveRequest { session_id });
        };
        let Some(request) = session.request(&request_id).cloned() else {
            return Err(SitesnapError::NoActiveRequest { session_id });
        };

        let submitted = SubmittedFile::from_request(&request, &file);
        self.audit.log_file_submitted(&session.id, &submitted).await?;

        session.put_file(submitted);
        if let Some(request) = session.request_mut(&request_id) {
            // A resubmission after rejection reopens the review.
            request.status = ReviewStatus::Unknown;
        }
        session.awaiting_request_id = None;

        if session.pending.is_empty() {
            session.phase = SessionPhase::ReviewClosed;
            self.persist(&mut session).await?;
            self.transport
                .send_notice(
                    chat_id,
                    "All photographs are in. A reviewer will now accept or reject each one.",
                )
                .await?;
        } else {
            self.send_next(&mut session).await?;
            self.persist(&mut session).await?;
        }

        info!(
            session_id = %session.id,
            request_id = %request_id,
            file_id = %file.file_id,
            "file submitted"
        );
        Ok(())
    }

    /// An uncompressed document: explain how to resend, if a slot is open.
    pub(crate) async fn document_submitted(
        &self,
        chat_id: i64,
        user: UserRef,
    ) -> Result<(), SitesnapError> {
        let session_id = UploadSession::derive_id(chat_id, user.id);
        let Some(session) = self.store.find(&session_id).await? else {
            return Ok(());
        };
        if session.phase != SessionPhase::Collecting || session.awaiting_request_id.is_none() {
            return Ok(());
        }
        self.transport
            .send_notice(
                chat_id,
                "Please resend that as a photo with compression enabled. \
                 Uncompressed files cannot be attached to the record.",
            )
            .await?;
        Ok(())
    }
}
