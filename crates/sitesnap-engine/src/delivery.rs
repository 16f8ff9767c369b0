// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request delivery: opening the next submission slot.

use sitesnap_core::{text, SitesnapError, UploadSession};
use tracing::warn;

use crate::WorkflowEngine;

impl WorkflowEngine {
    /// Pop the queue front and open it for submission.
    ///
    /// A pending id without a matching request is a corrupt leftover;
    /// it is logged and skipped. Send failures degrade to a plain text
    /// prompt with the example link, and the slot opens either way so
    /// the applicant is never stuck waiting on a prompt that will not
    /// come.
    ///
    /// Does not persist; the caller owns the write.
    pub(crate) async fn send_next(
        &self,
        session: &mut UploadSession,
    ) -> Result<(), SitesnapError> {
        while !session.pending.is_empty() {
            let request_id = session.pending.remove(0);
            let Some(request) = session.request(&request_id).cloned() else {
                warn!(
                    session_id = %session.id,
                    request_id = %request_id,
                    "pending id has no request, skipping"
                );
                continue;
            };

            if let Err(err) = self
                .transport
                .send_photo_request(session.chat_id, &session.id, &request)
                .await
            {
                warn!(
                    session_id = %session.id,
                    request_id = %request_id,
                    error = %err,
                    "photo request send failed, degrading to text prompt"
                );
                let fallback = format!(
                    "{}\nExample: {}",
                    request.prompt,
                    text::escape_html(&request.example_url)
                );
                if let Err(err) = self.transport.send_notice(session.chat_id, &fallback).await {
                    warn!(
                        session_id = %session.id,
                        error = %err,
                        "fallback prompt failed as well"
                    );
                }
            }

            session.awaiting_request_id = Some(request_id);
            return Ok(());
        }

        session.awaiting_request_id = None;
        Ok(())
    }
}
