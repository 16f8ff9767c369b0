// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reviewer accept/reject reconciliation and session finalization.
//!
//! Both verdicts require an Admin directory role. Staleness is checked
//! under the session lock: the session must exist, be in a reviewable
//! phase, and still hold the request and a submission for it; anything
//! else means the pressed button outlived the state it referred to.

use std::path::Path;

use sitesnap_core::{
    FinalRecordJob, Person, PersonRole, ReviewAction, ReviewDecision, ReviewStatus, SessionPhase,
    SitesnapError, SubmittedFile, UploadSession,
};
use tracing::{info, warn};

use crate::WorkflowEngine;

impl WorkflowEngine {
    pub(crate) async fn review(&self, action: ReviewAction) -> Result<(), SitesnapError> {
        let Some(username) = action.reviewer.username.clone() else {
            info!(session_id = %action.session_id, "review press without username ignored");
            return Ok(());
        };
        let person = self.persons.person_by_username(&username).await?;
        let Some(person) = person.filter(|p| p.role == PersonRole::Admin) else {
            info!(
                session_id = %action.session_id,
                reviewer = %username,
                "review press from non-admin ignored"
            );
            return Ok(());
        };

        let _guard = self.session_guard(&action.session_id).await;
        let stale = || SitesnapError::StaleReviewAction {
            session_id: action.session_id.clone(),
            request_id: action.request_id.clone(),
        };

        let Some(mut session) = self.store.find(&action.session_id).await? else {
            return Err(stale());
        };
        if !session.phase.is_reviewable() {
            return Err(stale());
        }
        if session.request(&action.request_id).is_none() {
            return Err(stale());
        }
        if !session.files.iter().any(|f| f.request_id == action.request_id) {
            return Err(stale());
        }

        match action.decision {
            ReviewDecision::Accept => self.accept(&mut session, &action, &person).await,
            ReviewDecision::Reject => self.reject(&mut session, &action, &person).await,
        }
    }

    async fn accept(
        &self,
        session: &mut UploadSession,
        action: &ReviewAction,
        person: &Person,
    ) -> Result<(), SitesnapError> {
        if let Some(request) = session.request_mut(&action.request_id) {
            request.status = ReviewStatus::Confirmed;
        }
        if let Some(file) = session.file_mut(&action.request_id) {
            file.status = ReviewStatus::Confirmed;
            file.reviewer = Some(person.id.clone());
        }

        // Cache the accepted bytes locally so the export job does not
        // depend on the transport's file URLs staying alive.
        let site = session
            .record
            .as_ref()
            .and_then(|r| r.site.clone())
            .unwrap_or_default();
        let snapshot = session
            .files
            .iter()
            .find(|f| f.request_id == action.request_id)
            .cloned();
        if let Some(snapshot) = snapshot {
            let cached = self.cache_accepted_file(&site, &snapshot).await;
            if let (Some(path), Some(file)) = (cached, session.file_mut(&action.request_id)) {
                file.file.path = Some(path);
            }
        }

        self.persist(session).await?;
        self.flip_buttons(action).await;
        info!(
            session_id = %session.id,
            request_id = %action.request_id,
            reviewer = %person.id,
            "file accepted"
        );

        if session_complete(session) {
            self.finalize(session).await?;
        }
        Ok(())
    }

    async fn reject(
        &self,
        session: &mut UploadSession,
        action: &ReviewAction,
        person: &Person,
    ) -> Result<(), SitesnapError> {
        if let Some(request) = session.request_mut(&action.request_id) {
            request.status = ReviewStatus::Rejected;
        }
        if let Some(file) = session.file_mut(&action.request_id) {
            file.status = ReviewStatus::Rejected;
            file.reviewer = Some(person.id.clone());
        }

        let was_closed = session.phase == SessionPhase::ReviewClosed;
        session.pending.retain(|id| id != &action.request_id);
        session.pending.insert(0, action.request_id.clone());
        session.phase = SessionPhase::Collecting;

        // Reviews were already closed, so no slot is open; redeliver the
        // rejected request right away instead of waiting on a submission
        // that would never come.
        if was_closed && session.awaiting_request_id.is_none() {
            self.send_next(session).await?;
        }

        self.persist(session).await?;
        self.flip_buttons(action).await;
        info!(
            session_id = %session.id,
            request_id = %action.request_id,
            reviewer = %person.id,
            "file rejected, request requeued"
        );
        Ok(())
    }

    /// Hand the completed record set to the job queue.
    ///
    /// An unacknowledged or failed enqueue leaves the session open so a
    /// repeated accept press can retry the handoff.
    async fn finalize(&self, session: &mut UploadSession) -> Result<(), SitesnapError> {
        let job = FinalRecordJob::from_session(session);
        let record_id = job.record_id.clone();
        match self.jobs.submit_final_record(job).await {
            Ok(true) => {
                session.phase = SessionPhase::AllSubmitted;
                let notice = format!(
                    "✅ All photographs for record <b>{record_id}</b> are accepted. Thank you!"
                );
                if let Err(err) = self.transport.send_notice(session.chat_id, &notice).await {
                    warn!(session_id = %session.id, error = %err, "handoff notice failed");
                }
                self.store.delete(&session.id).await?;
                self.forget_session_lock(&session.id);
                info!(session_id = %session.id, record_id = %record_id, "record set handed off");
            }
            Ok(false) => {
                warn!(
                    session_id = %session.id,
                    record_id = %record_id,
                    "handoff not acknowledged, session left open"
                );
            }
            Err(err) => {
                warn!(
                    session_id = %session.id,
                    record_id = %record_id,
                    error = %err,
                    "handoff failed, session left open"
                );
            }
        }
        Ok(())
    }

    /// Download the accepted file into the media cache.
    ///
    /// Bounded by `[media].download_attempts`; on exhaustion the file
    /// keeps only its transport URL and the export job falls back to it.
    async fn cache_accepted_file(&self, site: &str, file: &SubmittedFile) -> Option<String> {
        let dir = Path::new(&self.media.cache_dir);
        let name = format!("{}_{}_{}_{}", site, file.code, file.index, file.file.name);
        let path = dir.join(name);

        let attempts = self.media.download_attempts.max(1);
        for attempt in 1..=attempts {
            match self.transport.download_file(&file.file.file_id).await {
                Ok(bytes) => {
                    if let Err(err) = tokio::fs::create_dir_all(dir).await {
                        warn!(error = %err, "cannot create media cache dir");
                        return None;
                    }
                    return match tokio::fs::write(&path, &bytes).await {
                        Ok(()) => Some(path.to_string_lossy().into_owned()),
                        Err(err) => {
                            warn!(path = %path.display(), error = %err, "cache write failed");
                            None
                        }
                    };
                }
                Err(err) => {
                    warn!(
                        file_id = %file.file.file_id,
                        attempt,
                        attempts,
                        error = %err,
                        "file download failed"
                    );
                }
            }
        }
        None
    }

    async fn flip_buttons(&self, action: &ReviewAction) {
        let Some(message_id) = action.message_id else {
            return;
        };
        if let Err(err) = self
            .transport
            .mark_review_outcome(action.chat_id, message_id, action.decision)
            .await
        {
            warn!(
                session_id = %action.session_id,
                message_id,
                error = %err,
                "could not flip review buttons"
            );
        }
    }
}

/// All requests filed, reviews closed, and every file confirmed.
fn session_complete(session: &UploadSession) -> bool {
    session.phase == SessionPhase::ReviewClosed
        && session.pending.is_empty()
        && !session.files.is_empty()
        && session
            .files
            .iter()
            .all(|f| f.status == ReviewStatus::Confirmed)
}
