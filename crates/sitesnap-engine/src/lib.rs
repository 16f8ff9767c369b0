// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workflow engine driving Sitesnap upload sessions.
//!
//! The engine consumes [`WorkflowEvent`]s from an mpsc channel and runs
//! each one on its own task behind a per-session async lock, so events
//! for different sessions proceed in parallel while one session's
//! read-modify-persist cycles stay serialized. Handler failures are
//! contained at the dispatch boundary: user-recoverable conditions turn
//! into chat guidance, everything else is logged and answered with a
//! generic retry notice.

use std::sync::Arc;

use dashmap::DashMap;
use sitesnap_config::MediaConfig;
use sitesnap_core::{
    now_iso, CatalogStore, ChatTransport, JobQueue, PersonDirectory, SessionStore, SitesnapError,
    SubmissionLog, UploadSession, WorkflowEvent,
};
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub mod generator;

mod delivery;
mod lifecycle;
mod review;
mod submission;

#[cfg(test)]
pub(crate) mod testutil;

/// The workflow engine. One instance serves every chat.
pub struct WorkflowEngine {
    pub(crate) catalog: Arc<dyn CatalogStore>,
    pub(crate) persons: Arc<dyn PersonDirectory>,
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) audit: Arc<dyn SubmissionLog>,
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) jobs: Arc<dyn JobQueue>,
    pub(crate) media: MediaConfig,
    /// One async mutex per live session id. Entries are dropped when the
    /// session row is deleted.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WorkflowEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        persons: Arc<dyn PersonDirectory>,
        store: Arc<dyn SessionStore>,
        audit: Arc<dyn SubmissionLog>,
        transport: Arc<dyn ChatTransport>,
        jobs: Arc<dyn JobQueue>,
        media: MediaConfig,
    ) -> Self {
        Self {
            catalog,
            persons,
            store,
            audit,
            transport,
            jobs,
            media,
            locks: DashMap::new(),
        }
    }

    /// Consume events until the channel closes or `cancel` fires.
    ///
    /// Every event runs on its own task; the per-session lock inside the
    /// handlers provides the ordering that matters.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<WorkflowEvent>,
        cancel: CancellationToken,
    ) {
        info!("workflow engine started");
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            let engine = self.clone();
                            tokio::spawn(async move {
                                engine.dispatch(event).await;
                            });
                        }
                        None => break,
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }
        info!("workflow engine stopped");
    }

    /// Error boundary around one event.
    pub async fn dispatch(&self, event: WorkflowEvent) {
        let chat_id = event.chat_id();
        let kind = event.kind_name();
        debug!(chat_id, event = kind, "event received");

        match self.handle_event(event).await {
            Ok(()) => {}
            Err(err) if err.is_user_recoverable() => {
                debug!(chat_id, event = kind, error = %err, "recoverable workflow condition");
                if let Some(notice) = recoverable_notice(&err) {
                    if let Err(send_err) = self.transport.send_notice(chat_id, notice).await {
                        warn!(chat_id, error = %send_err, "failed to send guidance notice");
                    }
                }
            }
            Err(err) => {
                error!(chat_id, event = kind, error = %err, "event handling failed");
                let notice =
                    "Something went wrong on our side. Please try again, or restart with /cancel.";
                if let Err(send_err) = self.transport.send_notice(chat_id, notice).await {
                    warn!(chat_id, error = %send_err, "failed to send failure notice");
                }
            }
        }
    }

    /// Route one event to its handler. Public so tests and the dispatch
    /// boundary share the same entry point.
    pub async fn handle_event(&self, event: WorkflowEvent) -> Result<(), SitesnapError> {
        match event {
            WorkflowEvent::Enter { chat_id, user, kind } => self.enter(chat_id, user, kind).await,
            WorkflowEvent::TextReceived { chat_id, user, text } => {
                self.text_received(chat_id, user, text).await
            }
            WorkflowEvent::RecordDecision { chat_id, user, accepted } => {
                self.record_decision(chat_id, user, accepted).await
            }
            WorkflowEvent::CancelRequested { chat_id, user } => self.cancel(chat_id, user).await,
            WorkflowEvent::PhotoSubmitted { chat_id, user, file } => {
                self.photo_submitted(chat_id, user, file).await
            }
            WorkflowEvent::DocumentSubmitted { chat_id, user } => {
                self.document_submitted(chat_id, user).await
            }
            WorkflowEvent::Review(action) => self.review(action).await,
        }
    }

    /// Acquire the per-session lock, creating it on first use.
    pub(crate) async fn session_guard(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry for a session whose row is gone.
    pub(crate) fn forget_session_lock(&self, session_id: &str) {
        self.locks.remove(session_id);
    }

    /// Write the session back, bumping its modification time.
    pub(crate) async fn persist(&self, session: &mut UploadSession) -> Result<(), SitesnapError> {
        session.updated_at = now_iso();
        self.store.update(session).await
    }
}

fn recoverable_notice(err: &SitesnapError) -> Option<&'static str> {
    match err {
        SitesnapError::SessionNotFound { .. } => {
            Some("No active upload session here. Start one with /quarterly or /annual.")
        }
        SitesnapError::NoActiveRequest { .. } => {
            Some("There is no photo request waiting for an upload right now.")
        }
        // Reviewer-side staleness is logged only; the applicant's chat
        // should not see a notice for a reviewer's late button press.
        SitesnapError::StaleReviewAction { .. } => None,
        _ => None,
    }
}
