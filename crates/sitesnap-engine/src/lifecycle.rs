// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle: entry, record resolution, confirmation, cancel.

use sitesnap_core::{
    text, RecordRef, SessionPhase, SitesnapError, UploadSession, UserRef, WorkflowKind,
};
use tracing::{debug, info, warn};

use crate::generator;
use crate::WorkflowEngine;

impl WorkflowEngine {
    /// `/quarterly` or `/annual`: recreate the applicant's session and
    /// ask for the record number.
    ///
    /// Re-entry always starts over. An in-flight session for the same
    /// chat/applicant pair is dropped, matching the rule that one pair
    /// runs at most one workflow at a time.
    pub(crate) async fn enter(
        &self,
        chat_id: i64,
        user: UserRef,
        kind: WorkflowKind,
    ) -> Result<(), SitesnapError> {
        let Some(username) = user.username.clone() else {
            self.transport
                .send_notice(
                    chat_id,
                    "Your account needs a username before you can submit photographs.",
                )
                .await?;
            return Ok(());
        };
        let Some(person) = self.persons.person_by_username(&username).await? else {
            self.transport
                .send_notice(
                    chat_id,
                    "You are not registered for photo submissions. Contact your administrator.",
                )
                .await?;
            return Ok(());
        };

        let session_id = UploadSession::derive_id(chat_id, user.id);
        let _guard = self.session_guard(&session_id).await;

        let mut session = UploadSession::new(chat_id, user.id, Some(username), kind);
        session.person_id = Some(person.id);

        self.store.delete(&session_id).await?;
        if let Err(err) = self.store.insert(&session).await {
            // A row can reappear between delete and insert if another
            // writer shares the file. Overwrite it.
            warn!(session_id = %session_id, error = %err, "insert raced, overwriting");
            self.store.update(&session).await?;
        }

        info!(session_id = %session_id, kind = %kind, "session entered");
        self.transport.prompt_record_id(chat_id, kind).await?;
        Ok(())
    }

    /// Plain text while `Entering`: try to resolve it as a record number.
    pub(crate) async fn text_received(
        &self,
        chat_id: i64,
        user: UserRef,
        text: String,
    ) -> Result<(), SitesnapError> {
        let session_id = UploadSession::derive_id(chat_id, user.id);
        let _guard = self.session_guard(&session_id).await;
        let Some(mut session) = self.store.find(&session_id).await? else {
            return Ok(());
        };
        if session.phase != SessionPhase::Entering {
            return Ok(());
        }

        let record_id = text.trim();
        if record_id.is_empty() || !record_id.chars().all(|c| c.is_ascii_digit()) {
            self.transport
                .send_notice(
                    chat_id,
                    "Record numbers are digits only. Send the number, or press Cancel.",
                )
                .await?;
            return Ok(());
        }

        match self.catalog.find_record(session.kind, record_id).await? {
            None => {
                self.transport
                    .send_notice(
                        chat_id,
                        &format!(
                            "No {} maintenance record {} found. Check the number and try again.",
                            session.kind,
                            text::bold(record_id)
                        ),
                    )
                    .await?;
            }
            Some(record) if record.site.is_none() => {
                debug!(session_id = %session_id, record_id, "record has no site");
                self.transport
                    .send_notice(
                        chat_id,
                        &format!(
                            "Record {} has no site assigned yet. Contact your administrator.",
                            text::bold(record_id)
                        ),
                    )
                    .await?;
            }
            Some(record) => {
                session.record = Some(RecordRef {
                    id: record.id.clone(),
                    site: record.site.clone(),
                    date: record.date.clone(),
                });
                self.persist(&mut session).await?;
                self.transport.prompt_record_confirm(chat_id, &record).await?;
            }
        }
        Ok(())
    }

    /// Yes/No answer to the record confirmation prompt.
    ///
    /// "Yes" generates the request set and starts collection; "No"
    /// clears the pending record and asks again.
    pub(crate) async fn record_decision(
        &self,
        chat_id: i64,
        user: UserRef,
        accepted: bool,
    ) -> Result<(), SitesnapError> {
        let session_id = UploadSession::derive_id(chat_id, user.id);
        let _guard = self.session_guard(&session_id).await;
        let Some(mut session) = self.store.find(&session_id).await? else {
            return Ok(());
        };
        if session.phase != SessionPhase::Entering {
            return Ok(());
        }

        if !accepted {
            session.record = None;
            self.persist(&mut session).await?;
            self.transport.prompt_record_id(chat_id, session.kind).await?;
            return Ok(());
        }

        let Some(record) = session.record.clone() else {
            self.transport.prompt_record_id(chat_id, session.kind).await?;
            return Ok(());
        };
        let Some(site) = record.site.clone() else {
            self.transport
                .send_notice(
                    chat_id,
                    &format!(
                        "Record {} has no site assigned yet. Contact your administrator.",
                        text::bold(&text::escape_html(&record.id))
                    ),
                )
                .await?;
            return Ok(());
        };

        let catalog = self.catalog.equipment_catalog(session.kind).await?;
        let equipment = self.catalog.site_equipment(session.kind, &site).await?;
        let requests = generator::generate_requests(&catalog, &equipment);

        if requests.is_empty() {
            info!(session_id = %session_id, site = %site, "no requests generated");
            self.transport
                .send_notice(
                    chat_id,
                    &format!(
                        "No photographs are required for record {}. Nothing to upload.",
                        text::bold(&text::escape_html(&record.id))
                    ),
                )
                .await?;
            self.store.delete(&session_id).await?;
            self.forget_session_lock(&session_id);
            return Ok(());
        }

        session.pending = requests.iter().map(|r| r.id.clone()).collect();
        session.requests = requests;
        session.phase = SessionPhase::Collecting;
        self.audit.log_session_started(&session).await?;
        self.send_next(&mut session).await?;
        self.persist(&mut session).await?;
        info!(
            session_id = %session_id,
            site = %site,
            requests = session.requests.len(),
            "collection started"
        );
        Ok(())
    }

    /// `/cancel` or the Cancel button.
    pub(crate) async fn cancel(&self, chat_id: i64, user: UserRef) -> Result<(), SitesnapError> {
        let session_id = UploadSession::derive_id(chat_id, user.id);
        let _guard = self.session_guard(&session_id).await;
        let Some(mut session) = self.store.find(&session_id).await? else {
            self.transport
                .send_notice(chat_id, "You have no active upload session.")
                .await?;
            return Ok(());
        };

        session.phase = SessionPhase::Cancelled;
        self.store.delete(&session_id).await?;
        self.forget_session_lock(&session_id);
        info!(session_id = %session_id, "session cancelled");
        self.transport
            .send_notice(chat_id, "Upload session cancelled.")
            .await?;
        Ok(())
    }
}
