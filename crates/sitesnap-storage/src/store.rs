// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait implementations over the workflow database.
//!
//! `SqliteSessionStore` keeps a write-through `DashMap` cache in front
//! of the sessions table so the hot read-modify-persist cycle skips the
//! database on the read side. The cache holds whole aggregates; the
//! engine's per-session lock makes each cycle atomic.

use async_trait::async_trait;
use dashmap::DashMap;
use sitesnap_core::{SessionStore, SitesnapError, SubmissionLog, SubmittedFile, UploadSession};
use tracing::debug;

use crate::database::Database;
use crate::queries::{audit, sessions};

/// Session persistence backed by SQLite with an in-process cache.
pub struct SqliteSessionStore {
    db: Database,
    cache: DashMap<String, UploadSession>,
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert(&self, session: &UploadSession) -> Result<(), SitesnapError> {
        sessions::insert_session(&self.db, session).await?;
        self.cache.insert(session.id.clone(), session.clone());
        debug!(session_id = %session.id, "session inserted");
        Ok(())
    }

    async fn find(&self, session_id: &str) -> Result<Option<UploadSession>, SitesnapError> {
        if let Some(cached) = self.cache.get(session_id) {
            return Ok(Some(cached.clone()));
        }
        let loaded = sessions::get_session(&self.db, session_id).await?;
        if let Some(session) = &loaded {
            self.cache.insert(session.id.clone(), session.clone());
        }
        Ok(loaded)
    }

    async fn update(&self, session: &UploadSession) -> Result<(), SitesnapError> {
        sessions::update_session(&self.db, session).await?;
        self.cache.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), SitesnapError> {
        sessions::delete_session(&self.db, session_id).await?;
        self.cache.remove(session_id);
        debug!(session_id = %session_id, "session deleted");
        Ok(())
    }
}

/// Append-only audit log backed by SQLite.
pub struct SqliteSubmissionLog {
    db: Database,
}

impl SqliteSubmissionLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionLog for SqliteSubmissionLog {
    async fn log_session_started(&self, session: &UploadSession) -> Result<(), SitesnapError> {
        audit::insert_session_started(&self.db, session).await
    }

    async fn log_file_submitted(
        &self,
        session_id: &str,
        file: &SubmittedFile,
    ) -> Result<(), SitesnapError> {
        audit::insert_file_submitted(&self.db, session_id, file).await
    }
}
