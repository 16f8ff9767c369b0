// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit inserts for session starts and file submissions.

use rusqlite::params;
use sitesnap_core::{SitesnapError, SubmittedFile, UploadSession};

use crate::database::{map_tr_err, Database};

/// Record that collection started for a session.
pub async fn insert_session_started(
    db: &Database,
    session: &UploadSession,
) -> Result<(), SitesnapError> {
    let session = session.clone();
    let kind = session.kind.to_string();
    let record_id = session.record.as_ref().map(|r| r.id.clone());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO submission_log (session_id, user_id, username, kind, record_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![session.id, session.user_id, session.username, kind, record_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record one submitted file. Resubmissions append a fresh row.
pub async fn insert_file_submitted(
    db: &Database,
    session_id: &str,
    file: &SubmittedFile,
) -> Result<(), SitesnapError> {
    let session_id = session_id.to_string();
    let file = file.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO submission_files (session_id, request_id, equipment_id, \
                 equipment_name, code, equipment_index, file_url, file_name, file_size, file_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    session_id,
                    file.request_id,
                    file.equipment_id,
                    file.equipment_name,
                    file.code,
                    file.index,
                    file.file.url,
                    file.file.name,
                    file.file.size,
                    file.file.file_id,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of session-start rows for a session.
pub async fn session_started_count(db: &Database, session_id: &str) -> Result<i64, SitesnapError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM submission_log WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of file rows logged for a session.
pub async fn file_submitted_count(db: &Database, session_id: &str) -> Result<i64, SitesnapError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM submission_files WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}
