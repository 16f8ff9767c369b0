// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session row CRUD and the JSON column codec.
//!
//! Requests, the pending queue, and submitted files are stored as JSON
//! text columns on the session row. Decoding validates every field; a
//! row that fails validation is logged and reported as absent so the
//! workflow restarts cleanly instead of acting on corrupt state.

use std::str::FromStr;

use rusqlite::params;
use sitesnap_core::{
    PhotoRequest, RecordRef, SessionPhase, SitesnapError, SubmittedFile, UploadSession,
    WorkflowKind,
};
use tracing::warn;

use crate::database::{map_tr_err, Database};

/// Raw session row as stored, before validation.
#[derive(Debug, Clone)]
struct SessionRow {
    id: String,
    chat_id: i64,
    user_id: i64,
    username: Option<String>,
    person_id: Option<String>,
    kind: String,
    phase: i64,
    record_id: Option<String>,
    site: Option<String>,
    record_date: Option<String>,
    awaiting_request_id: Option<String>,
    requests: String,
    pending: String,
    files: String,
    created_at: String,
    updated_at: String,
}

const SESSION_COLUMNS: &str = "id, chat_id, user_id, username, person_id, kind, phase, \
     record_id, site, record_date, awaiting_request_id, requests, pending, files, \
     created_at, updated_at";

fn row_to_raw(row: &rusqlite::Row<'_>) -> Result<SessionRow, rusqlite::Error> {
    Ok(SessionRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        person_id: row.get(4)?,
        kind: row.get(5)?,
        phase: row.get(6)?,
        record_id: row.get(7)?,
        site: row.get(8)?,
        record_date: row.get(9)?,
        awaiting_request_id: row.get(10)?,
        requests: row.get(11)?,
        pending: row.get(12)?,
        files: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Decode a raw row into the session aggregate, or explain why not.
fn decode_row(row: SessionRow) -> Result<UploadSession, String> {
    let kind = WorkflowKind::from_str(&row.kind).map_err(|_| format!("bad kind {:?}", row.kind))?;
    let phase =
        SessionPhase::from_i64(row.phase).ok_or_else(|| format!("bad phase {}", row.phase))?;
    let requests: Vec<PhotoRequest> =
        serde_json::from_str(&row.requests).map_err(|e| format!("bad requests json: {e}"))?;
    let pending: Vec<String> =
        serde_json::from_str(&row.pending).map_err(|e| format!("bad pending json: {e}"))?;
    let files: Vec<SubmittedFile> =
        serde_json::from_str(&row.files).map_err(|e| format!("bad files json: {e}"))?;
    let record = row.record_id.map(|id| RecordRef {
        id,
        site: row.site,
        date: row.record_date,
    });

    Ok(UploadSession {
        id: row.id,
        chat_id: row.chat_id,
        user_id: row.user_id,
        username: row.username,
        person_id: row.person_id,
        kind,
        phase,
        record,
        awaiting_request_id: row.awaiting_request_id,
        requests,
        pending,
        files,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Encoded JSON columns of a session, serialized before the call
/// closure so serde errors surface on the caller's side.
struct EncodedColumns {
    kind: String,
    requests: String,
    pending: String,
    files: String,
    record_id: Option<String>,
    site: Option<String>,
    record_date: Option<String>,
}

fn encode_columns(session: &UploadSession) -> Result<EncodedColumns, SitesnapError> {
    let requests =
        serde_json::to_string(&session.requests).map_err(SitesnapError::storage)?;
    let pending = serde_json::to_string(&session.pending).map_err(SitesnapError::storage)?;
    let files = serde_json::to_string(&session.files).map_err(SitesnapError::storage)?;
    let record = session.record.clone();
    Ok(EncodedColumns {
        kind: session.kind.to_string(),
        requests,
        pending,
        files,
        record_id: record.as_ref().map(|r| r.id.clone()),
        site: record.as_ref().and_then(|r| r.site.clone()),
        record_date: record.and_then(|r| r.date),
    })
}

/// Insert a new session row. Fails if the id already exists.
pub async fn insert_session(db: &Database, session: &UploadSession) -> Result<(), SitesnapError> {
    let cols = encode_columns(session)?;
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, chat_id, user_id, username, person_id, kind, phase, \
                 record_id, site, record_date, awaiting_request_id, requests, pending, files, \
                 created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    session.id,
                    session.chat_id,
                    session.user_id,
                    session.username,
                    session.person_id,
                    cols.kind,
                    session.phase.as_i64(),
                    cols.record_id,
                    cols.site,
                    cols.record_date,
                    session.awaiting_request_id,
                    cols.requests,
                    cols.pending,
                    cols.files,
                    session.created_at,
                    session.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by id.
///
/// A row that fails validation (unknown phase or kind, malformed JSON
/// collections) is treated as absent.
pub async fn get_session(
    db: &Database,
    id: &str,
) -> Result<Option<UploadSession>, SitesnapError> {
    let id = id.to_string();
    let raw = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_raw);
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    let Some(raw) = raw else {
        return Ok(None);
    };
    let session_id = raw.id.clone();
    match decode_row(raw) {
        Ok(session) => Ok(Some(session)),
        Err(reason) => {
            warn!(session_id = %session_id, %reason, "discarding malformed session row");
            Ok(None)
        }
    }
}

/// Overwrite an existing session row.
pub async fn update_session(db: &Database, session: &UploadSession) -> Result<(), SitesnapError> {
    let cols = encode_columns(session)?;
    let session = session.clone();
    let session_id = session.id.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions SET chat_id = ?2, user_id = ?3, username = ?4, person_id = ?5, \
                 kind = ?6, phase = ?7, record_id = ?8, site = ?9, record_date = ?10, \
                 awaiting_request_id = ?11, requests = ?12, pending = ?13, files = ?14, \
                 updated_at = ?15
                 WHERE id = ?1",
                params![
                    session.id,
                    session.chat_id,
                    session.user_id,
                    session.username,
                    session.person_id,
                    cols.kind,
                    session.phase.as_i64(),
                    cols.record_id,
                    cols.site,
                    cols.record_date,
                    session.awaiting_request_id,
                    cols.requests,
                    cols.pending,
                    cols.files,
                    session.updated_at,
                ],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(SitesnapError::SessionNotFound { session_id });
    }
    Ok(())
}

/// Delete a session row. Returns whether a row existed.
pub async fn delete_session(db: &Database, id: &str) -> Result<bool, SitesnapError> {
    let id = id.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}
