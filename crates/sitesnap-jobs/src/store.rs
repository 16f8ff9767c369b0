// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue operations over the `jobs` table.
//!
//! The store opens its own tokio-rusqlite connection to the workflow
//! database; the table itself is created by the storage migrations.
//! Claims are leased: a job stuck in `processing` past its
//! `locked_until` is claimable again, so a crashed worker never strands
//! work permanently.

use rusqlite::params;
use sitesnap_core::{now_iso, SitesnapError};

/// Convert a tokio-rusqlite error into SitesnapError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SitesnapError {
    SitesnapError::Storage {
        source: Box::new(e),
    }
}

/// One row of the jobs table. Status is one of `pending`, `processing`,
/// `done`, or `failed`.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub kind: String,
    pub payload: String,
    pub status: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub locked_until: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn lease_deadline(lease_secs: u64) -> String {
    (chrono::Utc::now() + chrono::Duration::seconds(lease_secs as i64))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Queue access over its own connection to the shared database file.
#[derive(Clone)]
pub struct JobStore {
    conn: tokio_rusqlite::Connection,
}

impl JobStore {
    /// Open a store against the workflow database path. The jobs table
    /// must already exist (created by the storage migrations).
    pub async fn open(path: &str) -> Result<Self, SitesnapError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        conn.call(|conn| {
            conn.pragma_update(None, "busy_timeout", 5000)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Enqueue a job. Returns the generated job id.
    pub async fn enqueue(
        &self,
        kind: &str,
        payload: &str,
        max_attempts: u32,
    ) -> Result<String, SitesnapError> {
        let id = uuid::Uuid::new_v4().to_string();
        let job_id = id.clone();
        let kind = kind.to_string();
        let payload = payload.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO jobs (id, kind, payload, status, max_attempts)
                     VALUES (?1, ?2, ?3, 'pending', ?4)",
                    params![job_id, kind, payload, max_attempts],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(id)
    }

    /// Claim the oldest runnable job and lease it for `lease_secs`.
    ///
    /// Runnable means `pending`, or `processing` with an expired lease.
    /// Returns `None` when nothing is runnable.
    pub async fn claim(&self, lease_secs: u64) -> Result<Option<Job>, SitesnapError> {
        let now = now_iso();
        let deadline = lease_deadline(lease_secs);
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let result = {
                    let mut stmt = tx.prepare(
                        "SELECT id, kind, payload, status, attempts, max_attempts,
                                locked_until, created_at, updated_at
                         FROM jobs
                         WHERE status = 'pending'
                            OR (status = 'processing' AND locked_until IS NOT NULL
                                AND locked_until < ?1)
                         ORDER BY created_at ASC, rowid ASC
                         LIMIT 1",
                    )?;
                    stmt.query_row(params![now], |row| {
                        Ok(Job {
                            id: row.get(0)?,
                            kind: row.get(1)?,
                            payload: row.get(2)?,
                            status: row.get(3)?,
                            attempts: row.get(4)?,
                            max_attempts: row.get(5)?,
                            locked_until: row.get(6)?,
                            created_at: row.get(7)?,
                            updated_at: row.get(8)?,
                        })
                    })
                };

                match result {
                    Ok(job) => {
                        tx.execute(
                            "UPDATE jobs SET status = 'processing', locked_until = ?1,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE id = ?2",
                            params![deadline, job.id],
                        )?;
                        tx.commit()?;
                        Ok(Some(Job {
                            status: "processing".to_string(),
                            locked_until: Some(deadline),
                            ..job
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        tx.commit()?;
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Acknowledge successful processing.
    pub async fn ack(&self, id: &str) -> Result<(), SitesnapError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE jobs SET status = 'done', locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Mark a processing job as failed.
    ///
    /// Increments attempts; the job goes back to `pending` until the
    /// attempt budget is spent, then parks as `failed`.
    pub async fn fail(&self, id: &str) -> Result<(), SitesnapError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let (attempts, max_attempts): (u32, u32) = conn.query_row(
                    "SELECT attempts, max_attempts FROM jobs WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                let new_attempts = attempts + 1;
                let status = if new_attempts >= max_attempts {
                    "failed"
                } else {
                    "pending"
                };
                conn.execute(
                    "UPDATE jobs SET status = ?1, attempts = ?2, locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                    params![status, new_attempts, id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Jobs still owed work (`pending` or `processing`).
    pub async fn backlog_count(&self) -> Result<i64, SitesnapError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM jobs WHERE status IN ('pending', 'processing')",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .map_err(map_tr_err)
    }

    #[cfg(test)]
    pub(crate) async fn status_of(&self, id: &str) -> (String, u32) {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT status, attempts FROM jobs WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .await
            .unwrap()
    }
}
