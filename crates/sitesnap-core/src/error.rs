// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Sitesnap workflow engine.

use thiserror::Error;

/// The primary error type used across all Sitesnap crates.
///
/// The first group of variants wraps collaborator failures (storage,
/// chat transport, spreadsheet lookups); the second group carries the
/// workflow-level conditions that handlers turn into user guidance
/// instead of faults.
#[derive(Debug, Error)]
pub enum SitesnapError {
    /// Configuration errors (invalid values discovered after load).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (send failure, download failure, message format).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Spreadsheet lookup errors (API failure, malformed range, bad payload).
    #[error("sheets error: {message}")]
    Sheets {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation referenced a session id that does not resolve.
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// A file arrived while no request was open for submission.
    #[error("no active request for session {session_id}")]
    NoActiveRequest { session_id: String },

    /// A reviewer acted on a request or session that is no longer actionable.
    #[error("stale review action for session {session_id}, request {request_id}")]
    StaleReviewAction {
        session_id: String,
        request_id: String,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SitesnapError {
    /// Wrap an arbitrary error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SitesnapError::Storage {
            source: Box::new(source),
        }
    }

    /// Wrap an arbitrary error as a transport failure with context.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SitesnapError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True when the error is one of the workflow conditions that a
    /// handler answers with user guidance rather than an alert.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            SitesnapError::SessionNotFound { .. }
                | SitesnapError::NoActiveRequest { .. }
                | SitesnapError::StaleReviewAction { .. }
        )
    }
}
