// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound events the chat gateway feeds to the workflow engine.
//!
//! The gateway translates transport updates (messages, button presses,
//! photo uploads) into these values and pushes them onto an mpsc
//! channel; the engine dispatches each one on its own task.

use crate::types::{ReviewDecision, WorkflowKind};

/// The sender of an inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// Transport user id.
    pub id: i64,
    /// Username, when the account has one. Role lookups key on this.
    pub username: Option<String>,
}

/// A file submitted by the applicant, resolved by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Provider-specific file id, usable for downloads.
    pub file_id: String,
    /// Remote URL the file can be fetched from.
    pub url: String,
    /// Display name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// A reviewer button press, parsed from the callback payload.
#[derive(Debug, Clone)]
pub struct ReviewAction {
    pub decision: ReviewDecision,
    /// Session the reviewed request belongs to (from the payload, not
    /// from the reviewer's own chat/user pair).
    pub session_id: String,
    pub request_id: String,
    pub reviewer: UserRef,
    /// Chat carrying the reviewed message.
    pub chat_id: i64,
    /// Message whose buttons get flipped to the outcome label.
    pub message_id: Option<i32>,
}

/// One inbound workflow event.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// `/quarterly` or `/annual` in a group chat.
    Enter {
        chat_id: i64,
        user: UserRef,
        kind: WorkflowKind,
    },
    /// Plain text; only meaningful while a session is `Entering`.
    TextReceived {
        chat_id: i64,
        user: UserRef,
        text: String,
    },
    /// Yes/No answer to the record confirmation prompt.
    RecordDecision {
        chat_id: i64,
        user: UserRef,
        accepted: bool,
    },
    /// `/cancel` command or the Cancel button.
    CancelRequested { chat_id: i64, user: UserRef },
    /// A compressed photo from the applicant.
    PhotoSubmitted {
        chat_id: i64,
        user: UserRef,
        file: FileHandle,
    },
    /// An uncompressed document; answered with resend guidance.
    DocumentSubmitted { chat_id: i64, user: UserRef },
    /// Reviewer accept/reject.
    Review(ReviewAction),
}

impl WorkflowEvent {
    /// Chat the event originated in, used for error notices.
    pub fn chat_id(&self) -> i64 {
        match self {
            WorkflowEvent::Enter { chat_id, .. }
            | WorkflowEvent::TextReceived { chat_id, .. }
            | WorkflowEvent::RecordDecision { chat_id, .. }
            | WorkflowEvent::CancelRequested { chat_id, .. }
            | WorkflowEvent::PhotoSubmitted { chat_id, .. }
            | WorkflowEvent::DocumentSubmitted { chat_id, .. } => *chat_id,
            WorkflowEvent::Review(action) => action.chat_id,
        }
    }

    /// Short event name for log lines.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WorkflowEvent::Enter { .. } => "enter",
            WorkflowEvent::TextReceived { .. } => "text",
            WorkflowEvent::RecordDecision { .. } => "record_decision",
            WorkflowEvent::CancelRequested { .. } => "cancel",
            WorkflowEvent::PhotoSubmitted { .. } => "photo",
            WorkflowEvent::DocumentSubmitted { .. } => "document",
            WorkflowEvent::Review(_) => "review",
        }
    }
}
