// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message classification.
//!
//! Pure helpers that decide what a Telegram message means for the
//! workflow before any event is built: chat-type gating, slash-command
//! parsing, sender extraction, and photo-size selection.

use sitesnap_core::{UserRef, WorkflowKind};
use teloxide::prelude::*;
use teloxide::types::PhotoSize;

/// A recognized slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    Enter(WorkflowKind),
    Cancel,
}

/// Whether the message came from a group or supergroup chat.
///
/// Entry commands and submissions are group-only; private chats get
/// guidance instead.
pub fn is_group(msg: &Message) -> bool {
    msg.chat.is_group() || msg.chat.is_supergroup()
}

/// Parse the leading slash command, tolerating a `@botname` suffix and
/// trailing arguments. Non-commands and unknown commands return `None`.
pub fn parse_command(text: &str) -> Option<SlashCommand> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next()?;

    match name {
        "quarterly" => Some(SlashCommand::Enter(WorkflowKind::Quarterly)),
        "annual" => Some(SlashCommand::Enter(WorkflowKind::Annual)),
        "cancel" => Some(SlashCommand::Cancel),
        _ => None,
    }
}

/// Sender of the message, when present (channel posts have none).
pub fn sender(msg: &Message) -> Option<UserRef> {
    msg.from.as_ref().map(|user| UserRef {
        id: user.id.0 as i64,
        username: user.username.clone(),
    })
}

/// The largest photo variant. Telegram orders sizes ascending, so the
/// last entry is the original-resolution one.
pub fn largest_photo(photos: &[PhotoSize]) -> Option<&PhotoSize> {
    photos.last()
}
