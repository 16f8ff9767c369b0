// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram gateway for the Sitesnap workflow.
//!
//! Long-polls the Bot API via teloxide, translates messages and button
//! presses into [`WorkflowEvent`]s on an mpsc channel, and implements
//! the outbound [`ChatTransport`](sitesnap_core::ChatTransport) used by
//! the engine for prompts, review keyboards, and file downloads.

pub mod classify;
pub mod payload;
pub mod transport;

use sitesnap_config::TelegramConfig;
use sitesnap_core::{FileHandle, ReviewAction, ReviewDecision, SitesnapError, UserRef, WorkflowEvent};
use teloxide::prelude::*;
use teloxide::types::PhotoSize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::classify::SlashCommand;
use crate::payload::CallbackPayload;

pub use teloxide::Bot;
pub use transport::SitesnapTransport;

/// Probe the Bot API token with `getMe`.
pub async fn health_check(bot: &Bot) -> Result<(), SitesnapError> {
    bot.get_me().await.map_err(|e| SitesnapError::Transport {
        message: format!("getMe failed: {e}"),
        source: Some(Box::new(e)),
    })?;
    Ok(())
}

/// Build the Bot from configuration.
///
/// Requires `telegram.bot_token` to be set and non-empty.
pub fn gateway_bot(config: &TelegramConfig) -> Result<Bot, SitesnapError> {
    let token = config
        .bot_token
        .as_deref()
        .ok_or_else(|| SitesnapError::Config("telegram.bot_token is required to serve".into()))?;
    if token.is_empty() {
        return Err(SitesnapError::Config(
            "telegram.bot_token cannot be empty".into(),
        ));
    }
    Ok(Bot::new(token))
}

/// Start long polling on a background task.
///
/// Every recognized update becomes one [`WorkflowEvent`] on `events`;
/// unsupported updates are dropped with a debug log. The task ends when
/// the dispatcher shuts down (the serve loop aborts it on Ctrl-C).
pub fn spawn_dispatcher(
    bot: Bot,
    events: mpsc::Sender<WorkflowEvent>,
) -> tokio::task::JoinHandle<()> {
    let message_tx = events.clone();
    let callback_tx = events;

    tokio::spawn(async move {
        info!("starting Telegram long polling");

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                let tx = message_tx.clone();
                async move {
                    on_message(&bot, &msg, &tx).await;
                    respond(())
                }
            }))
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                    let tx = callback_tx.clone();
                    async move {
                        on_callback(&bot, q, &tx).await;
                        respond(())
                    }
                }),
            );

        Dispatcher::builder(bot, handler)
            .default_handler(|_| async {}) // Silently ignore other update kinds
            .build()
            .dispatch()
            .await;
    })
}

async fn forward(tx: &mpsc::Sender<WorkflowEvent>, event: WorkflowEvent) {
    if tx.send(event).await.is_err() {
        warn!("inbound channel closed, dropping update");
    }
}

async fn on_message(bot: &Bot, msg: &Message, tx: &mpsc::Sender<WorkflowEvent>) {
    let Some(user) = classify::sender(msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without a sender");
        return;
    };
    let chat_id = msg.chat.id.0;

    if let Some(text) = msg.text() {
        match classify::parse_command(text) {
            Some(SlashCommand::Enter(kind)) => {
                if !classify::is_group(msg) {
                    // Sessions are scoped to a (group chat, applicant)
                    // pair, so entry outside a group cannot work.
                    if let Err(e) = bot
                        .send_message(
                            msg.chat.id,
                            "Photo uploads run in your site group chat. Send /quarterly or /annual there.",
                        )
                        .await
                    {
                        warn!(error = %e, "failed to send private-chat guidance");
                    }
                    return;
                }
                forward(tx, WorkflowEvent::Enter {
                    chat_id,
                    user,
                    kind,
                })
                .await;
            }
            Some(SlashCommand::Cancel) => {
                forward(tx, WorkflowEvent::CancelRequested { chat_id, user }).await;
            }
            None => {
                if classify::is_group(msg) {
                    forward(tx, WorkflowEvent::TextReceived {
                        chat_id,
                        user,
                        text: text.to_string(),
                    })
                    .await;
                }
            }
        }
        return;
    }

    if !classify::is_group(msg) {
        debug!(chat_id, "ignoring non-group media message");
        return;
    }

    if let Some(photos) = msg.photo() {
        match resolve_photo(bot, photos).await {
            Ok(Some(file)) => {
                forward(tx, WorkflowEvent::PhotoSubmitted {
                    chat_id,
                    user,
                    file,
                })
                .await;
            }
            Ok(None) => debug!(chat_id, "photo message with empty size list"),
            Err(e) => error!(chat_id, error = %e, "failed to resolve submitted photo"),
        }
        return;
    }

    if msg.document().is_some() {
        forward(tx, WorkflowEvent::DocumentSubmitted { chat_id, user }).await;
        return;
    }

    debug!(msg_id = msg.id.0, "ignoring unsupported message type");
}

async fn on_callback(bot: &Bot, q: CallbackQuery, tx: &mpsc::Sender<WorkflowEvent>) {
    // Clear the client-side spinner regardless of what the payload says.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        debug!(error = %e, "failed to answer callback query");
    }

    let Some(payload) = q.data.as_deref().and_then(CallbackPayload::decode) else {
        debug!("ignoring unknown callback payload");
        return;
    };

    let Some((chat_id, message_id)) = q.message.as_ref().map(|m| (m.chat().id.0, m.id().0)) else {
        warn!("callback query without a message, dropping");
        return;
    };
    let user = UserRef {
        id: q.from.id.0 as i64,
        username: q.from.username.clone(),
    };

    let event = match payload {
        CallbackPayload::Approve {
            session_id,
            request_id,
        } => WorkflowEvent::Review(ReviewAction {
            decision: ReviewDecision::Accept,
            session_id,
            request_id,
            reviewer: user,
            chat_id,
            message_id: Some(message_id),
        }),
        CallbackPayload::Reject {
            session_id,
            request_id,
        } => WorkflowEvent::Review(ReviewAction {
            decision: ReviewDecision::Reject,
            session_id,
            request_id,
            reviewer: user,
            chat_id,
            message_id: Some(message_id),
        }),
        CallbackPayload::RecordYes => WorkflowEvent::RecordDecision {
            chat_id,
            user,
            accepted: true,
        },
        CallbackPayload::RecordNo => WorkflowEvent::RecordDecision {
            chat_id,
            user,
            accepted: false,
        },
        CallbackPayload::Cancel => WorkflowEvent::CancelRequested { chat_id, user },
    };
    forward(tx, event).await;
}

/// Resolve the largest photo variant into a transport-independent
/// [`FileHandle`] (download URL, display name, byte size).
async fn resolve_photo(
    bot: &Bot,
    photos: &[PhotoSize],
) -> Result<Option<FileHandle>, SitesnapError> {
    let Some(largest) = classify::largest_photo(photos) else {
        return Ok(None);
    };

    let file = bot
        .get_file(largest.file.id.clone())
        .await
        .map_err(|e| SitesnapError::Transport {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(Some(FileHandle {
        file_id: largest.file.id.to_string(),
        url: file_url(bot.token(), &file.path),
        name: file_name(&file.path),
        size: u64::from(file.meta.size),
    }))
}

/// Direct download URL for a resolved file path.
fn file_url(token: &str, path: &str) -> String {
    format!("https://api.telegram.org/file/bot{token}/{path}")
}

/// Display name from the server-side file path.
fn file_name(path: &str) -> String {
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("photo.jpg")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_embeds_token_and_path() {
        assert_eq!(
            file_url("123:abc", "photos/file_7.jpg"),
            "https://api.telegram.org/file/bot123:abc/photos/file_7.jpg"
        );
    }

    #[test]
    fn file_name_is_the_last_path_segment() {
        assert_eq!(file_name("photos/file_7.jpg"), "file_7.jpg");
        assert_eq!(file_name("file_7.jpg"), "file_7.jpg");
        assert_eq!(file_name("photos/"), "photo.jpg");
        assert_eq!(file_name(""), "photo.jpg");
    }

    #[test]
    fn gateway_bot_requires_a_token() {
        let config = TelegramConfig { bot_token: None };
        assert!(matches!(
            gateway_bot(&config),
            Err(SitesnapError::Config(_))
        ));

        let config = TelegramConfig {
            bot_token: Some(String::new()),
        };
        assert!(matches!(
            gateway_bot(&config),
            Err(SitesnapError::Config(_))
        ));

        let config = TelegramConfig {
            bot_token: Some("123:abc".into()),
        };
        assert!(gateway_bot(&config).is_ok());
    }
}
