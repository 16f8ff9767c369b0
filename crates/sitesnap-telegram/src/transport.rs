// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ChatTransport`] backed by the Telegram Bot API.
//!
//! All outbound text uses HTML parse mode; a message Telegram refuses to
//! parse is retried as plain text so a stray angle bracket in sheet data
//! cannot wedge the workflow.

use async_trait::async_trait;
use sitesnap_core::{
    ChatTransport, MaintenanceRecord, PhotoRequest, ReviewDecision, SitesnapError, WorkflowKind,
};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};
use tracing::{debug, warn};

use crate::payload::CallbackPayload;

/// Telegram-backed chat transport.
pub struct SitesnapTransport {
    bot: Bot,
}

impl SitesnapTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn send_error(e: impl std::error::Error + Send + Sync + 'static) -> SitesnapError {
        SitesnapError::Transport {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        }
    }

    /// Send HTML, falling back to plain text when Telegram rejects the
    /// entities.
    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), SitesnapError> {
        let mut request = self
            .bot
            .send_message(chat_id, html)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            request = request.reply_markup(markup);
        }

        match request.await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("can't parse entities") => {
                warn!(error = %e, "HTML send failed, retrying as plain text");
                let mut retry = self.bot.send_message(chat_id, html);
                if let Some(markup) = markup {
                    retry = retry.reply_markup(markup);
                }
                retry.await.map_err(Self::send_error)?;
                Ok(())
            }
            Err(e) => Err(Self::send_error(e)),
        }
    }
}

fn review_keyboard(session_id: &str, request_id: &str) -> InlineKeyboardMarkup {
    let approve = CallbackPayload::Approve {
        session_id: session_id.to_string(),
        request_id: request_id.to_string(),
    };
    let reject = CallbackPayload::Reject {
        session_id: session_id.to_string(),
        request_id: request_id.to_string(),
    };
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Accept", approve.encode()),
        InlineKeyboardButton::callback("❌ Reject", reject.encode()),
    ]])
}

fn outcome_keyboard(decision: ReviewDecision) -> InlineKeyboardMarkup {
    let label = match decision {
        ReviewDecision::Accept => "✅ Accepted",
        ReviewDecision::Reject => "❌ Rejected",
    };
    // The payload decodes to nothing, so presses on a settled message
    // are dropped by the gateway.
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(label, "settled")]])
}

#[async_trait]
impl ChatTransport for SitesnapTransport {
    async fn send_notice(&self, chat_id: i64, html: &str) -> Result<(), SitesnapError> {
        self.send_html(ChatId(chat_id), html, None).await
    }

    async fn prompt_record_id(
        &self,
        chat_id: i64,
        kind: WorkflowKind,
    ) -> Result<(), SitesnapError> {
        let markup = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "Cancel",
            CallbackPayload::Cancel.encode(),
        )]]);
        self.send_html(
            ChatId(chat_id),
            &format!("Which {kind} maintenance record are you photographing? Send the record number."),
            Some(markup),
        )
        .await
    }

    async fn prompt_record_confirm(
        &self,
        chat_id: i64,
        record: &MaintenanceRecord,
    ) -> Result<(), SitesnapError> {
        let site = record.site.as_deref().unwrap_or("unknown");
        let date = record.date.as_deref().unwrap_or("no date");
        let markup = InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("Yes", CallbackPayload::RecordYes.encode()),
            InlineKeyboardButton::callback("No", CallbackPayload::RecordNo.encode()),
        ]]);
        self.send_html(
            ChatId(chat_id),
            &format!(
                "Record <b>{}</b>, site <b>{}</b>, {}. Is this the record you are photographing?",
                record.id, site, date
            ),
            Some(markup),
        )
        .await
    }

    async fn send_photo_request(
        &self,
        chat_id: i64,
        session_id: &str,
        request: &PhotoRequest,
    ) -> Result<(), SitesnapError> {
        let example = url::Url::parse(&request.example_url).map_err(|e| {
            SitesnapError::Transport {
                message: format!("invalid example url {}: {e}", request.example_url),
                source: Some(Box::new(e)),
            }
        })?;

        self.bot
            .send_photo(ChatId(chat_id), InputFile::url(example))
            .caption(request.prompt.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(review_keyboard(session_id, &request.id))
            .await
            .map_err(Self::send_error)?;
        Ok(())
    }

    async fn mark_review_outcome(
        &self,
        chat_id: i64,
        message_id: i32,
        decision: ReviewDecision,
    ) -> Result<(), SitesnapError> {
        let result = self
            .bot
            .edit_message_reply_markup(ChatId(chat_id), MessageId(message_id))
            .reply_markup(outcome_keyboard(decision))
            .await;

        match result {
            Ok(_) => Ok(()),
            // Repeated reviews edit to the same markup; not an error.
            Err(e) if e.to_string().contains("message is not modified") => {
                debug!(message_id, "review outcome already marked");
                Ok(())
            }
            Err(e) => Err(SitesnapError::Transport {
                message: format!("failed to edit review buttons: {e}"),
                source: Some(Box::new(e)),
            }),
        }
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, SitesnapError> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_owned()))
            .await
            .map_err(|e| SitesnapError::Transport {
                message: format!("failed to get file info: {e}"),
                source: Some(Box::new(e)),
            })?;

        let mut buf = Vec::new();
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(|e| SitesnapError::Transport {
                message: format!("failed to download file: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(file_id, size = buf.len(), "downloaded file from Telegram");
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_keyboard_carries_decodable_payloads() {
        let markup = review_keyboard("-100123_42", "abcd1234");
        let row = &markup.inline_keyboard[0];
        assert_eq!(row.len(), 2);

        let datas: Vec<String> = row
            .iter()
            .filter_map(|b| match &b.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(d) => Some(d.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            CallbackPayload::decode(&datas[0]),
            Some(CallbackPayload::Approve {
                session_id: "-100123_42".into(),
                request_id: "abcd1234".into(),
            })
        );
        assert_eq!(
            CallbackPayload::decode(&datas[1]),
            Some(CallbackPayload::Reject {
                session_id: "-100123_42".into(),
                request_id: "abcd1234".into(),
            })
        );
    }

    #[test]
    fn outcome_keyboard_is_inert() {
        let markup = outcome_keyboard(ReviewDecision::Accept);
        let button = &markup.inline_keyboard[0][0];
        assert_eq!(button.text, "✅ Accepted");
        match &button.kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(CallbackPayload::decode(data), None);
            }
            other => panic!("expected callback button, got {other:?}"),
        }
    }
}
