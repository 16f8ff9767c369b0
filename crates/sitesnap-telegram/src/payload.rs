// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Callback payload codec for inline keyboard buttons.
//!
//! Payloads travel inside Telegram callback queries, which cap the data
//! at 64 bytes. Session ids are `{chat_id}_{user_id}` and request ids
//! are 8 hex characters, so the colon-separated encoding stays well
//! under the cap.

/// A decoded inline-button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackPayload {
    /// Reviewer accepted the photo for `(session_id, request_id)`.
    Approve {
        session_id: String,
        request_id: String,
    },
    /// Reviewer rejected the photo for `(session_id, request_id)`.
    Reject {
        session_id: String,
        request_id: String,
    },
    /// Applicant confirmed the resolved maintenance record.
    RecordYes,
    /// Applicant declined the resolved maintenance record.
    RecordNo,
    /// Applicant pressed the Cancel button.
    Cancel,
}

impl CallbackPayload {
    /// Wire encoding placed in the button's callback data.
    pub fn encode(&self) -> String {
        match self {
            CallbackPayload::Approve {
                session_id,
                request_id,
            } => format!("approve:{session_id}:{request_id}"),
            CallbackPayload::Reject {
                session_id,
                request_id,
            } => format!("reject:{session_id}:{request_id}"),
            CallbackPayload::RecordYes => "record_yes".to_string(),
            CallbackPayload::RecordNo => "record_no".to_string(),
            CallbackPayload::Cancel => "cancel".to_string(),
        }
    }

    /// Decode callback data. Unknown or malformed payloads return
    /// `None`; the gateway drops those updates.
    pub fn decode(data: &str) -> Option<Self> {
        match data {
            "record_yes" => return Some(CallbackPayload::RecordYes),
            "record_no" => return Some(CallbackPayload::RecordNo),
            "cancel" => return Some(CallbackPayload::Cancel),
            _ => {}
        }

        let mut parts = data.splitn(3, ':');
        let action = parts.next()?;
        let session_id = parts.next()?;
        let request_id = parts.next()?;
        if session_id.is_empty() || request_id.is_empty() {
            return None;
        }

        match action {
            "approve" => Some(CallbackPayload::Approve {
                session_id: session_id.to_string(),
                request_id: request_id.to_string(),
            }),
            "reject" => Some(CallbackPayload::Reject {
                session_id: session_id.to_string(),
                request_id: request_id.to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_payloads_round_trip() {
        let payloads = [
            CallbackPayload::Approve {
                session_id: "-100123_42".into(),
                request_id: "abcd1234".into(),
            },
            CallbackPayload::Reject {
                session_id: "-100123_42".into(),
                request_id: "abcd1234".into(),
            },
        ];
        for payload in payloads {
            assert_eq!(CallbackPayload::decode(&payload.encode()), Some(payload));
        }
    }

    #[test]
    fn simple_payloads_round_trip() {
        for payload in [
            CallbackPayload::RecordYes,
            CallbackPayload::RecordNo,
            CallbackPayload::Cancel,
        ] {
            assert_eq!(
                CallbackPayload::decode(&payload.encode()),
                Some(payload.clone())
            );
        }
    }

    #[test]
    fn encoding_fits_the_callback_data_cap() {
        let payload = CallbackPayload::Approve {
            session_id: "-1001234567890_1234567890".into(),
            request_id: "abcd1234".into(),
        };
        assert!(payload.encode().len() <= 64);
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        for data in [
            "",
            "approve",
            "approve:",
            "approve:only_session",
            "approve::abcd1234",
            "approve:-100123_42:",
            "promote:-100123_42:abcd1234",
            "record_maybe",
        ] {
            assert_eq!(CallbackPayload::decode(data), None, "accepted {data:?}");
        }
    }

    #[test]
    fn session_ids_with_negative_chat_ids_survive() {
        let decoded = CallbackPayload::decode("reject:-100123_42:1a2b3c4d");
        assert_eq!(
            decoded,
            Some(CallbackPayload::Reject {
                session_id: "-100123_42".into(),
                request_id: "1a2b3c4d".into(),
            })
        );
    }
}
