// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the upload-session workflow.
//!
//! A session walks one applicant through an ordered list of photo
//! requests for a maintenance record. Requests, submitted files, and the
//! session aggregate itself are persisted as one durable row per session;
//! everything here serializes with serde for that purpose.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::events::FileHandle;

/// Which maintenance workflow a session targets.
///
/// Both kinds share all engine logic but read their own catalog, record
/// and site-equipment sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    /// Quarterly service inspection.
    Quarterly,
    /// Annual service inspection.
    Annual,
}

/// Workflow phase of a session.
///
/// Persisted as the integer value; decode with [`SessionPhase::from_i64`]
/// so malformed rows are rejected instead of trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionPhase {
    /// Explicitly cancelled; the session row is deleted right after.
    Cancelled,
    /// Waiting for the applicant to identify the maintenance record.
    Entering,
    /// Requests are being delivered and photographed.
    Collecting,
    /// Every request delivered and filed; reviews still open.
    ReviewClosed,
    /// Completion predicate satisfied and the record set handed off.
    AllSubmitted,
}

impl SessionPhase {
    /// Integer representation used in the sessions table.
    pub fn as_i64(self) -> i64 {
        match self {
            SessionPhase::Cancelled => -1,
            SessionPhase::Entering => 0,
            SessionPhase::Collecting => 1,
            SessionPhase::ReviewClosed => 2,
            SessionPhase::AllSubmitted => 3,
        }
    }

    /// Decode a persisted phase, rejecting unknown values.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            -1 => Some(SessionPhase::Cancelled),
            0 => Some(SessionPhase::Entering),
            1 => Some(SessionPhase::Collecting),
            2 => Some(SessionPhase::ReviewClosed),
            3 => Some(SessionPhase::AllSubmitted),
            _ => None,
        }
    }

    /// Terminal phases end with the session row being deleted.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Cancelled | SessionPhase::AllSubmitted)
    }

    /// Phases in which reviewer accept/reject actions are honored.
    pub fn is_reviewable(self) -> bool {
        matches!(self, SessionPhase::Collecting | SessionPhase::ReviewClosed)
    }
}

/// Review state shared by requests and submitted files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ReviewStatus {
    /// Not yet reviewed.
    Unknown,
    /// Accepted by a reviewer.
    Confirmed,
    /// Rejected by a reviewer; the request goes back to the queue front.
    Rejected,
}

/// A reviewer's verdict on one submitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ReviewDecision {
    Accept,
    Reject,
}

/// One required-photo slot tied to one equipment occurrence.
///
/// Generated once per session; the id set is fixed for the session's
/// lifetime. Rejection re-queues the same id, it never mints a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRequest {
    /// Opaque unique token (8 hex chars of a UUID v4).
    pub id: String,
    /// Identity of the physical item: inventory id for per-instance
    /// equipment, the catalog name itself for per-site entries.
    pub equipment_id: String,
    /// Human-readable equipment name from the catalog.
    pub name: String,
    /// Short mnemonic code from the catalog (used in cached file names).
    pub code: String,
    /// 1-based occurrence counter when the same equipment name repeats
    /// across physical instances at a site.
    pub index: u32,
    /// Rendered HTML caption shown alongside the example image.
    pub prompt: String,
    /// Reference image illustrating the expected shot.
    pub example_url: String,
    /// Latest review outcome for this slot.
    pub status: ReviewStatus,
}

impl PhotoRequest {
    /// Mint a fresh request token.
    pub fn new_id() -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        id[..8].to_string()
    }
}

/// File metadata captured at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    /// Remote URL the file can be fetched from.
    pub url: String,
    /// Display name.
    pub name: String,
    /// Size in bytes as reported by the transport.
    pub size: u64,
    /// Provider-specific file id (used for downloads).
    pub file_id: String,
    /// Local cache path, set when a reviewer accepts the file.
    #[serde(default)]
    pub path: Option<String>,
}

/// The applicant-provided file bound to a request.
///
/// Equipment identity is copied from the request at submission time so
/// the audit trail stays meaningful even if the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedFile {
    pub request_id: String,
    pub equipment_id: String,
    pub equipment_name: String,
    pub code: String,
    pub index: u32,
    pub file: FileData,
    pub status: ReviewStatus,
    /// Person id (or username fallback) of the reviewer who last acted.
    #[serde(default)]
    pub reviewer: Option<String>,
}

impl SubmittedFile {
    /// Build a fresh (unreviewed) submission for `request` from an
    /// inbound file handle.
    pub fn from_request(request: &PhotoRequest, file: &FileHandle) -> Self {
        Self {
            request_id: request.id.clone(),
            equipment_id: request.equipment_id.clone(),
            equipment_name: request.name.clone(),
            code: request.code.clone(),
            index: request.index,
            file: FileData {
                url: file.url.clone(),
                name: file.name.clone(),
                size: file.size,
                file_id: file.file_id.clone(),
                path: None,
            },
            status: ReviewStatus::Unknown,
            reviewer: None,
        }
    }
}

/// The maintenance record a session documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: String,
    pub site: Option<String>,
    pub date: Option<String>,
}

/// The durable per-(chat, applicant) workflow aggregate.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Deterministic id: `"{chat_id}_{user_id}"`.
    pub id: String,
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    /// Person-directory id of the applicant, when resolved.
    pub person_id: Option<String>,
    pub kind: WorkflowKind,
    pub phase: SessionPhase,
    /// Set once the applicant names a record; confirmed before collection.
    pub record: Option<RecordRef>,
    /// The single request currently open for a file submission.
    pub awaiting_request_id: Option<String>,
    /// All generated requests, in canonical delivery order.
    pub requests: Vec<PhotoRequest>,
    /// Request ids not yet delivered; front is next. Rejections re-enter
    /// at the front.
    pub pending: Vec<String>,
    pub files: Vec<SubmittedFile>,
    pub created_at: String,
    pub updated_at: String,
}

impl UploadSession {
    /// Derive the stable session id for a chat/applicant pair.
    pub fn derive_id(chat_id: i64, user_id: i64) -> String {
        format!("{chat_id}_{user_id}")
    }

    /// Create a fresh session in the `Entering` phase.
    pub fn new(chat_id: i64, user_id: i64, username: Option<String>, kind: WorkflowKind) -> Self {
        let now = now_iso();
        Self {
            id: Self::derive_id(chat_id, user_id),
            chat_id,
            user_id,
            username,
            person_id: None,
            kind,
            phase: SessionPhase::Entering,
            record: None,
            awaiting_request_id: None,
            requests: Vec::new(),
            pending: Vec::new(),
            files: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Look up a request by id.
    pub fn request(&self, request_id: &str) -> Option<&PhotoRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    /// Look up a request by id, mutably.
    pub fn request_mut(&mut self, request_id: &str) -> Option<&mut PhotoRequest> {
        self.requests.iter_mut().find(|r| r.id == request_id)
    }

    /// Look up the submitted file for a request, mutably.
    pub fn file_mut(&mut self, request_id: &str) -> Option<&mut SubmittedFile> {
        self.files.iter_mut().find(|f| f.request_id == request_id)
    }

    /// Replace the submission for `request_id` in place, or append one.
    ///
    /// Replacement is the resubmission path after a rejection: exactly
    /// one `SubmittedFile` exists per request id at any time.
    pub fn put_file(&mut self, file: SubmittedFile) {
        match self
            .files
            .iter_mut()
            .find(|f| f.request_id == file.request_id)
        {
            Some(slot) => *slot = file,
            None => self.files.push(file),
        }
    }
}

/// Catalog scope marker: how many times an entry applies at a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EquipmentScope {
    /// Unspecified in the catalog; the entry is skipped.
    Undefined,
    /// One instance-group per matching physical instance at the site.
    PerInstance,
    /// Exactly one instance-group per site, keyed by the catalog name.
    PerSite,
}

/// An example shot attached to a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplePrompt {
    /// Illustrative image shown to the applicant.
    pub image_url: String,
    /// Caption template; the first `#` receives the occurrence index.
    pub caption: String,
}

/// One equipment catalog entry, in sheet order.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub code: String,
    pub scope: EquipmentScope,
    pub examples: Vec<ExamplePrompt>,
}

/// A labelled metadata field describing a physical equipment instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataField {
    pub label: String,
    pub value: String,
}

/// A physical equipment instance installed at a site.
#[derive(Debug, Clone)]
pub struct SiteEquipment {
    /// Inventory id; becomes `PhotoRequest::equipment_id`.
    pub id: String,
    pub name: String,
    pub site: String,
    pub metadata: Vec<MetadataField>,
}

/// A maintenance record looked up by the applicant-supplied number.
#[derive(Debug, Clone)]
pub struct MaintenanceRecord {
    pub id: String,
    pub site: Option<String>,
    pub date: Option<String>,
}

/// Role of a person in the directory sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PersonRole {
    Unknown,
    Engineer,
    Admin,
}

/// A person from the directory sheet.
#[derive(Debug, Clone)]
pub struct Person {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: PersonRole,
}

/// Current UTC time in the ISO 8601 shape used by all persisted rows.
pub fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_integer_roundtrip() {
        for phase in [
            SessionPhase::Cancelled,
            SessionPhase::Entering,
            SessionPhase::Collecting,
            SessionPhase::ReviewClosed,
            SessionPhase::AllSubmitted,
        ] {
            assert_eq!(SessionPhase::from_i64(phase.as_i64()), Some(phase));
        }
    }

    #[test]
    fn phase_rejects_unknown_integers() {
        assert_eq!(SessionPhase::from_i64(4), None);
        assert_eq!(SessionPhase::from_i64(-2), None);
    }

    #[test]
    fn terminal_and_reviewable_phases() {
        assert!(SessionPhase::Cancelled.is_terminal());
        assert!(SessionPhase::AllSubmitted.is_terminal());
        assert!(!SessionPhase::ReviewClosed.is_terminal());
        assert!(SessionPhase::Collecting.is_reviewable());
        assert!(SessionPhase::ReviewClosed.is_reviewable());
        assert!(!SessionPhase::Entering.is_reviewable());
        assert!(!SessionPhase::AllSubmitted.is_reviewable());
    }

    #[test]
    fn request_ids_are_short_tokens() {
        let id = PhotoRequest::new_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(PhotoRequest::new_id(), PhotoRequest::new_id());
    }

    #[test]
    fn session_id_is_deterministic() {
        assert_eq!(UploadSession::derive_id(-100123, 42), "-100123_42");
        assert_eq!(
            UploadSession::derive_id(-100123, 42),
            UploadSession::derive_id(-100123, 42)
        );
    }

    #[test]
    fn put_file_replaces_by_request_id() {
        let mut session = UploadSession::new(1, 2, None, WorkflowKind::Quarterly);
        let request = PhotoRequest {
            id: "abcd1234".into(),
            equipment_id: "p1".into(),
            name: "Pump".into(),
            code: "PMP".into(),
            index: 1,
            prompt: "x".into(),
            example_url: "https://example.org/a.jpg".into(),
            status: ReviewStatus::Unknown,
        };
        let first = FileHandle {
            file_id: "f1".into(),
            url: "https://files/1".into(),
            name: "a.jpg".into(),
            size: 10,
        };
        let second = FileHandle {
            file_id: "f2".into(),
            url: "https://files/2".into(),
            name: "b.jpg".into(),
            size: 20,
        };

        session.put_file(SubmittedFile::from_request(&request, &first));
        session.put_file(SubmittedFile::from_request(&request, &second));

        assert_eq!(session.files.len(), 1);
        assert_eq!(session.files[0].file.file_id, "f2");
    }

    #[test]
    fn workflow_kind_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(
            WorkflowKind::from_str("Quarterly").unwrap(),
            WorkflowKind::Quarterly
        );
        assert_eq!(WorkflowKind::from_str("annual").unwrap(), WorkflowKind::Annual);
        assert_eq!(WorkflowKind::Quarterly.to_string(), "quarterly");
    }
}
