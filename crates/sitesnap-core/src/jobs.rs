// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payloads handed to the durable job queue at finalization.

use serde::{Deserialize, Serialize};

use crate::types::{SubmittedFile, UploadSession, WorkflowKind};

/// One confirmed file inside an equipment group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalFile {
    pub request_id: String,
    pub url: String,
    pub name: String,
    /// Local cache path written at review time, when the download
    /// succeeded within its retry budget.
    #[serde(default)]
    pub cached_path: Option<String>,
    #[serde(default)]
    pub reviewer: Option<String>,
}

/// Confirmed files for one equipment occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentGroup {
    pub equipment_id: String,
    pub equipment_name: String,
    pub code: String,
    pub index: u32,
    pub files: Vec<FinalFile>,
}

/// The finalized record set enqueued for downstream export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalRecordJob {
    pub session_id: String,
    pub kind: WorkflowKind,
    pub record_id: String,
    pub site: String,
    #[serde(default)]
    pub record_date: Option<String>,
    pub chat_id: i64,
    pub applicant_user_id: i64,
    #[serde(default)]
    pub applicant_person_id: Option<String>,
    pub groups: Vec<EquipmentGroup>,
}

impl FinalRecordJob {
    /// Build the handoff payload from a completed session.
    ///
    /// Filters confirmed files and groups them by `(equipment_id, index)`
    /// in first-seen order.
    pub fn from_session(session: &UploadSession) -> Self {
        let record = session.record.clone().unwrap_or(crate::types::RecordRef {
            id: String::new(),
            site: None,
            date: None,
        });
        Self {
            session_id: session.id.clone(),
            kind: session.kind,
            record_id: record.id,
            site: record.site.unwrap_or_default(),
            record_date: record.date,
            chat_id: session.chat_id,
            applicant_user_id: session.user_id,
            applicant_person_id: session.person_id.clone(),
            groups: group_confirmed(&session.files),
        }
    }

    /// Total confirmed file count across all groups.
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }
}

fn group_confirmed(files: &[SubmittedFile]) -> Vec<EquipmentGroup> {
    let mut groups: Vec<EquipmentGroup> = Vec::new();
    for file in files
        .iter()
        .filter(|f| f.status == crate::types::ReviewStatus::Confirmed)
    {
        let entry = FinalFile {
            request_id: file.request_id.clone(),
            url: file.file.url.clone(),
            name: file.file.name.clone(),
            cached_path: file.file.path.clone(),
            reviewer: file.reviewer.clone(),
        };
        match groups
            .iter_mut()
            .find(|g| g.equipment_id == file.equipment_id && g.index == file.index)
        {
            Some(group) => group.files.push(entry),
            None => groups.push(EquipmentGroup {
                equipment_id: file.equipment_id.clone(),
                equipment_name: file.equipment_name.clone(),
                code: file.code.clone(),
                index: file.index,
                files: vec![entry],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileData, ReviewStatus, UploadSession};

    fn submitted(request_id: &str, equipment_id: &str, index: u32, status: ReviewStatus) -> SubmittedFile {
        SubmittedFile {
            request_id: request_id.into(),
            equipment_id: equipment_id.into(),
            equipment_name: "Pump".into(),
            code: "PMP".into(),
            index,
            file: FileData {
                url: format!("https://files/{request_id}"),
                name: format!("{request_id}.jpg"),
                size: 1,
                file_id: request_id.into(),
                path: None,
            },
            status,
            reviewer: Some("admin".into()),
        }
    }

    #[test]
    fn groups_confirmed_files_by_occurrence() {
        let mut session = UploadSession::new(1, 2, None, WorkflowKind::Quarterly);
        session.record = Some(crate::types::RecordRef {
            id: "77".into(),
            site: Some("316".into()),
            date: Some("2026-03-01".into()),
        });
        session.files = vec![
            submitted("r1", "p1", 1, ReviewStatus::Confirmed),
            submitted("r2", "p1", 1, ReviewStatus::Confirmed),
            submitted("r3", "p2", 2, ReviewStatus::Confirmed),
            submitted("r4", "p2", 2, ReviewStatus::Confirmed),
        ];

        let job = FinalRecordJob::from_session(&session);
        assert_eq!(job.record_id, "77");
        assert_eq!(job.site, "316");
        assert_eq!(job.groups.len(), 2);
        assert_eq!(job.groups[0].equipment_id, "p1");
        assert_eq!(job.groups[0].files.len(), 2);
        assert_eq!(job.groups[1].equipment_id, "p2");
        assert_eq!(job.file_count(), 4);
    }

    #[test]
    fn unconfirmed_files_are_excluded() {
        let mut session = UploadSession::new(1, 2, None, WorkflowKind::Annual);
        session.files = vec![
            submitted("r1", "p1", 1, ReviewStatus::Confirmed),
            submitted("r2", "p1", 1, ReviewStatus::Rejected),
            submitted("r3", "p1", 1, ReviewStatus::Unknown),
        ];

        let job = FinalRecordJob::from_session(&session);
        assert_eq!(job.file_count(), 1);
        assert_eq!(job.groups[0].files[0].request_id, "r1");
    }

    #[test]
    fn payload_roundtrips_through_json() {
        let mut session = UploadSession::new(-100, 7, Some("field_eng".into()), WorkflowKind::Quarterly);
        session.files = vec![submitted("r1", "p1", 1, ReviewStatus::Confirmed)];
        let job = FinalRecordJob::from_session(&session);

        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: FinalRecordJob = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.session_id, job.session_id);
        assert_eq!(decoded.file_count(), 1);
    }
}
