// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory collaborator fakes and the scenario test harness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sitesnap_config::MediaConfig;
use sitesnap_core::{
    CatalogEntry, CatalogStore, ChatTransport, EquipmentScope, ExamplePrompt, FinalRecordJob,
    JobQueue, MaintenanceRecord, MetadataField, Person, PersonDirectory, PersonRole, PhotoRequest,
    ReviewDecision, SessionStore, SiteEquipment, SitesnapError, SubmissionLog, SubmittedFile,
    UploadSession, WorkflowKind,
};

use crate::WorkflowEngine;

fn storage_err(message: &str) -> SitesnapError {
    SitesnapError::Storage {
        source: message.to_string().into(),
    }
}

pub(crate) struct MemoryStore {
    sessions: Mutex<HashMap<String, UploadSession>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, session_id: &str) -> Option<UploadSession> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &UploadSession) -> Result<(), SitesnapError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            return Err(storage_err("duplicate session id"));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, session_id: &str) -> Result<Option<UploadSession>, SitesnapError> {
        Ok(self.get(session_id))
    }

    async fn update(&self, session: &UploadSession) -> Result<(), SitesnapError> {
        let mut sessions = self.sessions.lock().unwrap();
        if !sessions.contains_key(&session.id) {
            return Err(SitesnapError::SessionNotFound {
                session_id: session.id.clone(),
            });
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), SitesnapError> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}

pub(crate) struct MemoryAudit {
    started: AtomicU32,
    files: Mutex<Vec<SubmittedFile>>,
    fail_files: AtomicBool,
}

impl MemoryAudit {
    pub(crate) fn new() -> Self {
        Self {
            started: AtomicU32::new(0),
            files: Mutex::new(Vec::new()),
            fail_files: AtomicBool::new(false),
        }
    }

    pub(crate) fn started_count(&self) -> u32 {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub(crate) fn fail_file_writes(&self, fail: bool) {
        self.fail_files.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubmissionLog for MemoryAudit {
    async fn log_session_started(&self, _session: &UploadSession) -> Result<(), SitesnapError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn log_file_submitted(
        &self,
        _session_id: &str,
        file: &SubmittedFile,
    ) -> Result<(), SitesnapError> {
        if self.fail_files.load(Ordering::SeqCst) {
            return Err(storage_err("audit write refused"));
        }
        self.files.lock().unwrap().push(file.clone());
        Ok(())
    }
}

pub(crate) struct MemoryCatalog {
    catalog: Vec<CatalogEntry>,
    equipment: Vec<SiteEquipment>,
    records: Vec<MaintenanceRecord>,
}

impl MemoryCatalog {
    fn fixture(empty_catalog: bool) -> Self {
        let catalog = if empty_catalog {
            Vec::new()
        } else {
            vec![
                CatalogEntry {
                    name: "Pump".into(),
                    code: "PMP".into(),
                    scope: EquipmentScope::PerInstance,
                    examples: vec![
                        ExamplePrompt {
                            image_url: "https://drive.example.com/PMP/0.jpg".into(),
                            caption: "Pump front #".into(),
                        },
                        ExamplePrompt {
                            image_url: "https://drive.example.com/PMP/1.jpg".into(),
                            caption: "Pump nameplate #".into(),
                        },
                    ],
                },
                CatalogEntry {
                    name: "Fire panel".into(),
                    code: "FRP".into(),
                    scope: EquipmentScope::PerSite,
                    examples: vec![ExamplePrompt {
                        image_url: "https://drive.example.com/FRP/0.jpg".into(),
                        caption: "Panel door".into(),
                    }],
                },
            ]
        };
        Self {
            catalog,
            equipment: vec![SiteEquipment {
                id: "inv-1".into(),
                name: "Pump".into(),
                site: "316".into(),
                metadata: vec![MetadataField {
                    label: "Serial number".into(),
                    value: "SN-9".into(),
                }],
            }],
            records: vec![
                MaintenanceRecord {
                    id: "77".into(),
                    site: Some("316".into()),
                    date: Some("2026-03-01".into()),
                },
                MaintenanceRecord {
                    id: "88".into(),
                    site: None,
                    date: None,
                },
            ],
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn equipment_catalog(
        &self,
        _kind: WorkflowKind,
    ) -> Result<Vec<CatalogEntry>, SitesnapError> {
        Ok(self.catalog.clone())
    }

    async fn site_equipment(
        &self,
        _kind: WorkflowKind,
        site: &str,
    ) -> Result<Vec<SiteEquipment>, SitesnapError> {
        Ok(self
            .equipment
            .iter()
            .filter(|e| e.site == site)
            .cloned()
            .collect())
    }

    async fn find_record(
        &self,
        _kind: WorkflowKind,
        record_id: &str,
    ) -> Result<Option<MaintenanceRecord>, SitesnapError> {
        Ok(self.records.iter().find(|r| r.id == record_id).cloned())
    }
}

pub(crate) struct MemoryPersons {
    persons: Vec<Person>,
}

impl MemoryPersons {
    fn fixture() -> Self {
        Self {
            persons: vec![
                Person {
                    id: "p-9".into(),
                    username: "field_eng".into(),
                    full_name: "Jo Field".into(),
                    role: PersonRole::Engineer,
                },
                Person {
                    id: "p-admin".into(),
                    username: "chief".into(),
                    full_name: "Sam Chief".into(),
                    role: PersonRole::Admin,
                },
            ],
        }
    }

    pub(crate) fn role_of(&self, username: &str) -> PersonRole {
        self.persons
            .iter()
            .find(|p| p.username == username)
            .map(|p| p.role)
            .unwrap_or(PersonRole::Unknown)
    }
}

#[async_trait]
impl PersonDirectory for MemoryPersons {
    async fn person_by_username(&self, username: &str) -> Result<Option<Person>, SitesnapError> {
        let wanted = username.trim_start_matches('@').to_lowercase();
        Ok(self
            .persons
            .iter()
            .find(|p| p.username.to_lowercase() == wanted)
            .cloned())
    }
}

pub(crate) struct RecordingTransport {
    notices: Mutex<Vec<(i64, String)>>,
    photo_requests: Mutex<Vec<(i64, PhotoRequest)>>,
    outcomes: Mutex<Vec<(i32, ReviewDecision)>>,
    fail_photo_sends: AtomicBool,
}

impl RecordingTransport {
    fn new(fail_photo_sends: bool) -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            photo_requests: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
            fail_photo_sends: AtomicBool::new(fail_photo_sends),
        }
    }

    pub(crate) fn notices(&self) -> Vec<(i64, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub(crate) fn photo_request_count(&self) -> usize {
        self.photo_requests.lock().unwrap().len()
    }

    pub(crate) fn outcomes(&self) -> Vec<(i32, ReviewDecision)> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_notice(&self, chat_id: i64, html: &str) -> Result<(), SitesnapError> {
        self.notices.lock().unwrap().push((chat_id, html.to_string()));
        Ok(())
    }

    async fn prompt_record_id(
        &self,
        chat_id: i64,
        kind: WorkflowKind,
    ) -> Result<(), SitesnapError> {
        self.notices
            .lock()
            .unwrap()
            .push((chat_id, format!("record prompt {kind}")));
        Ok(())
    }

    async fn prompt_record_confirm(
        &self,
        chat_id: i64,
        record: &MaintenanceRecord,
    ) -> Result<(), SitesnapError> {
        self.notices
            .lock()
            .unwrap()
            .push((chat_id, format!("confirm record {}", record.id)));
        Ok(())
    }

    async fn send_photo_request(
        &self,
        chat_id: i64,
        _session_id: &str,
        request: &PhotoRequest,
    ) -> Result<(), SitesnapError> {
        if self.fail_photo_sends.load(Ordering::SeqCst) {
            return Err(SitesnapError::Transport {
                message: "photo send refused".into(),
                source: None,
            });
        }
        self.photo_requests
            .lock()
            .unwrap()
            .push((chat_id, request.clone()));
        Ok(())
    }

    async fn mark_review_outcome(
        &self,
        _chat_id: i64,
        message_id: i32,
        decision: ReviewDecision,
    ) -> Result<(), SitesnapError> {
        self.outcomes.lock().unwrap().push((message_id, decision));
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, SitesnapError> {
        Ok(format!("bytes:{file_id}").into_bytes())
    }
}

pub(crate) struct MemoryJobs {
    jobs: Mutex<Vec<FinalRecordJob>>,
    ack: AtomicBool,
}

impl MemoryJobs {
    fn new(ack: bool) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            ack: AtomicBool::new(ack),
        }
    }

    pub(crate) fn submitted(&self) -> Vec<FinalRecordJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for MemoryJobs {
    async fn submit_final_record(&self, job: FinalRecordJob) -> Result<bool, SitesnapError> {
        if !self.ack.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.jobs.lock().unwrap().push(job);
        Ok(true)
    }
}

pub(crate) struct Harness {
    pub(crate) engine: Arc<WorkflowEngine>,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) audit: Arc<MemoryAudit>,
    pub(crate) transport: Arc<RecordingTransport>,
    pub(crate) jobs: Arc<MemoryJobs>,
    pub(crate) persons: Arc<MemoryPersons>,
    _cache_dir: tempfile::TempDir,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::builder().build()
    }

    pub(crate) fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// The applicant session used by every scenario.
    pub(crate) fn session(&self) -> Option<UploadSession> {
        self.store.get(&UploadSession::derive_id(-100123, 42))
    }
}

#[derive(Default)]
pub(crate) struct HarnessBuilder {
    empty_catalog: bool,
    jobs_ack: Option<bool>,
    fail_photo_sends: bool,
}

impl HarnessBuilder {
    pub(crate) fn empty_catalog(mut self) -> Self {
        self.empty_catalog = true;
        self
    }

    pub(crate) fn jobs_ack(mut self, ack: bool) -> Self {
        self.jobs_ack = Some(ack);
        self
    }

    pub(crate) fn fail_photo_sends(mut self, fail: bool) -> Self {
        self.fail_photo_sends = fail;
        self
    }

    pub(crate) fn build(self) -> Harness {
        let cache_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(MemoryAudit::new());
        let transport = Arc::new(RecordingTransport::new(self.fail_photo_sends));
        let jobs = Arc::new(MemoryJobs::new(self.jobs_ack.unwrap_or(true)));
        let persons = Arc::new(MemoryPersons::fixture());
        let catalog = Arc::new(MemoryCatalog::fixture(self.empty_catalog));

        let media = MediaConfig {
            cache_dir: cache_dir.path().to_string_lossy().into_owned(),
            download_attempts: 2,
        };

        let engine = Arc::new(WorkflowEngine::new(
            catalog,
            persons.clone(),
            store.clone(),
            audit.clone(),
            transport.clone(),
            jobs.clone(),
            media,
        ));

        Harness {
            engine,
            store,
            audit,
            transport,
            jobs,
            persons,
            _cache_dir: cache_dir,
        }
    }
}
