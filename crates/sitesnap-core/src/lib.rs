// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Sitesnap workflow engine.
//!
//! This crate provides the domain types, error type, inbound event
//! definitions, and collaborator trait seams used throughout the
//! Sitesnap workspace. Concrete backends (SQLite, Google Sheets,
//! Telegram, the job queue) implement the traits defined here.

pub mod error;
pub mod events;
pub mod jobs;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SitesnapError;
pub use events::{FileHandle, ReviewAction, UserRef, WorkflowEvent};
pub use jobs::{EquipmentGroup, FinalFile, FinalRecordJob};
pub use types::{
    CatalogEntry, EquipmentScope, ExamplePrompt, FileData, MaintenanceRecord, MetadataField,
    Person, PersonRole, PhotoRequest, RecordRef, ReviewDecision, ReviewStatus, SessionPhase,
    SiteEquipment, SubmittedFile, UploadSession, WorkflowKind, now_iso,
};

// Re-export all collaborator traits at crate root.
pub use traits::{CatalogStore, ChatTransport, JobQueue, PersonDirectory, SessionStore, SubmissionLog};
