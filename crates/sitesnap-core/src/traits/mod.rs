// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait seams consumed by the workflow engine.
//!
//! The engine is constructed from these interfaces (spreadsheet lookups,
//! session persistence, chat transport, job handoff) and never touches a
//! concrete backend directly.

pub mod catalog;
pub mod jobs;
pub mod store;
pub mod transport;

pub use catalog::{CatalogStore, PersonDirectory};
pub use jobs::JobQueue;
pub use store::{SessionStore, SubmissionLog};
pub use transport::ChatTransport;
