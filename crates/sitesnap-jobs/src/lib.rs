// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable job queue and export worker.
//!
//! Finalized record sets are enqueued into the `jobs` table (created by
//! the storage migrations) and drained by [`JobWorker`], which writes
//! one JSON bundle per record under the export directory and then
//! notifies the originating chat. Jobs are leased during processing so
//! a crashed worker's claims become claimable again once the lease
//! expires.

pub mod queue;
pub mod store;
pub mod worker;

pub use queue::SitesnapJobQueue;
pub use store::{Job, JobStore};
pub use worker::JobWorker;
