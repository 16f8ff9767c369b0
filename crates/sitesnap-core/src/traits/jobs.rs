// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable job handoff at finalization.

use async_trait::async_trait;

use crate::error::SitesnapError;
use crate::jobs::FinalRecordJob;

/// Fire-and-forget durable enqueue of the finalized record set.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue the record set for downstream export.
    ///
    /// The returned flag acknowledges the enqueue only, never the
    /// eventual processing. `false` leaves the session open so a
    /// repeated reviewer accept can retry.
    async fn submit_final_record(&self, job: FinalRecordJob) -> Result<bool, SitesnapError>;
}
