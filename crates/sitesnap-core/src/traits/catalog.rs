// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only directory lookups backing request generation and review
//! authorization.

use async_trait::async_trait;

use crate::error::SitesnapError;
use crate::types::{CatalogEntry, MaintenanceRecord, Person, SiteEquipment, WorkflowKind};

/// Equipment catalog, site inventory, and record lookups.
///
/// Results are read-only snapshots; implementations may cache upstream
/// and the engine re-fetches per session start.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// The ordered equipment catalog for one workflow kind. The returned
    /// order is the canonical delivery order and is never resorted.
    async fn equipment_catalog(&self, kind: WorkflowKind)
    -> Result<Vec<CatalogEntry>, SitesnapError>;

    /// Physical equipment instances installed at `site`.
    async fn site_equipment(
        &self,
        kind: WorkflowKind,
        site: &str,
    ) -> Result<Vec<SiteEquipment>, SitesnapError>;

    /// Look up the maintenance record the applicant wants to document.
    async fn find_record(
        &self,
        kind: WorkflowKind,
        record_id: &str,
    ) -> Result<Option<MaintenanceRecord>, SitesnapError>;
}

/// Person directory keyed by chat username.
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    /// Case-insensitive lookup; a leading `@` in either side is ignored.
    async fn person_by_username(&self, username: &str) -> Result<Option<Person>, SitesnapError>;
}
