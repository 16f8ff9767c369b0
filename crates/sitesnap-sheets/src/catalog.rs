// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog, inventory, and record lookups over configured sheet regions.
//!
//! Catalog rows carry a scope marker cell and alternating example
//! image / caption column pairs. Rows whose marker is unrecognized are
//! kept with `EquipmentScope::Undefined`; request generation skips
//! them. Example cells only count when they hold an `https://` URL, so
//! stray notes in the example columns are ignored.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sitesnap_config::{
    CatalogSheetConfig, EquipmentSheetConfig, RangeConfig, RecordSheetConfig, SheetsConfig,
    WorkflowSheetsConfig,
};
use sitesnap_core::{
    CatalogEntry, CatalogStore, EquipmentScope, ExamplePrompt, MaintenanceRecord, MetadataField,
    SiteEquipment, SitesnapError, WorkflowKind,
};
use tracing::debug;

use crate::cache::CachedRange;
use crate::client::SheetsClient;

/// Cell lookup by configured column letter; out-of-range reads are "".
fn cell<'a>(row: &'a [String], range: &RangeConfig, column: &str) -> &'a str {
    range
        .column_offset(column)
        .and_then(|offset| row.get(offset))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn parse_scope(marker: &str) -> EquipmentScope {
    if marker.eq_ignore_ascii_case("instance") {
        EquipmentScope::PerInstance
    } else if marker.eq_ignore_ascii_case("site") {
        EquipmentScope::PerSite
    } else {
        EquipmentScope::Undefined
    }
}

/// Parse catalog rows in sheet order.
pub fn parse_catalog(rows: &[Vec<String>], config: &CatalogSheetConfig) -> Vec<CatalogEntry> {
    let examples_start = config
        .range
        .column_offset(&config.examples_start_column)
        .unwrap_or(usize::MAX);

    rows.iter()
        .filter_map(|row| {
            let name = cell(row, &config.range, &config.name_column);
            if name.is_empty() {
                return None;
            }
            let mut examples = Vec::new();
            let mut offset = examples_start;
            while offset < row.len() {
                let url = row[offset].trim();
                if url.starts_with("https://") {
                    let caption = row
                        .get(offset + 1)
                        .map(|s| s.trim().to_string())
                        .unwrap_or_default();
                    examples.push(ExamplePrompt {
                        image_url: url.to_string(),
                        caption,
                    });
                }
                offset += 2;
            }
            Some(CatalogEntry {
                name: name.to_string(),
                code: cell(row, &config.range, &config.code_column).to_string(),
                scope: parse_scope(cell(row, &config.range, &config.scope_column)),
                examples,
            })
        })
        .collect()
}

/// Parse inventory rows, keeping only the given site.
pub fn parse_site_equipment(
    rows: &[Vec<String>],
    config: &EquipmentSheetConfig,
    site: &str,
) -> Vec<SiteEquipment> {
    rows.iter()
        .filter_map(|row| {
            let id = cell(row, &config.range, &config.id_column);
            let row_site = cell(row, &config.range, &config.site_column);
            if id.is_empty() || row_site != site {
                return None;
            }
            let metadata = config
                .metadata
                .iter()
                .filter_map(|meta| {
                    let value = cell(row, &config.range, &meta.column);
                    (!value.is_empty()).then(|| MetadataField {
                        label: meta.label.clone(),
                        value: value.to_string(),
                    })
                })
                .collect();
            Some(SiteEquipment {
                id: id.to_string(),
                name: cell(row, &config.range, &config.name_column).to_string(),
                site: row_site.to_string(),
                metadata,
            })
        })
        .collect()
}

/// Find the first record row matching `record_id`.
pub fn parse_record(
    rows: &[Vec<String>],
    config: &RecordSheetConfig,
    record_id: &str,
) -> Option<MaintenanceRecord> {
    rows.iter()
        .find(|row| cell(row, &config.range, &config.id_column) == record_id)
        .map(|row| {
            let site = cell(row, &config.range, &config.site_column);
            let date = cell(row, &config.range, &config.date_column);
            MaintenanceRecord {
                id: record_id.to_string(),
                site: (!site.is_empty()).then(|| site.to_string()),
                date: (!date.is_empty()).then(|| date.to_string()),
            }
        })
}

/// `CatalogStore` over the Sheets API with per-range TTL caches.
///
/// Record lookups bypass the cache: a freshly registered maintenance
/// record must resolve on the applicant's first try.
pub struct SheetCatalog {
    client: Arc<SheetsClient>,
    config: SheetsConfig,
    quarterly_catalog: CachedRange,
    annual_catalog: CachedRange,
    quarterly_equipment: CachedRange,
    annual_equipment: CachedRange,
}

impl SheetCatalog {
    pub fn new(client: Arc<SheetsClient>, config: SheetsConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            client,
            config,
            quarterly_catalog: CachedRange::new(ttl),
            annual_catalog: CachedRange::new(ttl),
            quarterly_equipment: CachedRange::new(ttl),
            annual_equipment: CachedRange::new(ttl),
        }
    }

    fn sheets_for(&self, kind: WorkflowKind) -> &WorkflowSheetsConfig {
        match kind {
            WorkflowKind::Quarterly => &self.config.quarterly,
            WorkflowKind::Annual => &self.config.annual,
        }
    }

    async fn cached_rows(
        &self,
        cache: &CachedRange,
        range: &RangeConfig,
    ) -> Result<Arc<Vec<Vec<String>>>, SitesnapError> {
        let client = self.client.clone();
        let range = range.clone();
        cache
            .get_or_fetch(move || async move { client.values(&range).await })
            .await
    }
}

#[async_trait]
impl CatalogStore for SheetCatalog {
    async fn equipment_catalog(
        &self,
        kind: WorkflowKind,
    ) -> Result<Vec<CatalogEntry>, SitesnapError> {
        let sheets = self.sheets_for(kind);
        let cache = match kind {
            WorkflowKind::Quarterly => &self.quarterly_catalog,
            WorkflowKind::Annual => &self.annual_catalog,
        };
        let rows = self.cached_rows(cache, &sheets.catalog.range).await?;
        let entries = parse_catalog(&rows, &sheets.catalog);
        debug!(kind = %kind, entries = entries.len(), "catalog loaded");
        Ok(entries)
    }

    async fn site_equipment(
        &self,
        kind: WorkflowKind,
        site: &str,
    ) -> Result<Vec<SiteEquipment>, SitesnapError> {
        let sheets = self.sheets_for(kind);
        let cache = match kind {
            WorkflowKind::Quarterly => &self.quarterly_equipment,
            WorkflowKind::Annual => &self.annual_equipment,
        };
        let rows = self.cached_rows(cache, &sheets.equipment.range).await?;
        Ok(parse_site_equipment(&rows, &sheets.equipment, site))
    }

    async fn find_record(
        &self,
        kind: WorkflowKind,
        record_id: &str,
    ) -> Result<Option<MaintenanceRecord>, SitesnapError> {
        let sheets = self.sheets_for(kind);
        let rows = self.client.values(&sheets.records.range).await?;
        Ok(parse_record(&rows, &sheets.records, record_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_config() -> CatalogSheetConfig {
        let config = SheetsConfig::default();
        config.quarterly.catalog.clone()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_scope_markers_and_example_pairs() {
        let config = catalog_config();
        let rows = vec![
            row(&[
                "Pump",
                "PMP",
                "instance",
                "https://drive.example.com/a.jpg",
                "Front of pump #",
                "https://drive.example.com/b.jpg",
                "Nameplate #",
            ]),
            row(&["Fire panel", "FRP", "SITE", "https://drive.example.com/c.jpg", "Panel"]),
            row(&["Mystery", "MST", "???", "https://drive.example.com/d.jpg", "x"]),
        ];

        let entries = parse_catalog(&rows, &config);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].scope, EquipmentScope::PerInstance);
        assert_eq!(entries[0].examples.len(), 2);
        assert_eq!(entries[0].examples[1].caption, "Nameplate #");
        assert_eq!(entries[1].scope, EquipmentScope::PerSite);
        assert_eq!(entries[2].scope, EquipmentScope::Undefined);
    }

    #[test]
    fn non_https_example_cells_are_ignored() {
        let config = catalog_config();
        let rows = vec![row(&[
            "Pump",
            "PMP",
            "instance",
            "see binder",
            "note",
            "https://drive.example.com/a.jpg",
            "Shot",
        ])];
        let entries = parse_catalog(&rows, &config);
        assert_eq!(entries[0].examples.len(), 1);
        assert_eq!(entries[0].examples[0].image_url, "https://drive.example.com/a.jpg");
    }

    #[test]
    fn blank_name_rows_are_skipped_and_order_kept() {
        let config = catalog_config();
        let rows = vec![
            row(&["Pump", "PMP", "instance"]),
            row(&["", "X", "instance"]),
            row(&["Valve", "VLV", "site"]),
        ];
        let entries = parse_catalog(&rows, &config);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Pump");
        assert_eq!(entries[1].name, "Valve");
    }

    #[test]
    fn site_equipment_filters_by_site_and_keeps_metadata() {
        let config = SheetsConfig::default().quarterly.equipment.clone();
        let rows = vec![
            row(&["inv-1", "Pump", "316", "SN-9", "M200", ""]),
            row(&["inv-2", "Pump", "317", "SN-3", "M200", "wet"]),
            row(&["", "Pump", "316"]),
        ];
        let found = parse_site_equipment(&rows, &config, "316");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "inv-1");
        assert_eq!(found[0].metadata.len(), 2);
        assert_eq!(found[0].metadata[0].label, "Serial number");
        assert_eq!(found[0].metadata[0].value, "SN-9");
    }

    #[test]
    fn record_lookup_reports_missing_site_as_none() {
        let config = SheetsConfig::default().quarterly.records.clone();
        let rows = vec![row(&["77", "", "2026-03-01"]), row(&["78", "316", ""])];

        let record = parse_record(&rows, &config, "77").unwrap();
        assert_eq!(record.site, None);
        assert_eq!(record.date.as_deref(), Some("2026-03-01"));

        let record = parse_record(&rows, &config, "78").unwrap();
        assert_eq!(record.site.as_deref(), Some("316"));
        assert!(parse_record(&rows, &config, "79").is_none());
    }
}
