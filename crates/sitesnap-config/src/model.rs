// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed configuration model.
//!
//! Every section deserializes with `deny_unknown_fields` so that a typo in
//! `sitesnap.toml` surfaces as a diagnostic instead of being silently
//! ignored. Defaults are expressed as standalone functions so that serde and
//! the manual [`Default`] impls cannot drift apart.

use serde::{Deserialize, Serialize};

/// Root configuration for the Sitesnap agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SitesnapConfig {
    /// Agent identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Media download and cache settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Background job queue settings.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Google Sheets data source settings.
    #[serde(default)]
    pub sheets: SheetsConfig,
}

impl Default for SitesnapConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            telegram: TelegramConfig::default(),
            storage: StorageConfig::default(),
            media: MediaConfig::default(),
            jobs: JobsConfig::default(),
            sheets: SheetsConfig::default(),
        }
    }
}

/// `[agent]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in notices and log lines.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_agent_name() -> String {
    "sitesnap".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

/// `[telegram]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. Usually supplied via `SITESNAP_TELEGRAM_BOT_TOKEN`
    /// rather than written to disk.
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self { bot_token: None }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to enable WAL journaling.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

fn default_database_path() -> String {
    "sitesnap.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

/// `[media]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// Directory where accepted photographs are cached before export.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// How many times to attempt a photo download before giving up.
    #[serde(default = "default_download_attempts")]
    pub download_attempts: u32,
}

fn default_cache_dir() -> String {
    "media-cache".to_string()
}

fn default_download_attempts() -> u32 {
    10
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            download_attempts: default_download_attempts(),
        }
    }
}

/// `[jobs]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Seconds between queue polls when the queue is idle.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    /// Seconds a claimed job stays leased before it becomes claimable again.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,

    /// Attempts before a job is parked as failed.
    #[serde(default = "default_job_attempts")]
    pub max_attempts: u32,

    /// Directory where finalized record bundles are exported.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_poll_secs() -> u64 {
    5
}

fn default_lease_secs() -> u64 {
    120
}

fn default_job_attempts() -> u32 {
    5
}

fn default_export_dir() -> String {
    "export".to_string()
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_secs: default_poll_secs(),
            lease_secs: default_lease_secs(),
            max_attempts: default_job_attempts(),
            export_dir: default_export_dir(),
        }
    }
}

/// `[sheets]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SheetsConfig {
    /// Google Sheets API key. Usually supplied via
    /// `SITESNAP_SHEETS_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Sheets API. Overridden in tests.
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,

    /// Seconds a fetched range stays fresh before it is re-read.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Reviewer and applicant directory sheet.
    #[serde(default)]
    pub persons: PersonsSheetConfig,

    /// Sheets backing the quarterly maintenance workflow.
    #[serde(default = "WorkflowSheetsConfig::quarterly_defaults")]
    pub quarterly: WorkflowSheetsConfig,

    /// Sheets backing the annual maintenance workflow.
    #[serde(default = "WorkflowSheetsConfig::annual_defaults")]
    pub annual: WorkflowSheetsConfig,
}

fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_sheets_base_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            persons: PersonsSheetConfig::default(),
            quarterly: WorkflowSheetsConfig::quarterly_defaults(),
            annual: WorkflowSheetsConfig::annual_defaults(),
        }
    }
}

/// A rectangular sheet region in A1 terms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    /// Spreadsheet document id. Empty means "not configured yet".
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Tab name inside the spreadsheet.
    pub sheet: String,

    /// First column letter of the region, e.g. "A".
    #[serde(default = "default_start_column")]
    pub start_column: String,

    /// Last column letter of the region.
    pub end_column: String,

    /// First data row. Row 1 is usually a header.
    #[serde(default = "default_start_row")]
    pub start_row: u32,

    /// Last row to read.
    #[serde(default = "default_end_row")]
    pub end_row: u32,
}

fn default_start_column() -> String {
    "A".to_string()
}

fn default_start_row() -> u32 {
    2
}

fn default_end_row() -> u32 {
    500
}

impl RangeConfig {
    fn new(sheet: &str, end_column: &str) -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet: sheet.to_string(),
            start_column: default_start_column(),
            end_column: end_column.to_string(),
            start_row: default_start_row(),
            end_row: default_end_row(),
        }
    }

    /// Renders the region in A1 notation, e.g. `People!A2:E500`.
    pub fn a1(&self) -> String {
        format!(
            "{}!{}{}:{}{}",
            self.sheet, self.start_column, self.start_row, self.end_column, self.end_row
        )
    }

    /// Zero-based offset of a column letter from `start_column`, or `None`
    /// when the letter falls outside the region.
    pub fn column_offset(&self, column: &str) -> Option<usize> {
        let col = column_index(column)?;
        let start = column_index(&self.start_column)?;
        let end = column_index(&self.end_column)?;
        if col < start || col > end {
            return None;
        }
        Some((col - start) as usize)
    }
}

/// Converts a column letter sequence ("A", "Z", "AA") to a zero-based index.
///
/// Returns `None` for empty or non-alphabetic input.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let v = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index.checked_mul(26)?.checked_add(v)?;
    }
    Some(index - 1)
}

/// `[sheets.persons]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PersonsSheetConfig {
    /// Region holding the person directory.
    #[serde(default = "default_persons_range")]
    pub range: RangeConfig,

    /// Column holding the person id.
    #[serde(default = "default_column_a")]
    pub id_column: String,

    /// Column holding the Telegram username.
    #[serde(default = "default_column_b")]
    pub username_column: String,

    /// Column holding the display name.
    #[serde(default = "default_column_c")]
    pub name_column: String,

    /// Column holding the role marker.
    #[serde(default = "default_column_d")]
    pub role_column: String,
}

fn default_persons_range() -> RangeConfig {
    RangeConfig::new("People", "E")
}

fn default_column_a() -> String {
    "A".to_string()
}

fn default_column_b() -> String {
    "B".to_string()
}

fn default_column_c() -> String {
    "C".to_string()
}

fn default_column_d() -> String {
    "D".to_string()
}

impl Default for PersonsSheetConfig {
    fn default() -> Self {
        Self {
            range: default_persons_range(),
            id_column: default_column_a(),
            username_column: default_column_b(),
            name_column: default_column_c(),
            role_column: default_column_d(),
        }
    }
}

/// Sheets backing one workflow kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkflowSheetsConfig {
    /// Maintenance record register.
    pub records: RecordSheetConfig,

    /// Equipment catalog with scopes and example photographs.
    pub catalog: CatalogSheetConfig,

    /// Per-site equipment inventory.
    pub equipment: EquipmentSheetConfig,
}

impl WorkflowSheetsConfig {
    pub fn quarterly_defaults() -> Self {
        Self {
            records: RecordSheetConfig::new("QuarterlyRecords"),
            catalog: CatalogSheetConfig::new("QuarterlyCatalog"),
            equipment: EquipmentSheetConfig::new("SiteEquipment"),
        }
    }

    pub fn annual_defaults() -> Self {
        Self {
            records: RecordSheetConfig::new("AnnualRecords"),
            catalog: CatalogSheetConfig::new("AnnualCatalog"),
            equipment: EquipmentSheetConfig::new("SiteEquipment"),
        }
    }
}

/// One workflow's maintenance record register.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RecordSheetConfig {
    /// Region holding the records.
    pub range: RangeConfig,

    /// Column holding the record number.
    #[serde(default = "default_column_a")]
    pub id_column: String,

    /// Column holding the site name.
    #[serde(default = "default_column_b")]
    pub site_column: String,

    /// Column holding the scheduled date.
    #[serde(default = "default_column_c")]
    pub date_column: String,
}

impl RecordSheetConfig {
    fn new(sheet: &str) -> Self {
        Self {
            range: RangeConfig::new(sheet, "F"),
            id_column: default_column_a(),
            site_column: default_column_b(),
            date_column: default_column_c(),
        }
    }
}

/// One workflow's equipment catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CatalogSheetConfig {
    /// Region holding the catalog.
    pub range: RangeConfig,

    /// Column holding the catalog entry name.
    #[serde(default = "default_column_a")]
    pub name_column: String,

    /// Column holding the short equipment code.
    #[serde(default = "default_column_b")]
    pub code_column: String,

    /// Column holding the scope marker (per-instance or per-site).
    #[serde(default = "default_column_c")]
    pub scope_column: String,

    /// First of the alternating example image / caption column pairs.
    #[serde(default = "default_column_d")]
    pub examples_start_column: String,
}

impl CatalogSheetConfig {
    fn new(sheet: &str) -> Self {
        Self {
            range: RangeConfig::new(sheet, "N"),
            name_column: default_column_a(),
            code_column: default_column_b(),
            scope_column: default_column_c(),
            examples_start_column: default_column_d(),
        }
    }
}

/// A labelled metadata column on the equipment inventory sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetadataColumn {
    /// Label shown in the photo prompt, e.g. "Serial number".
    pub label: String,

    /// Column letter the value lives in.
    pub column: String,
}

/// One workflow's per-site equipment inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EquipmentSheetConfig {
    /// Region holding the inventory.
    pub range: RangeConfig,

    /// Column holding the equipment id.
    #[serde(default = "default_column_a")]
    pub id_column: String,

    /// Column holding the equipment name (matched against the catalog).
    #[serde(default = "default_column_b")]
    pub name_column: String,

    /// Column holding the site the equipment belongs to.
    #[serde(default = "default_column_c")]
    pub site_column: String,

    /// Extra labelled columns rendered into photo prompts.
    #[serde(default = "default_equipment_metadata")]
    pub metadata: Vec<MetadataColumn>,
}

fn default_equipment_metadata() -> Vec<MetadataColumn> {
    vec![
        MetadataColumn {
            label: "Serial number".to_string(),
            column: "D".to_string(),
        },
        MetadataColumn {
            label: "Model".to_string(),
            column: "E".to_string(),
        },
        MetadataColumn {
            label: "Type".to_string(),
            column: "F".to_string(),
        },
    ]
}

impl EquipmentSheetConfig {
    fn new(sheet: &str) -> Self {
        Self {
            range: RangeConfig::new(sheet, "K"),
            id_column: default_column_a(),
            name_column: default_column_b(),
            site_column: default_column_c(),
            metadata: default_equipment_metadata(),
        }
    }
}
