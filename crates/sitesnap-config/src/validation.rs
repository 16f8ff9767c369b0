// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express, such as column letters
//! falling inside their declared range and non-zero retry counts.

use crate::diagnostic::ConfigError;
use crate::model::{
    column_index, RangeConfig, SitesnapConfig, WorkflowSheetsConfig,
};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SitesnapConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of trace, debug, info, warn, error; got `{}`",
                config.agent.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.media.cache_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "media.cache_dir must not be empty".to_string(),
        });
    }

    if config.media.download_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "media.download_attempts must be at least 1".to_string(),
        });
    }

    if config.jobs.poll_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "jobs.poll_secs must be at least 1".to_string(),
        });
    }

    if config.jobs.lease_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "jobs.lease_secs must be at least 1".to_string(),
        });
    }

    if config.jobs.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "jobs.max_attempts must be at least 1".to_string(),
        });
    }

    if config.jobs.export_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "jobs.export_dir must not be empty".to_string(),
        });
    }

    let base_url = config.sheets.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "sheets.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("sheets.base_url must start with http:// or https://, got `{base_url}`"),
        });
    }

    if config.sheets.cache_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sheets.cache_ttl_secs must be at least 1".to_string(),
        });
    }

    let persons = &config.sheets.persons;
    validate_range("sheets.persons", &persons.range, &mut errors);
    for (field, column) in [
        ("id_column", &persons.id_column),
        ("username_column", &persons.username_column),
        ("name_column", &persons.name_column),
        ("role_column", &persons.role_column),
    ] {
        validate_column("sheets.persons", field, column, &persons.range, &mut errors);
    }

    validate_workflow("sheets.quarterly", &config.sheets.quarterly, &mut errors);
    validate_workflow("sheets.annual", &config.sheets.annual, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_workflow(prefix: &str, sheets: &WorkflowSheetsConfig, errors: &mut Vec<ConfigError>) {
    let records_prefix = format!("{prefix}.records");
    validate_range(&records_prefix, &sheets.records.range, errors);
    for (field, column) in [
        ("id_column", &sheets.records.id_column),
        ("site_column", &sheets.records.site_column),
        ("date_column", &sheets.records.date_column),
    ] {
        validate_column(&records_prefix, field, column, &sheets.records.range, errors);
    }

    let catalog_prefix = format!("{prefix}.catalog");
    validate_range(&catalog_prefix, &sheets.catalog.range, errors);
    for (field, column) in [
        ("name_column", &sheets.catalog.name_column),
        ("code_column", &sheets.catalog.code_column),
        ("scope_column", &sheets.catalog.scope_column),
        ("examples_start_column", &sheets.catalog.examples_start_column),
    ] {
        validate_column(&catalog_prefix, field, column, &sheets.catalog.range, errors);
    }

    let equipment_prefix = format!("{prefix}.equipment");
    validate_range(&equipment_prefix, &sheets.equipment.range, errors);
    for (field, column) in [
        ("id_column", &sheets.equipment.id_column),
        ("name_column", &sheets.equipment.name_column),
        ("site_column", &sheets.equipment.site_column),
    ] {
        validate_column(&equipment_prefix, field, column, &sheets.equipment.range, errors);
    }
    for (i, meta) in sheets.equipment.metadata.iter().enumerate() {
        if meta.label.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{equipment_prefix}.metadata[{i}].label must not be empty"),
            });
        }
        let field = format!("metadata[{i}].column");
        validate_column(&equipment_prefix, &field, &meta.column, &sheets.equipment.range, errors);
    }
}

fn validate_range(prefix: &str, range: &RangeConfig, errors: &mut Vec<ConfigError>) {
    if range.sheet.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{prefix}.range.sheet must not be empty"),
        });
    }

    let start = column_index(&range.start_column);
    let end = column_index(&range.end_column);
    if start.is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "{prefix}.range.start_column `{}` is not a column letter",
                range.start_column
            ),
        });
    }
    if end.is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "{prefix}.range.end_column `{}` is not a column letter",
                range.end_column
            ),
        });
    }
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "{prefix}.range start_column `{}` is after end_column `{}`",
                range.start_column, range.end_column
            ),
        });
    }

    if range.start_row == 0 {
        errors.push(ConfigError::Validation {
            message: format!("{prefix}.range.start_row must be at least 1"),
        });
    }
    if range.end_row < range.start_row {
        errors.push(ConfigError::Validation {
            message: format!(
                "{prefix}.range.end_row {} is before start_row {}",
                range.end_row, range.start_row
            ),
        });
    }
}

fn validate_column(
    prefix: &str,
    field: &str,
    column: &str,
    range: &RangeConfig,
    errors: &mut Vec<ConfigError>,
) {
    if column_index(column).is_none() {
        errors.push(ConfigError::Validation {
            message: format!("{prefix}.{field} `{column}` is not a column letter"),
        });
        return;
    }
    if range.column_offset(column).is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "{prefix}.{field} `{column}` falls outside range {}..{}",
                range.start_column, range.end_column
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = SitesnapConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = SitesnapConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_download_attempts_fails_validation() {
        let mut config = SitesnapConfig::default();
        config.media.download_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("download_attempts"))));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = SitesnapConfig::default();
        config.agent.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))));
    }

    #[test]
    fn column_outside_range_fails_validation() {
        let mut config = SitesnapConfig::default();
        config.sheets.persons.role_column = "Z".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("role_column"))));
    }

    #[test]
    fn inverted_range_fails_validation() {
        let mut config = SitesnapConfig::default();
        config.sheets.quarterly.catalog.range.end_column = "A".to_string();
        config.sheets.quarterly.catalog.range.start_column = "D".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("after end_column"))));
    }

    #[test]
    fn metadata_column_outside_range_fails_validation() {
        let mut config = SitesnapConfig::default();
        config.sheets.annual.equipment.metadata[0].column = "AA".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("metadata[0]"))));
    }

    #[test]
    fn multiple_problems_are_all_reported() {
        let mut config = SitesnapConfig::default();
        config.storage.database_path = String::new();
        config.jobs.poll_secs = 0;
        config.sheets.cache_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let mut config = SitesnapConfig::default();
        config.sheets.base_url = "ftp://example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("base_url"))));
    }
}
