// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Sitesnap workflow engine.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and Elm-style diagnostic error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use sitesnap_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Agent name: {}", config.agent.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AgentConfig, CatalogSheetConfig, EquipmentSheetConfig, JobsConfig, MediaConfig,
    MetadataColumn, PersonsSheetConfig, RangeConfig, RecordSheetConfig, SheetsConfig,
    SitesnapConfig, StorageConfig, TelegramConfig, WorkflowSheetsConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to rich miette diagnostics with typo suggestions
///
/// Returns either a valid `SitesnapConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<SitesnapConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            // Read TOML source files for error source span information
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<SitesnapConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from an explicit file path and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<SitesnapConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let mut sources = Vec::new();
            if let Ok(content) = std::fs::read_to_string(path) {
                sources.push((path.display().to_string(), content));
            }
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    // Local config
    if let Ok(content) = std::fs::read_to_string("sitesnap.toml") {
        let path = std::env::current_dir()
            .map(|d| d.join("sitesnap.toml").display().to_string())
            .unwrap_or_else(|_| "sitesnap.toml".to_string());
        sources.push((path, content));
    }

    // XDG user config
    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("sitesnap/sitesnap.toml");
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }

    // System config
    let system_path = std::path::Path::new("/etc/sitesnap/sitesnap.toml");
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_str_accepts_complete_config() {
        let toml = r#"
[agent]
name = "field-bot"
log_level = "debug"

[sheets]
api_key = "k"
cache_ttl_secs = 60
"#;
        let config = load_and_validate_str(toml).unwrap();
        assert_eq!(config.agent.name, "field-bot");
        assert_eq!(config.sheets.cache_ttl_secs, 60);
    }

    #[test]
    fn validate_str_surfaces_typo_with_suggestion() {
        let errors = load_and_validate_str("[media]\ncache_dri = \"x\"\n").unwrap_err();
        let has_suggestion = errors.iter().any(|e| {
            matches!(
                e,
                ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                    if key == "cache_dri" && s == "cache_dir"
            )
        });
        assert!(has_suggestion);
    }

    #[test]
    fn validate_str_surfaces_semantic_errors() {
        let errors = load_and_validate_str("[jobs]\npoll_secs = 0\n").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("poll_secs"))));
    }

    #[test]
    fn validate_str_reports_type_mismatch() {
        let errors = load_and_validate_str("[storage]\nwal_mode = \"yes\"\n").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))));
    }
}
