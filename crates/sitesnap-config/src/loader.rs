// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./sitesnap.toml` > `~/.config/sitesnap/sitesnap.toml` >
//! `/etc/sitesnap/sitesnap.toml` with environment variable overrides via the
//! `SITESNAP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SitesnapConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/sitesnap/sitesnap.toml` (system-wide)
/// 3. `~/.config/sitesnap/sitesnap.toml` (user XDG config)
/// 4. `./sitesnap.toml` (local directory)
/// 5. `SITESNAP_*` environment variables
pub fn load_config() -> Result<SitesnapConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SitesnapConfig::default()))
        .merge(Toml::file("/etc/sitesnap/sitesnap.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("sitesnap/sitesnap.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("sitesnap.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and embedded defaults.
pub fn load_config_from_str(toml_content: &str) -> Result<SitesnapConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SitesnapConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SitesnapConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SitesnapConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SitesnapConfig::default()))
        .merge(Toml::file("/etc/sitesnap/sitesnap.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("sitesnap/sitesnap.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("sitesnap.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `SITESNAP_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`.
///
/// Only top-level sections are mapped. Nested sheet layout (ranges, column
/// letters) is TOML-only by design.
fn env_provider() -> Env {
    Env::prefixed("SITESNAP_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: SITESNAP_SHEETS_API_KEY -> "sheets_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("media_", "media.", 1)
            .replacen("jobs_", "jobs.", 1)
            .replacen("sheets_", "sheets.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_applies_defaults() {
        let config = load_config_from_str("[agent]\nname = \"field-bot\"\n").unwrap();
        assert_eq!(config.agent.name, "field-bot");
        assert_eq!(config.agent.log_level, "info");
        assert_eq!(config.media.download_attempts, 10);
    }

    #[test]
    fn load_from_str_rejects_unknown_section_key() {
        let result = load_config_from_str("[storage]\ndatabse_path = \"x.db\"\n");
        assert!(result.is_err());
    }

    #[test]
    #[serial_test::serial]
    fn env_var_overrides_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitesnap.toml");
        std::fs::write(&path, "[telegram]\nbot_token = \"from-file\"\n").unwrap();

        // Unsafe in edition 2024; tests are serialized so no data race.
        unsafe { std::env::set_var("SITESNAP_TELEGRAM_BOT_TOKEN", "from-env") };
        let config = load_config_from_path(&path).unwrap();
        unsafe { std::env::remove_var("SITESNAP_TELEGRAM_BOT_TOKEN") };

        assert_eq!(config.telegram.bot_token.as_deref(), Some("from-env"));
    }

    #[test]
    #[serial_test::serial]
    fn env_var_maps_underscore_keys_into_sections() {
        unsafe { std::env::set_var("SITESNAP_MEDIA_DOWNLOAD_ATTEMPTS", "4") };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitesnap.toml");
        std::fs::write(&path, "").unwrap();
        let config = load_config_from_path(&path).unwrap();
        unsafe { std::env::remove_var("SITESNAP_MEDIA_DOWNLOAD_ATTEMPTS") };

        assert_eq!(config.media.download_attempts, 4);
    }
}
