// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sitesnap doctor` command implementation.
//!
//! Runs diagnostic checks against the Sitesnap environment to identify
//! configuration issues, connectivity problems, and permission errors
//! before the bot is started.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use sitesnap_config::SitesnapConfig;
use sitesnap_core::SitesnapError;
use sitesnap_jobs::JobStore;
use sitesnap_sheets::SheetsClient;
use sitesnap_storage::Database;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: String, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
            duration: start.elapsed(),
        }
    }
}

/// Run the `sitesnap doctor` command.
///
/// Returns `Ok(true)` when no check failed; warnings do not affect the
/// exit code. With `--plain`, disables colored output.
pub async fn run_doctor(
    config: &SitesnapConfig,
    config_path: Option<&Path>,
    plain: bool,
) -> Result<bool, SitesnapError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(config_path),
        check_database(&config.storage.database_path).await,
        check_bot(config).await,
        check_sheets(config).await,
        check_writable_dir("Media cache", &config.media.cache_dir),
        check_writable_dir("Export dir", &config.jobs.export_dir),
        check_backlog(&config.storage.database_path).await,
    ];

    println!();
    println!("  sitesnap doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        let duration_ms = result.duration.as_millis();
        let line = match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✓".green(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [OK]   {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "!".yellow(),
                        result.name,
                        result.message.yellow()
                    )
                } else {
                    format!(
                        "    [WARN] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✗".red(),
                        result.name,
                        result.message.red()
                    )
                } else {
                    format!(
                        "    [FAIL] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
        };
        println!("{line}");
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(fail_count == 0)
}

/// Check configuration loads without errors.
fn check_config(config_path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let result = match config_path {
        Some(path) => sitesnap_config::load_and_validate_path(path),
        None => sitesnap_config::load_and_validate(),
    };
    match result {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid".into(), start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check the database opens and migrations apply.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    match Database::open(db_path).await {
        Ok(db) => {
            let message = "connected, migrations current".to_string();
            match db.close().await {
                Ok(()) => CheckResult::new("Database", CheckStatus::Pass, message, start),
                Err(e) => CheckResult::new(
                    "Database",
                    CheckStatus::Warn,
                    format!("close failed: {e}"),
                    start,
                ),
            }
        }
        Err(e) => CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        ),
    }
}

/// Check the bot token is present and accepted by the Bot API.
async fn check_bot(config: &SitesnapConfig) -> CheckResult {
    let start = Instant::now();

    let bot = match sitesnap_telegram::gateway_bot(&config.telegram) {
        Ok(bot) => bot,
        Err(_) => {
            return CheckResult::new(
                "Telegram bot",
                CheckStatus::Warn,
                "no bot token configured".into(),
                start,
            );
        }
    };

    match sitesnap_telegram::health_check(&bot).await {
        Ok(()) => CheckResult::new("Telegram bot", CheckStatus::Pass, "getMe ok".into(), start),
        Err(e) => CheckResult::new("Telegram bot", CheckStatus::Fail, format!("{e}"), start),
    }
}

/// Check the Sheets API answers a read of the persons range.
async fn check_sheets(config: &SitesnapConfig) -> CheckResult {
    let start = Instant::now();

    let Some(api_key) = config.sheets.api_key.as_deref() else {
        return CheckResult::new(
            "Sheets API",
            CheckStatus::Warn,
            "no API key configured".into(),
            start,
        );
    };

    let client = match SheetsClient::with_base_url(api_key, &config.sheets.base_url) {
        Ok(client) => client,
        Err(e) => {
            return CheckResult::new("Sheets API", CheckStatus::Fail, format!("{e}"), start);
        }
    };

    match client.values(&config.sheets.persons.range).await {
        Ok(rows) => CheckResult::new(
            "Sheets API",
            CheckStatus::Pass,
            format!("persons range readable ({} rows)", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new("Sheets API", CheckStatus::Fail, format!("{e}"), start),
    }
}

/// Check a directory exists (creating it) and accepts writes.
fn check_writable_dir(name: &str, dir: &str) -> CheckResult {
    let start = Instant::now();

    if let Err(e) = std::fs::create_dir_all(dir) {
        return CheckResult::new(name, CheckStatus::Fail, format!("create failed: {e}"), start);
    }

    let probe = Path::new(dir).join(".sitesnap-doctor");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            CheckResult::new(name, CheckStatus::Pass, format!("writable: {dir}"), start)
        }
        Err(e) => CheckResult::new(name, CheckStatus::Fail, format!("not writable: {e}"), start),
    }
}

/// Report the number of jobs still owed work.
async fn check_backlog(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Job backlog",
            CheckStatus::Warn,
            "database not found (skipped)".into(),
            start,
        );
    }

    let store = match JobStore::open(db_path).await {
        Ok(store) => store,
        Err(e) => {
            return CheckResult::new("Job backlog", CheckStatus::Fail, format!("{e}"), start);
        }
    };

    match store.backlog_count().await {
        Ok(0) => CheckResult::new("Job backlog", CheckStatus::Pass, "empty".into(), start),
        Ok(n) => CheckResult::new(
            "Job backlog",
            CheckStatus::Pass,
            format!("{n} job(s) pending"),
            start,
        ),
        Err(e) => CheckResult::new("Job backlog", CheckStatus::Fail, format!("{e}"), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_bot_token_warns() {
        let config = SitesnapConfig::default();
        let result = check_bot(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn missing_sheets_key_warns() {
        let config = SitesnapConfig::default();
        let result = check_sheets(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[test]
    fn writable_dir_passes_and_removes_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        let result = check_writable_dir("Media cache", path.to_str().unwrap());
        assert_eq!(result.status, CheckStatus::Pass);
        assert!(!path.join(".sitesnap-doctor").exists());
    }

    #[tokio::test]
    async fn missing_database_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let result = check_database(path.to_str().unwrap()).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn existing_database_passes_and_backlog_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitesnap.db");
        let path = path.to_str().unwrap();
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();

        let result = check_database(path).await;
        assert_eq!(result.status, CheckStatus::Pass);

        let backlog = check_backlog(path).await;
        assert_eq!(backlog.status, CheckStatus::Pass);
        assert_eq!(backlog.message, "empty");
    }
}
