// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Person directory over the configured people sheet.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sitesnap_config::PersonsSheetConfig;
use sitesnap_core::{Person, PersonDirectory, PersonRole, SitesnapError};

use crate::cache::CachedRange;
use crate::client::SheetsClient;

fn parse_role(marker: &str) -> PersonRole {
    if marker.eq_ignore_ascii_case("admin") || marker.eq_ignore_ascii_case("administrator") {
        PersonRole::Admin
    } else if marker.eq_ignore_ascii_case("engineer") {
        PersonRole::Engineer
    } else {
        PersonRole::Unknown
    }
}

fn normalize_username(username: &str) -> String {
    username.trim().trim_start_matches('@').to_lowercase()
}

/// Parse directory rows into people. Rows without a username are
/// skipped; they can never be matched.
pub fn parse_persons(rows: &[Vec<String>], config: &PersonsSheetConfig) -> Vec<Person> {
    let cell = |row: &[String], column: &str| -> String {
        config
            .range
            .column_offset(column)
            .and_then(|offset| row.get(offset))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    rows.iter()
        .filter_map(|row| {
            let username = cell(row, &config.username_column);
            if username.is_empty() {
                return None;
            }
            let id = cell(row, &config.id_column);
            Some(Person {
                id: if id.is_empty() { username.clone() } else { id },
                username,
                full_name: cell(row, &config.name_column),
                role: parse_role(&cell(row, &config.role_column)),
            })
        })
        .collect()
}

/// `PersonDirectory` over the Sheets API with a TTL cache.
pub struct SheetPersonDirectory {
    client: Arc<SheetsClient>,
    config: PersonsSheetConfig,
    cache: CachedRange,
}

impl SheetPersonDirectory {
    pub fn new(client: Arc<SheetsClient>, config: PersonsSheetConfig, ttl: Duration) -> Self {
        Self {
            client,
            config,
            cache: CachedRange::new(ttl),
        }
    }
}

#[async_trait]
impl PersonDirectory for SheetPersonDirectory {
    async fn person_by_username(&self, username: &str) -> Result<Option<Person>, SitesnapError> {
        let client = self.client.clone();
        let range = self.config.range.clone();
        let rows = self
            .cache
            .get_or_fetch(move || async move { client.values(&range).await })
            .await?;

        let wanted = normalize_username(username);
        Ok(parse_persons(&rows, &self.config)
            .into_iter()
            .find(|p| normalize_username(&p.username) == wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_roles_case_insensitively() {
        let config = PersonsSheetConfig::default();
        let rows = vec![
            row(&["p-1", "field_eng", "Jo", "Engineer"]),
            row(&["p-2", "chief", "Sam", "ADMIN"]),
            row(&["p-3", "guest", "Lee", "visitor"]),
        ];
        let persons = parse_persons(&rows, &config);
        assert_eq!(persons[0].role, PersonRole::Engineer);
        assert_eq!(persons[1].role, PersonRole::Admin);
        assert_eq!(persons[2].role, PersonRole::Unknown);
    }

    #[test]
    fn rows_without_username_are_skipped() {
        let config = PersonsSheetConfig::default();
        let rows = vec![row(&["p-1", "", "Jo", "Engineer"]), row(&["", "chief", "Sam", "admin"])];
        let persons = parse_persons(&rows, &config);
        assert_eq!(persons.len(), 1);
        // Missing id falls back to the username.
        assert_eq!(persons[0].id, "chief");
    }

    #[test]
    fn username_match_ignores_case_and_at_prefix() {
        assert_eq!(normalize_username("@Field_Eng "), "field_eng");
        assert_eq!(normalize_username("FIELD_ENG"), "field_eng");
    }
}
