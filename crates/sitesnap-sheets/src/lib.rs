// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Sheets data source for the Sitesnap workflow engine.
//!
//! Implements the read-only directory traits (`CatalogStore`,
//! `PersonDirectory`) over the Sheets `values.get` API. Catalog,
//! inventory, and person ranges are cached with a TTL; maintenance
//! record lookups always hit the API so freshly created records
//! resolve immediately.

pub mod cache;
pub mod catalog;
pub mod client;
pub mod persons;

pub use catalog::SheetCatalog;
pub use client::SheetsClient;
pub use persons::SheetPersonDirectory;
