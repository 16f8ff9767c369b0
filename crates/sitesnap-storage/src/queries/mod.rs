// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over the workflow database.

pub mod audit;
pub mod sessions;
