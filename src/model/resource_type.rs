// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! `ResourceType`: a registered JSON-Schema-backed schema for resources.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceTypeStatus {
    Active,
    Deprecated,
}

/// A registered schema that `Resource`s of `(name, version)` are validated
/// against at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub schema: serde_json::Value,
    pub description: Option<String>,
    pub status: ResourceTypeStatus,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
