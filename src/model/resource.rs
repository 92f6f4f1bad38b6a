// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The `Resource` record: an instance of a registered `ResourceType`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hash::spec_hash;

/// Maximum encoded size, in bytes, of `spec` and `plugin_config` fields.
pub const MAX_JSON_FIELD_BYTES: usize = 1024 * 1024;

/// Lifecycle state of a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Pending,
    Reconciling,
    Ready,
    Failed,
    Deleting,
}

impl ResourceStatus {
    /// Ordering bucket used by the priority query: deleting first, then
    /// pending, then failed, then everything else.
    #[must_use]
    pub fn priority_bucket(self) -> u8 {
        match self {
            ResourceStatus::Deleting => 0,
            ResourceStatus::Pending => 1,
            ResourceStatus::Failed => 2,
            ResourceStatus::Reconciling | ResourceStatus::Ready => 3,
        }
    }
}

/// An instance of a registered resource type, as stored durably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub resource_type_name: String,
    pub resource_type_version: String,
    pub spec: serde_json::Value,
    pub spec_hash: String,
    pub plugin_config: serde_json::Value,
    pub metadata: BTreeMap<String, String>,
    pub outputs: serde_json::Value,
    pub action_plugin: String,
    pub status: ResourceStatus,
    pub status_message: Option<String>,
    pub generation: i64,
    pub observed_generation: i64,
    pub retry_count: i32,
    pub last_reconcile_time: Option<DateTime<Utc>>,
    pub next_reconcile_time: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub finalizers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Whether `observed_generation` is strictly behind `generation`, i.e.
    /// the last successful reconcile predates the current spec.
    #[must_use]
    pub fn spec_changed_since_last_success(&self) -> bool {
        self.generation > self.observed_generation
    }

    /// Recompute and assign `spec_hash` from the current `spec`.
    pub fn refresh_spec_hash(&mut self) {
        self.spec_hash = spec_hash(&self.spec);
    }

    /// Add a finalizer if absent. Idempotent.
    pub fn add_finalizer(&mut self, key: &str) {
        if !self.finalizers.iter().any(|f| f == key) {
            self.finalizers.push(key.to_string());
        }
    }

    /// Remove a finalizer if present. Idempotent.
    pub fn remove_finalizer(&mut self, key: &str) {
        self.finalizers.retain(|f| f != key);
    }

    /// Per the hard-delete invariant: only eligible once soft-deleted and
    /// every finalizer has been released.
    #[must_use]
    pub fn eligible_for_hard_delete(&self) -> bool {
        self.deleted_at.is_some() && self.finalizers.is_empty()
    }
}

/// Validate a resource name against `^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$`.
#[must_use]
pub fn is_valid_resource_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 63 {
        return false;
    }
    let is_alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !is_alnum(bytes[0]) || !is_alnum(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes
        .iter()
        .all(|&b| is_alnum(b) || b == b'-')
}

/// Validate that a JSON value's serialized size does not exceed the cap.
#[must_use]
pub fn within_size_limit(value: &serde_json::Value) -> bool {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len() <= MAX_JSON_FIELD_BYTES)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod resource_tests;
