// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Admission webhook registration records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a webhook mutates (and may patch) or only validates a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WebhookType {
    Mutating,
    Validating,
}

/// Operation a webhook is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AdmissionOperation {
    Create,
    Update,
    Delete,
}

/// What to do when a webhook is unreachable or errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum FailurePolicy {
    Fail,
    Ignore,
}

/// A registered admission webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionWebhook {
    pub id: Uuid,
    pub name: String,
    pub webhook_url: String,
    pub webhook_type: WebhookType,
    pub operations: Vec<AdmissionOperation>,
    pub resource_type_name: Option<String>,
    pub resource_type_version: Option<String>,
    pub timeout_seconds: u32,
    pub failure_policy: FailurePolicy,
    pub ordering: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdmissionWebhook {
    /// Whether this webhook applies to the given operation and resource type
    /// identity. `null` type/version fields on the webhook match everything.
    #[must_use]
    pub fn matches(
        &self,
        operation: AdmissionOperation,
        resource_type_name: &str,
        resource_type_version: &str,
    ) -> bool {
        self.operations.contains(&operation)
            && self
                .resource_type_name
                .as_deref()
                .is_none_or(|n| n == resource_type_name)
            && self
                .resource_type_version
                .as_deref()
                .is_none_or(|v| v == resource_type_version)
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod webhook_tests;
