// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Standardized status facets attached to a resource.
//!
//! Conditions are derived side-effects of reconciliation outcomes, never
//! written directly by a client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three well-known condition types the dispatcher maintains.
pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_RECONCILING: &str = "Reconciling";
pub const CONDITION_DEGRADED: &str = "Degraded";

/// Tri-state condition status, following the Kubernetes convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A single named status facet on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub r#type: String,
    pub status: ConditionStatus,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub observed_generation: i64,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Build a condition stamped with the current time.
    #[must_use]
    pub fn new(
        condition_type: &str,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        observed_generation: i64,
    ) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status,
            reason: Some(reason.into()),
            message: Some(message.into()),
            observed_generation,
            last_transition_time: Utc::now(),
        }
    }

    /// Whether this condition differs in any user-visible facet from
    /// `existing`, ignoring `last_transition_time`.
    #[must_use]
    pub fn differs_from(&self, existing: &Condition) -> bool {
        self.r#type != existing.r#type
            || self.status != existing.status
            || self.reason != existing.reason
            || self.message != existing.message
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod condition_tests;
