// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Append-only reconciliation attempt history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase reached by an executor during a single reconcile attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryPhase {
    Initializing,
    Planning,
    Applying,
    Destroying,
    Completed,
    Failed,
}

/// Why a reconcile attempt was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    Initial,
    SpecChange,
    Deletion,
    Retry,
    Scheduled,
}

/// One row per reconcile attempt, never mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationHistory {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub generation: i64,
    pub success: bool,
    pub phase: HistoryPhase,
    pub plan_output: Option<String>,
    pub apply_output: Option<String>,
    pub error_message: Option<String>,
    pub resources_created: i32,
    pub resources_updated: i32,
    pub resources_deleted: i32,
    pub duration_seconds: f64,
    pub trigger_reason: TriggerReason,
    pub drift_detected: bool,
    pub reconcile_time: DateTime<Utc>,
}

/// Classify the trigger reason for a reconcile attempt from the resource's
/// current fields, per the precedence order in the dispatcher design:
/// never-reconciled, then spec-changed, then deleting, then retry, else
/// scheduled.
#[must_use]
pub fn classify_trigger(
    last_reconcile_time: Option<DateTime<Utc>>,
    generation: i64,
    observed_generation: i64,
    status: crate::model::resource::ResourceStatus,
) -> TriggerReason {
    use crate::model::resource::ResourceStatus;
    if last_reconcile_time.is_none() {
        TriggerReason::Initial
    } else if generation > observed_generation {
        TriggerReason::SpecChange
    } else if status == ResourceStatus::Deleting {
        TriggerReason::Deletion
    } else if status == ResourceStatus::Failed {
        TriggerReason::Retry
    } else {
        TriggerReason::Scheduled
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod history_tests;
