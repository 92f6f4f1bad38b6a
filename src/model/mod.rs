// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Core entity types shared by the store, dispatcher, and admission chain.
//!
//! Every type in this module is a plain data record; none of them carry
//! behavior beyond small invariant-preserving helpers. The authoritative
//! copy of a record always lives in the store — these structs are snapshots
//! passed between components.

pub mod condition;
pub mod hash;
pub mod history;
pub mod resource;
pub mod resource_type;
pub mod webhook;

pub use condition::{Condition, ConditionStatus, CONDITION_DEGRADED, CONDITION_READY, CONDITION_RECONCILING};
pub use hash::{canonical_json, spec_hash};
pub use history::{classify_trigger, HistoryPhase, ReconciliationHistory, TriggerReason};
pub use resource::{is_valid_resource_name, within_size_limit, Resource, ResourceStatus};
pub use resource_type::{ResourceType, ResourceTypeStatus};
pub use webhook::{AdmissionOperation, AdmissionWebhook, FailurePolicy, WebhookType};
