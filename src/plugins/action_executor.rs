// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The action executor contract: the pluggable lifecycle that drives a
//! resource's actual state toward its spec.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Everything an executor's phases need about the resource they're driving.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub resource_id: Uuid,
    pub name: String,
    pub generation: i64,
    pub spec: Value,
    pub spec_hash: String,
    pub plugin_config: Value,
}

/// Opaque handle an executor hands itself between phases. The dispatcher
/// never inspects a workspace; it only threads it from `prepare` through
/// `cleanup`.
pub trait Workspace: Send + Sync {}

/// The result of `plan`.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub success: bool,
    pub has_changes: bool,
    pub plan_output: Option<String>,
    pub error_message: Option<String>,
}

/// The result of `apply` or `destroy`.
#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
    pub success: bool,
    pub apply_output: Option<String>,
    pub error_message: Option<String>,
    pub outputs: BTreeMap<String, Value>,
    pub resources_created: i32,
    pub resources_updated: i32,
    pub resources_deleted: i32,
}

/// A drift report from an executor that supports `detect_drift`.
#[derive(Debug, Clone)]
pub struct DriftReport {
    pub has_changes: bool,
    pub details: Option<String>,
}

/// An action executor: `prepare → plan → apply | destroy → cleanup`, as
/// driven by the dispatcher's phase protocol.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> &str;

    /// Validate `spec` against whatever this executor expects beyond the
    /// resource type's JSON-Schema. Most executors accept anything.
    fn validate_spec(&self, _spec: &Value) -> Result<(), String> {
        Ok(())
    }

    async fn initialize(&self, config: &Value) -> anyhow::Result<()>;

    async fn prepare(&self, ctx: &ActionContext) -> anyhow::Result<Box<dyn Workspace>>;

    async fn plan(&self, ctx: &ActionContext, workspace: &dyn Workspace) -> anyhow::Result<PlanResult>;

    async fn apply(&self, ctx: &ActionContext, workspace: &dyn Workspace) -> anyhow::Result<ApplyResult>;

    async fn destroy(&self, ctx: &ActionContext, workspace: &dyn Workspace) -> anyhow::Result<ApplyResult>;

    async fn get_outputs(&self, ctx: &ActionContext) -> anyhow::Result<BTreeMap<String, Value>>;

    async fn get_state(&self, ctx: &ActionContext) -> anyhow::Result<Option<Value>>;

    async fn cleanup(&self, workspace: &dyn Workspace) -> anyhow::Result<()>;

    /// Executors that can cheaply compare desired vs. observed state without
    /// a full plan may implement this; the dispatcher only calls it for
    /// `scheduled`-triggered reconciles.
    async fn detect_drift(&self, _ctx: &ActionContext) -> anyhow::Result<Option<DriftReport>> {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "action_executor_tests.rs"]
mod action_executor_tests;
