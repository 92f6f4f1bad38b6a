// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The `prepare → plan → apply | destroy → cleanup` phase protocol that
//! drives a single action executor through one reconcile attempt.

use std::collections::BTreeMap;

use crate::errors::ReconcileError;
use crate::model::HistoryPhase;
use crate::plugins::{ActionContext, ActionExecutor};

/// The result of running an executor through its full phase sequence for
/// one reconcile attempt.
#[derive(Debug, Clone, Default)]
pub struct PhaseOutcome {
    pub success: bool,
    pub phase: Option<HistoryPhase>,
    pub plan_output: Option<String>,
    pub apply_output: Option<String>,
    pub error_message: Option<String>,
    pub outputs: BTreeMap<String, serde_json::Value>,
    pub resources_created: i32,
    pub resources_updated: i32,
    pub resources_deleted: i32,
    pub has_changes: bool,
}

impl PhaseOutcome {
    fn failed(phase: HistoryPhase, message: impl Into<String>) -> Self {
        Self {
            success: false,
            phase: Some(phase),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Run `executor` through the full phase protocol. `resource_deleting`
/// selects the destroy branch instead of apply. Cleanup always runs once
/// `prepare` has produced a workspace, regardless of how later phases end.
pub async fn run_phases(
    executor: &dyn ActionExecutor,
    ctx: &ActionContext,
    resource_deleting: bool,
) -> PhaseOutcome {
    let workspace = match executor.prepare(ctx).await {
        Ok(ws) => ws,
        Err(e) => return PhaseOutcome::failed(HistoryPhase::Initializing, ReconcileError::Prepare(e.to_string()).to_string()),
    };

    let outcome = run_from_plan(executor, ctx, workspace.as_ref(), resource_deleting).await;

    if let Err(e) = executor.cleanup(workspace.as_ref()).await {
        tracing::warn!(resource_id = %ctx.resource_id, error = %e, "executor cleanup failed");
    }

    outcome
}

async fn run_from_plan(
    executor: &dyn ActionExecutor,
    ctx: &ActionContext,
    workspace: &dyn crate::plugins::Workspace,
    resource_deleting: bool,
) -> PhaseOutcome {
    let plan = match executor.plan(ctx, workspace).await {
        Ok(p) => p,
        Err(e) => return PhaseOutcome::failed(HistoryPhase::Planning, ReconcileError::Plan(e.to_string()).to_string()),
    };

    if !plan.success {
        return PhaseOutcome {
            success: false,
            phase: Some(HistoryPhase::Failed),
            plan_output: plan.plan_output,
            error_message: Some(plan.error_message.unwrap_or_else(|| "plan reported failure".into())),
            ..Default::default()
        };
    }

    if resource_deleting {
        return match executor.destroy(ctx, workspace).await {
            Ok(result) => from_apply_result(HistoryPhase::Destroying, plan.plan_output, result, plan.has_changes),
            Err(e) => PhaseOutcome::failed(HistoryPhase::Destroying, ReconcileError::Destroy(e.to_string()).to_string()),
        };
    }

    if !plan.has_changes {
        return PhaseOutcome {
            success: true,
            phase: Some(HistoryPhase::Completed),
            plan_output: plan.plan_output,
            has_changes: false,
            ..Default::default()
        };
    }

    match executor.apply(ctx, workspace).await {
        Ok(result) => from_apply_result(HistoryPhase::Applying, plan.plan_output, result, plan.has_changes),
        Err(e) => PhaseOutcome::failed(HistoryPhase::Applying, ReconcileError::Apply(e.to_string()).to_string()),
    }
}

fn from_apply_result(
    failed_phase: HistoryPhase,
    plan_output: Option<String>,
    result: crate::plugins::ApplyResult,
    has_changes: bool,
) -> PhaseOutcome {
    if !result.success {
        return PhaseOutcome {
            success: false,
            phase: Some(HistoryPhase::Failed),
            plan_output,
            apply_output: result.apply_output,
            error_message: Some(result.error_message.unwrap_or_else(|| format!("{failed_phase:?} reported failure"))),
            ..Default::default()
        };
    }
    PhaseOutcome {
        success: true,
        phase: Some(HistoryPhase::Completed),
        plan_output,
        apply_output: result.apply_output,
        outputs: result.outputs,
        resources_created: result.resources_created,
        resources_updated: result.resources_updated,
        resources_deleted: result.resources_deleted,
        has_changes,
        error_message: None,
    }
}

#[cfg(test)]
#[path = "phases_tests.rs"]
mod phases_tests;
