// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The reconcile dispatcher: the poll loop, the requeue loop, and the
//! per-resource reconcile task that drives an action executor through its
//! phase protocol.

pub mod phases;
pub mod requeue;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{ReconcileConfig, POLL_LOOP_ERROR_SLEEP_SECS};
use crate::event_bus::{EventBus, EventKind, ResourceEvent};
use crate::model::{
    classify_trigger, Condition, ConditionStatus, HistoryPhase, ReconciliationHistory, Resource, ResourceStatus,
    TriggerReason, CONDITION_DEGRADED, CONDITION_READY, CONDITION_RECONCILING,
};
use crate::plugins::{ActionContext, PluginRegistry};
use crate::shutdown::ShutdownHandle;
use crate::store::Store;

use phases::run_phases;

/// Drives the reconcile loops. Owns no resource state itself; everything
/// durable lives in the `Store`.
pub struct Dispatcher {
    store: Arc<dyn Store>,
    registry: Arc<PluginRegistry>,
    event_bus: Arc<EventBus>,
    config: ReconcileConfig,
    shutdown: ShutdownHandle,
    semaphore: Arc<Semaphore>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<PluginRegistry>,
        event_bus: Arc<EventBus>,
        config: ReconcileConfig,
        shutdown: ShutdownHandle,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_reconciles));
        Self {
            store,
            registry,
            event_bus,
            config,
            shutdown,
            semaphore,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the poll loop and requeue loop, returning once both have
    /// observed the shutdown signal and exited. Reconcile tasks dispatched
    /// during the run are independent `tokio::spawn`ed tasks, so dropping
    /// this future (e.g. a caller racing it against a shutdown signal)
    /// does not cancel any reconciliation already in flight — call
    /// `wait_for_in_flight` afterward to let them finish.
    pub async fn run(&self) {
        let poll = self.run_poll_loop();
        let requeue = self.run_requeue_loop();
        tokio::join!(poll, requeue);
    }

    /// Awaits every reconcile task spawned during `run()` that hasn't
    /// finished yet. Intended to be called once `run()` has returned (or
    /// been raced away by a shutdown signal) so in-flight reconciles are
    /// allowed to complete and their permits release normally.
    pub async fn wait_for_in_flight(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.in_flight.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn run_poll_loop(&self) {
        let interval = Duration::from_secs(self.config.reconcile_interval_secs);
        loop {
            if self.shutdown.is_shutdown() {
                return;
            }

            let limit = (2 * self.config.max_concurrent_reconciles) as i64;
            match self.store.get_resources_needing_reconciliation(limit).await {
                Ok(batch) => {
                    crate::metrics::set_queue_depth(batch.len());
                    let tasks = batch.into_iter().map(|resource| self.dispatch_one(resource));
                    futures::future::join_all(tasks).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "poll loop: failed to fetch reconciliation batch");
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(POLL_LOOP_ERROR_SLEEP_SECS)) => {}
                        () = self.shutdown.notified() => return,
                    }
                    continue;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                () = self.shutdown.notified() => return,
            }
        }
    }

    async fn run_requeue_loop(&self) {
        let tick = Duration::from_secs(crate::config::DEFAULT_REQUEUE_TICK_SECS);
        let base = Duration::from_secs(self.config.backoff_base_secs);
        let max_delay = Duration::from_secs(self.config.backoff_max_secs);
        let jitter = self.config.backoff_jitter_factor;

        loop {
            if self.shutdown.is_shutdown() {
                return;
            }
            if let Err(e) = self.store.requeue_failed_resources(base, max_delay, jitter).await {
                tracing::error!(error = %e, "requeue loop: failed to update backoff schedule");
            }
            tokio::select! {
                _ = tokio::time::sleep(tick) => {}
                () = self.shutdown.notified() => return,
            }
        }
    }

    /// Acquire a permit and spawn one resource's reconcile task as an
    /// independent task, tracked in `in_flight` so a caller racing `run()`
    /// against a shutdown signal can still wait for it to finish rather
    /// than cancelling it mid-reconcile. An empty `action_plugin` means a
    /// reconciler plugin owns this type; the dispatcher skips it entirely.
    async fn dispatch_one(&self, resource: Resource) {
        if resource.action_plugin.is_empty() {
            return;
        }

        let permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };
        crate::metrics::set_active_permits(
            self.config.max_concurrent_reconciles - self.semaphore.available_permits(),
        );

        let store = self.store.clone();
        let registry = self.registry.clone();
        let event_bus = self.event_bus.clone();
        let semaphore = self.semaphore.clone();
        let max_concurrent = self.config.max_concurrent_reconciles;
        let handle = tokio::spawn(async move {
            run_reconcile_task(store, registry, event_bus, resource).await;
            drop(permit);
            crate::metrics::set_active_permits(max_concurrent - semaphore.available_permits());
        });

        let mut in_flight = self.in_flight.lock().await;
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}

/// The per-resource reconcile task: steps §4.5.3 of the dispatcher design.
/// Never propagates an error — every failure mode ends in a `failed`
/// history row and a `Degraded` condition.
pub async fn run_reconcile_task(
    store: Arc<dyn Store>,
    registry: Arc<PluginRegistry>,
    event_bus: Arc<EventBus>,
    resource: Resource,
) {
    let trigger_reason = classify_trigger(
        resource.last_reconcile_time,
        resource.generation,
        resource.observed_generation,
        resource.status,
    );
    let deleting = resource.status == ResourceStatus::Deleting;
    let started = Instant::now();

    if let Err(e) = store
        .update_resource_status(resource.id, ResourceStatus::Reconciling, Some("Starting reconciliation".into()), None)
        .await
    {
        let err = crate::errors::ReconcileError::from(e);
        tracing::error!(resource_id = %resource.id, error = %err, "failed to mark resource reconciling");
        return;
    }
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_RECONCILING, ConditionStatus::True, "ReconcileStarted", "reconciliation in progress", resource.generation),
        )
        .await;
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_READY, ConditionStatus::Unknown, "Reconciling", "outcome not yet known", resource.generation),
        )
        .await;

    let Some(executor) = registry.get_action_executor(&resource.action_plugin).await else {
        finalize_failure(
            &store,
            &event_bus,
            &resource,
            trigger_reason,
            started,
            format!("no action executor registered for '{}'", resource.action_plugin),
        )
        .await;
        return;
    };

    let plugin_config = merge_plugin_config(
        registry.get_action_executor_config(&resource.action_plugin).await,
        resource.plugin_config.clone(),
    );
    let ctx = ActionContext {
        resource_id: resource.id,
        name: resource.name.clone(),
        generation: resource.generation,
        spec: resource.spec.clone(),
        spec_hash: resource.spec_hash.clone(),
        plugin_config,
    };

    let outcome = run_phases(executor.as_ref(), &ctx, deleting).await;
    let duration = started.elapsed();
    let drift_detected = trigger_reason == TriggerReason::Scheduled && outcome.has_changes;

    if outcome.success {
        if !outcome.outputs.is_empty() {
            let outputs = serde_json::to_value(&outcome.outputs).unwrap_or(serde_json::json!({}));
            let _ = store.update_resource_outputs(resource.id, outputs).await;
        }

        if deleting {
            let _ = store.remove_finalizer(resource.id, &resource.action_plugin).await;
            let remaining = store
                .get_resource(resource.id)
                .await
                .map(|r| r.finalizers)
                .unwrap_or_default();
            if remaining.is_empty() {
                let _ = store.hard_delete_resource(resource.id).await;
            }
            set_deletion_conditions(&store, &resource).await;
        } else {
            let _ = store
                .update_resource_status(resource.id, ResourceStatus::Ready, None, Some(resource.generation))
                .await;
            set_success_conditions(&store, &resource).await;
            event_bus
                .publish(ResourceEvent {
                    kind: EventKind::Reconciled,
                    id: resource.id,
                    name: resource.name.clone(),
                    type_name: resource.resource_type_name.clone(),
                    type_version: resource.resource_type_version.clone(),
                    resource_snapshot: resource.spec.clone(),
                    timestamp: chrono::Utc::now(),
                })
                .await;
        }
        crate::metrics::record_reconciliation_success(&resource.resource_type_name, duration);
    } else {
        let message = outcome.error_message.clone().unwrap_or_else(|| "reconcile failed".into());
        finalize_failure(&store, &event_bus, &resource, trigger_reason, started, message).await;
    }

    let history = ReconciliationHistory {
        id: Uuid::new_v4(),
        resource_id: resource.id,
        generation: resource.generation,
        success: outcome.success,
        phase: outcome.phase.unwrap_or(HistoryPhase::Failed),
        plan_output: outcome.plan_output,
        apply_output: outcome.apply_output,
        error_message: outcome.error_message,
        resources_created: outcome.resources_created,
        resources_updated: outcome.resources_updated,
        resources_deleted: outcome.resources_deleted,
        duration_seconds: duration.as_secs_f64(),
        trigger_reason,
        drift_detected,
        reconcile_time: chrono::Utc::now(),
    };
    if let Err(e) = store.record_reconciliation(history).await {
        tracing::error!(resource_id = %resource.id, error = %e, "failed to record reconciliation history");
    }
}

async fn finalize_failure(
    store: &Arc<dyn Store>,
    event_bus: &Arc<EventBus>,
    resource: &Resource,
    _trigger_reason: TriggerReason,
    started: Instant,
    message: String,
) {
    let _ = store
        .update_resource_status(resource.id, ResourceStatus::Failed, Some(message.clone()), None)
        .await;
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_READY, ConditionStatus::False, "ReconcileFailed", message.clone(), resource.generation),
        )
        .await;
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_RECONCILING, ConditionStatus::False, "ReconcileFailed", "reconciliation ended", resource.generation),
        )
        .await;
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_DEGRADED, ConditionStatus::True, "ReconcileFailed", message, resource.generation),
        )
        .await;
    let _ = event_bus; // reserved for a future FAILED event kind; not part of the published set today.
    crate::metrics::record_reconciliation_failure(&resource.resource_type_name, started.elapsed());
}

async fn set_success_conditions(store: &Arc<dyn Store>, resource: &Resource) {
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_READY, ConditionStatus::True, "ReconcileSuccess", "resource is up to date", resource.generation),
        )
        .await;
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_RECONCILING, ConditionStatus::False, "ReconcileComplete", "reconciliation finished", resource.generation),
        )
        .await;
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_DEGRADED, ConditionStatus::False, "ReconcileSuccess", "no errors", resource.generation),
        )
        .await;
}

async fn set_deletion_conditions(store: &Arc<dyn Store>, resource: &Resource) {
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_RECONCILING, ConditionStatus::False, "DestroyComplete", "destroy phase finished", resource.generation),
        )
        .await;
    let _ = store
        .set_condition(
            resource.id,
            Condition::new(CONDITION_READY, ConditionStatus::False, "Deleting", "resource is being removed", resource.generation),
        )
        .await;
}

fn merge_plugin_config(global: Option<serde_json::Value>, per_resource: serde_json::Value) -> serde_json::Value {
    let mut merged = global.unwrap_or(serde_json::json!({}));
    if let (Some(merged_map), Some(per_resource_map)) = (merged.as_object_mut(), per_resource.as_object()) {
        for (key, value) in per_resource_map {
            merged_map.insert(key.clone(), value.clone());
        }
        return merged;
    }
    per_resource
}
