// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! `ControllerApi`: a thin invariant-preserving facade over [`Store`] for
//! finalizer management and condition/status transitions. Every mutation
//! here also publishes the corresponding [`ResourceEvent`] so callers never
//! have to remember to do both.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::ControllerError;
use crate::event_bus::{EventBus, EventKind, ResourceEvent};
use crate::model::{Condition, ConditionStatus, CONDITION_DEGRADED, CONDITION_READY, CONDITION_RECONCILING};
use crate::store::Store;

/// Wraps a `Store` and an `EventBus` so callers touch one object instead of
/// remembering to keep the two in sync by hand.
pub struct ControllerApi {
    store: Arc<dyn Store>,
    event_bus: Arc<EventBus>,
}

impl ControllerApi {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, event_bus: Arc<EventBus>) -> Self {
        Self { store, event_bus }
    }

    /// Add `key` as a finalizer on the resource, idempotently.
    pub async fn ensure_finalizer(&self, resource_id: Uuid, key: &str) -> Result<(), ControllerError> {
        self.store.add_finalizer(resource_id, key).await?;
        self.publish_modified(resource_id).await;
        Ok(())
    }

    /// Remove `key` from the resource's finalizers, then hard-delete the row
    /// if it is soft-deleted and no finalizers remain. Returns whether the
    /// hard delete happened.
    pub async fn remove_finalizer_and_maybe_hard_delete(
        &self,
        resource_id: Uuid,
        key: &str,
    ) -> Result<bool, ControllerError> {
        self.store.remove_finalizer(resource_id, key).await?;
        let resource = self.store.get_resource(resource_id).await?;
        if !resource.eligible_for_hard_delete() {
            self.publish_modified(resource_id).await;
            return Ok(false);
        }

        let deleted = self.store.hard_delete_resource(resource_id).await?;
        if deleted {
            self.event_bus
                .publish(ResourceEvent {
                    kind: EventKind::Deleted,
                    id: resource.id,
                    name: resource.name,
                    type_name: resource.resource_type_name,
                    type_version: resource.resource_type_version,
                    resource_snapshot: resource.spec,
                    timestamp: chrono::Utc::now(),
                })
                .await;
        }
        Ok(deleted)
    }

    /// Upsert an arbitrary condition by `type`, then publish a `MODIFIED`
    /// event.
    pub async fn set_condition(&self, resource_id: Uuid, condition: Condition) -> Result<(), ControllerError> {
        self.store.set_condition(resource_id, condition).await?;
        self.publish_modified(resource_id).await;
        Ok(())
    }

    pub async fn set_ready(
        &self,
        resource_id: Uuid,
        reason: impl Into<String>,
        message: impl Into<String>,
        observed_generation: i64,
    ) -> Result<(), ControllerError> {
        self.set_condition(
            resource_id,
            Condition::new(CONDITION_READY, ConditionStatus::True, reason, message, observed_generation),
        )
        .await
    }

    pub async fn set_degraded(
        &self,
        resource_id: Uuid,
        reason: impl Into<String>,
        message: impl Into<String>,
        observed_generation: i64,
    ) -> Result<(), ControllerError> {
        self.set_condition(
            resource_id,
            Condition::new(CONDITION_DEGRADED, ConditionStatus::True, reason, message, observed_generation),
        )
        .await
    }

    pub async fn set_reconciling(
        &self,
        resource_id: Uuid,
        reason: impl Into<String>,
        message: impl Into<String>,
        observed_generation: i64,
    ) -> Result<(), ControllerError> {
        self.set_condition(
            resource_id,
            Condition::new(CONDITION_RECONCILING, ConditionStatus::True, reason, message, observed_generation),
        )
        .await
    }

    async fn publish_modified(&self, resource_id: Uuid) {
        let Ok(resource) = self.store.get_resource(resource_id).await else {
            return;
        };
        self.event_bus
            .publish(ResourceEvent {
                kind: EventKind::Modified,
                id: resource.id,
                name: resource.name,
                type_name: resource.resource_type_name,
                type_version: resource.resource_type_version,
                resource_snapshot: resource.spec,
                timestamp: chrono::Utc::now(),
            })
            .await;
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
