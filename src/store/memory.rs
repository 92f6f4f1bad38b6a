// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! An in-memory [`Store`] implementation used by tests in place of a real
//! Postgres connection. Implements the same priority-query and finalizer
//! semantics the production store guarantees.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::dispatcher::requeue::compute_backoff_delay;
use crate::errors::StoreError;
use crate::model::{
    spec_hash, AdmissionWebhook, Condition, ReconciliationHistory, Resource, ResourceStatus, ResourceType,
};

use super::{NewResource, NewResourceType, ResourceFilter, ResourceTypeUpdate, ResourceUpdate, Store};

#[derive(Default)]
struct Inner {
    resources: HashMap<Uuid, Resource>,
    resource_types: HashMap<(String, String), ResourceType>,
    history: Vec<ReconciliationHistory>,
    conditions: HashMap<Uuid, Vec<Condition>>,
    webhooks: HashMap<String, AdmissionWebhook>,
}

/// A test double backed by a `Mutex<Inner>`, not meant for production load
/// but faithful to every invariant the production store enforces.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_resource(&self, input: NewResource) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let finalizers = if input.finalizers.is_empty() {
            vec![input.action_plugin.clone()]
        } else {
            input.finalizers
        };
        let resource = Resource {
            id,
            name: input.name,
            resource_type_name: input.resource_type_name,
            resource_type_version: input.resource_type_version,
            spec_hash: spec_hash(&input.spec),
            spec: input.spec,
            plugin_config: input.plugin_config,
            metadata: input.metadata,
            outputs: serde_json::json!({}),
            action_plugin: input.action_plugin,
            status: ResourceStatus::Pending,
            status_message: None,
            generation: 1,
            observed_generation: 0,
            retry_count: 0,
            last_reconcile_time: None,
            next_reconcile_time: Some(now),
            deleted_at: None,
            finalizers,
            created_at: now,
            updated_at: now,
        };
        inner.resources.insert(id, resource);
        Ok(id)
    }

    async fn get_resource(&self, id: Uuid) -> Result<Resource, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .resources
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_resources(&self, filter: ResourceFilter) -> Result<Vec<Resource>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .resources
            .values()
            .filter(|r| filter.include_deleted || r.deleted_at.is_none())
            .filter(|r| filter.resource_type_name.as_deref().is_none_or(|n| n == r.resource_type_name))
            .filter(|r| filter.resource_type_version.as_deref().is_none_or(|v| v == r.resource_type_version))
            .filter(|r| filter.status.is_none_or(|s| s == r.status))
            .cloned()
            .collect())
    }

    async fn update_resource(&self, id: Uuid, update: ResourceUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resource = inner.resources.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(spec) = update.spec {
            resource.spec_hash = spec_hash(&spec);
            resource.spec = spec;
        }
        if let Some(plugin_config) = update.plugin_config {
            resource.plugin_config = plugin_config;
        }
        resource.generation += 1;
        resource.status = ResourceStatus::Pending;
        resource.next_reconcile_time = Some(Utc::now());
        resource.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resource = inner.resources.get_mut(&id).ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        resource.status = ResourceStatus::Deleting;
        resource.deleted_at = Some(now);
        resource.next_reconcile_time = Some(now);
        resource.updated_at = now;
        Ok(())
    }

    async fn hard_delete_resource(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let eligible = inner
            .resources
            .get(&id)
            .map(Resource::eligible_for_hard_delete)
            .unwrap_or(false);
        if eligible {
            inner.resources.remove(&id);
            inner.conditions.remove(&id);
        }
        Ok(eligible)
    }

    async fn add_finalizer(&self, id: Uuid, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resource = inner.resources.get_mut(&id).ok_or(StoreError::NotFound)?;
        resource.add_finalizer(key);
        resource.updated_at = Utc::now();
        Ok(())
    }

    async fn remove_finalizer(&self, id: Uuid, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resource = inner.resources.get_mut(&id).ok_or(StoreError::NotFound)?;
        resource.remove_finalizer(key);
        resource.updated_at = Utc::now();
        Ok(())
    }

    async fn update_resource_status(
        &self,
        id: Uuid,
        status: ResourceStatus,
        message: Option<String>,
        observed_generation: Option<i64>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resource = inner.resources.get_mut(&id).ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        resource.status = status;
        resource.status_message = message;
        if let Some(generation) = observed_generation {
            resource.observed_generation = generation;
        }
        match status {
            ResourceStatus::Ready => {
                resource.last_reconcile_time = Some(now);
                resource.retry_count = 0;
                resource.next_reconcile_time = Some(now + chrono::Duration::seconds(crate::config::READY_REQUEUE_SECS));
            }
            ResourceStatus::Failed => {
                resource.last_reconcile_time = Some(now);
                resource.retry_count += 1;
            }
            _ => {}
        }
        resource.updated_at = now;
        Ok(())
    }

    async fn update_resource_outputs(&self, id: Uuid, outputs: serde_json::Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resource = inner.resources.get_mut(&id).ok_or(StoreError::NotFound)?;
        resource.outputs = outputs;
        resource.updated_at = Utc::now();
        Ok(())
    }

    async fn get_resources_needing_reconciliation(&self, limit: i64) -> Result<Vec<Resource>, StoreError> {
        self.get_resources_needing_reconciliation_by_type(&[], limit).await
    }

    async fn get_resources_needing_reconciliation_by_type(
        &self,
        resource_type_names: &[String],
        limit: i64,
    ) -> Result<Vec<Resource>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let mut batch: Vec<Resource> = inner
            .resources
            .values()
            .filter(|r| resource_type_names.is_empty() || resource_type_names.contains(&r.resource_type_name))
            .filter(|r| r.deleted_at.is_none() || r.status == ResourceStatus::Deleting)
            .filter(|r| r.status != ResourceStatus::Reconciling)
            .filter(|r| {
                r.last_reconcile_time.is_none()
                    || r.generation > r.observed_generation
                    || r.next_reconcile_time.is_some_and(|t| t <= now)
                    || r.status == ResourceStatus::Deleting
            })
            .cloned()
            .collect();

        batch.sort_by(|a, b| {
            a.status
                .priority_bucket()
                .cmp(&b.status.priority_bucket())
                .then_with(|| match (a.next_reconcile_time, b.next_reconcile_time) {
                    (None, None) => std::cmp::Ordering::Equal,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (Some(a), Some(b)) => a.cmp(&b),
                })
        });
        batch.truncate(limit.max(0) as usize);
        Ok(batch)
    }

    async fn requeue_failed_resources(
        &self,
        base: std::time::Duration,
        max_delay: std::time::Duration,
        jitter: f64,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let mut updated = 0u64;
        for resource in inner.resources.values_mut() {
            if resource.status != ResourceStatus::Failed {
                continue;
            }
            let due = resource.next_reconcile_time.is_none_or(|t| t < now);
            if !due {
                continue;
            }
            let delay = compute_backoff_delay(resource.retry_count, base, max_delay, jitter);
            resource.next_reconcile_time = Some(now + chrono::Duration::from_std(delay).unwrap_or_default());
            resource.updated_at = now;
            updated += 1;
        }
        Ok(updated)
    }

    async fn record_reconciliation(&self, history: ReconciliationHistory) -> Result<(), StoreError> {
        self.inner.lock().unwrap().history.push(history);
        Ok(())
    }

    async fn list_history(&self, resource_id: Uuid) -> Result<Vec<ReconciliationHistory>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|h| h.resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn set_condition(&self, resource_id: Uuid, condition: Condition) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let conditions = inner.conditions.entry(resource_id).or_default();
        if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
            if condition.differs_from(existing) {
                *existing = condition;
            }
        } else {
            conditions.push(condition);
        }
        Ok(())
    }

    async fn get_conditions(&self, resource_id: Uuid) -> Result<Vec<Condition>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .conditions
            .get(&resource_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_resource_type(&self, input: NewResourceType) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (input.name.clone(), input.version.clone());
        if inner.resource_types.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "resource type {}/{} already exists",
                input.name, input.version
            )));
        }
        let id = Uuid::new_v4();
        let now = Utc::now();
        inner.resource_types.insert(
            key,
            ResourceType {
                id,
                name: input.name,
                version: input.version,
                schema: input.schema,
                description: input.description,
                status: crate::model::ResourceTypeStatus::Active,
                metadata: input.metadata,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn get_resource_type(&self, name: &str, version: &str) -> Result<ResourceType, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .resource_types
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_resource_type(&self, name: &str, version: &str, update: ResourceTypeUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resource_type = inner
            .resource_types
            .get_mut(&(name.to_string(), version.to_string()))
            .ok_or(StoreError::NotFound)?;
        if let Some(schema) = update.schema {
            resource_type.schema = schema;
        }
        if let Some(description) = update.description {
            resource_type.description = Some(description);
        }
        if let Some(status) = update.status {
            resource_type.status = status;
        }
        if let Some(metadata) = update.metadata {
            resource_type.metadata = metadata;
        }
        resource_type.updated_at = Utc::now();
        Ok(())
    }

    async fn list_resource_types(&self) -> Result<Vec<ResourceType>, StoreError> {
        Ok(self.inner.lock().unwrap().resource_types.values().cloned().collect())
    }

    async fn delete_resource_type(&self, name: &str, version: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let referenced = inner
            .resources
            .values()
            .any(|r| r.resource_type_name == name && r.resource_type_version == version);
        if referenced {
            return Err(StoreError::Conflict(format!(
                "resource type {name}/{version} is still referenced by resources"
            )));
        }
        inner
            .resource_types
            .remove(&(name.to_string(), version.to_string()))
            .ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn register_webhook(&self, webhook: AdmissionWebhook) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.webhooks.contains_key(&webhook.name) {
            return Err(StoreError::Conflict(format!(
                "webhook '{}' already registered",
                webhook.name
            )));
        }
        let id = webhook.id;
        inner.webhooks.insert(webhook.name.clone(), webhook);
        Ok(id)
    }

    async fn get_webhook(&self, name: &str) -> Result<AdmissionWebhook, StoreError> {
        self.inner.lock().unwrap().webhooks.get(name).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_webhooks(&self) -> Result<Vec<AdmissionWebhook>, StoreError> {
        Ok(self.inner.lock().unwrap().webhooks.values().cloned().collect())
    }

    async fn delete_webhook(&self, name: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .webhooks
            .remove(name)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
