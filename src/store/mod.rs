// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The durable resource/type/history/webhook store.
//!
//! [`Store`] is the single authoritative owner of every entity in
//! [`crate::model`]. Two implementations exist: [`postgres::PostgresStore`]
//! for production use, and [`memory::MemoryStore`] as a test double that
//! implements the same priority-query and finalizer semantics without a
//! database.

pub mod memory;
pub mod migrations;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::model::{AdmissionWebhook, Condition, ReconciliationHistory, Resource, ResourceStatus, ResourceType};

/// Inputs to `create_resource`. Bundled rather than passed positionally
/// since most fields are optional/defaulted.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub name: String,
    pub resource_type_name: String,
    pub resource_type_version: String,
    pub action_plugin: String,
    pub spec: serde_json::Value,
    pub plugin_config: serde_json::Value,
    pub metadata: std::collections::BTreeMap<String, String>,
    pub finalizers: Vec<String>,
}

/// Inputs to `update_resource`: any subset of `spec`/`plugin_config` may be
/// given; omitted fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    pub spec: Option<serde_json::Value>,
    pub plugin_config: Option<serde_json::Value>,
}

/// Inputs to `create_resource_type`.
#[derive(Debug, Clone)]
pub struct NewResourceType {
    pub name: String,
    pub version: String,
    pub schema: serde_json::Value,
    pub description: Option<String>,
    pub metadata: std::collections::BTreeMap<String, String>,
}

/// Inputs to `update_resource_type`: any subset may be given; omitted
/// fields are left unchanged. `(name, version)` is immutable, so it is not
/// part of this struct.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeUpdate {
    pub schema: Option<serde_json::Value>,
    pub description: Option<String>,
    pub status: Option<crate::model::ResourceTypeStatus>,
    pub metadata: Option<std::collections::BTreeMap<String, String>>,
}

/// Optional filters for `list_resources`. `None` on a field means "don't
/// filter on it"; all given fields are ANDed together.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub resource_type_name: Option<String>,
    pub resource_type_version: Option<String>,
    pub status: Option<ResourceStatus>,
    pub include_deleted: bool,
}

/// Every durable operation the rest of the crate needs. Implementations
/// must uphold the invariants in the data model: `observed_generation ≤
/// generation`, `spec_hash` always matches `spec`, hard-delete only when
/// soft-deleted with no finalizers remaining, and so on — callers rely on
/// the store enforcing these rather than re-checking them.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_resource(&self, input: NewResource) -> Result<Uuid, StoreError>;
    async fn get_resource(&self, id: Uuid) -> Result<Resource, StoreError>;
    async fn list_resources(&self, filter: ResourceFilter) -> Result<Vec<Resource>, StoreError>;
    async fn update_resource(&self, id: Uuid, update: ResourceUpdate) -> Result<(), StoreError>;
    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError>;
    async fn hard_delete_resource(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn add_finalizer(&self, id: Uuid, key: &str) -> Result<(), StoreError>;
    async fn remove_finalizer(&self, id: Uuid, key: &str) -> Result<(), StoreError>;

    async fn update_resource_status(
        &self,
        id: Uuid,
        status: ResourceStatus,
        message: Option<String>,
        observed_generation: Option<i64>,
    ) -> Result<(), StoreError>;

    async fn update_resource_outputs(
        &self,
        id: Uuid,
        outputs: serde_json::Value,
    ) -> Result<(), StoreError>;

    async fn get_resources_needing_reconciliation(&self, limit: i64) -> Result<Vec<Resource>, StoreError>;

    /// Same priority query as `get_resources_needing_reconciliation`, but
    /// restricted to the given resource types. An empty slice means "every
    /// type", matching the unfiltered query. Used by reconciler plugins,
    /// which must only ever see resources of types they've claimed.
    async fn get_resources_needing_reconciliation_by_type(
        &self,
        resource_type_names: &[String],
        limit: i64,
    ) -> Result<Vec<Resource>, StoreError>;

    /// Recomputes `next_reconcile_time` for every failed row whose
    /// `next_reconcile_time` is already due. Returns the number of rows
    /// updated.
    async fn requeue_failed_resources(
        &self,
        base: std::time::Duration,
        max_delay: std::time::Duration,
        jitter: f64,
    ) -> Result<u64, StoreError>;

    async fn record_reconciliation(&self, history: ReconciliationHistory) -> Result<(), StoreError>;
    async fn list_history(&self, resource_id: Uuid) -> Result<Vec<ReconciliationHistory>, StoreError>;

    async fn set_condition(&self, resource_id: Uuid, condition: Condition) -> Result<(), StoreError>;
    async fn get_conditions(&self, resource_id: Uuid) -> Result<Vec<Condition>, StoreError>;

    async fn create_resource_type(&self, input: NewResourceType) -> Result<Uuid, StoreError>;
    async fn get_resource_type(&self, name: &str, version: &str) -> Result<ResourceType, StoreError>;
    async fn update_resource_type(&self, name: &str, version: &str, update: ResourceTypeUpdate) -> Result<(), StoreError>;
    async fn list_resource_types(&self) -> Result<Vec<ResourceType>, StoreError>;
    async fn delete_resource_type(&self, name: &str, version: &str) -> Result<(), StoreError>;

    async fn register_webhook(&self, webhook: AdmissionWebhook) -> Result<Uuid, StoreError>;
    async fn get_webhook(&self, name: &str) -> Result<AdmissionWebhook, StoreError>;
    async fn list_webhooks(&self) -> Result<Vec<AdmissionWebhook>, StoreError>;
    async fn delete_webhook(&self, name: &str) -> Result<(), StoreError>;
}
