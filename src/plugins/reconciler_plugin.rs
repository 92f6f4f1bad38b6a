// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Reconciler plugins own their own reconcile loop over a claimed subset of
//! resource types, running alongside the dispatcher rather than through it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::model::Resource;
use crate::shutdown::ShutdownHandle;
use crate::store::Store;

use super::PluginRegistry;

/// What a reconciler plugin's loop is given: the shared store, the registry
/// (so it can look up executors if it needs them), and the shutdown signal
/// it must observe at every iteration head.
#[derive(Clone)]
pub struct ReconcilerContext {
    pub store: Arc<dyn Store>,
    pub registry: Arc<PluginRegistry>,
    pub shutdown: ShutdownHandle,
}

impl ReconcilerContext {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, registry: Arc<PluginRegistry>, shutdown: ShutdownHandle) -> Self {
        Self {
            store,
            registry,
            shutdown,
        }
    }

    /// Resources needing reconciliation, restricted to `resource_type_names`.
    /// A reconciler must always call this with its own `resource_types()`
    /// rather than reach through `store` directly, or it would see every
    /// resource of every type in the system instead of only the ones it owns.
    pub async fn get_resources_needing_reconciliation(
        &self,
        resource_type_names: &[String],
        limit: i64,
    ) -> Result<Vec<Resource>, StoreError> {
        self.store
            .get_resources_needing_reconciliation_by_type(resource_type_names, limit)
            .await
    }
}

/// A third-party reconciler that claims one or more resource types and runs
/// its own loop until `stop` is called or the shutdown signal fires.
#[async_trait]
pub trait ReconcilerPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Resource type names this reconciler claims. Each type may be claimed
    /// by at most one registered reconciler.
    fn resource_types(&self) -> Vec<String>;

    async fn start(&self, ctx: ReconcilerContext) -> anyhow::Result<()>;

    async fn stop(&self) -> anyhow::Result<()>;
}

/// Builds one `ReconcilerPlugin` instance from its configured settings.
/// The well-known extension-point group is this trait rather than OS-level
/// plugin loading: a process embeds its own `Vec<Box<dyn
/// ReconcilerPluginFactory>>` at startup and hands it to
/// [`super::PluginRegistry::discover_reconciler_plugins`].
pub trait ReconcilerPluginFactory: Send + Sync {
    /// Name used only for error messages if construction fails.
    fn factory_name(&self) -> &str;

    fn build(&self, config: &serde_json::Value) -> anyhow::Result<Arc<dyn ReconcilerPlugin>>;
}

#[cfg(test)]
#[path = "reconciler_plugin_tests.rs"]
mod reconciler_plugin_tests;
