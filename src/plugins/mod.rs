// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Typed catalog of action executors, input sources, and reconciler
//! plugins, plus the resource-type → reconciler claim table.

pub mod action_executor;
pub mod input_source;
pub mod reconciler_plugin;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

pub use action_executor::{ActionContext, ActionExecutor, ApplyResult, DriftReport, PlanResult, Workspace};
pub use input_source::{InputEvent, InputEventCallback, InputEventType, InputSource};
pub use reconciler_plugin::{ReconcilerContext, ReconcilerPlugin, ReconcilerPluginFactory};

struct ActionExecutorEntry {
    executor: Arc<dyn ActionExecutor>,
    config: Value,
}

struct InputSourceEntry {
    source: Arc<dyn InputSource>,
    config: Value,
}

/// Process-lifetime registry of plugin instances. Registration failures
/// (a conflicting reconciler claim, a duplicate discovery) are reported to
/// the caller but never panic; the entry point decides whether to log and
/// skip or abort startup.
#[derive(Default)]
pub struct PluginRegistry {
    action_executors: RwLock<HashMap<String, ActionExecutorEntry>>,
    input_sources: RwLock<HashMap<String, InputSourceEntry>>,
    reconciler_plugins: RwLock<HashMap<String, Arc<dyn ReconcilerPlugin>>>,
    resource_type_claims: RwLock<HashMap<String, String>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_action_executor(&self, executor: Arc<dyn ActionExecutor>, config: Value) {
        let name = executor.name().to_string();
        self.action_executors
            .write()
            .await
            .insert(name, ActionExecutorEntry { executor, config });
    }

    pub async fn get_action_executor(&self, name: &str) -> Option<Arc<dyn ActionExecutor>> {
        self.action_executors
            .read()
            .await
            .get(name)
            .map(|e| e.executor.clone())
    }

    pub async fn get_action_executor_config(&self, name: &str) -> Option<Value> {
        self.action_executors
            .read()
            .await
            .get(name)
            .map(|e| e.config.clone())
    }

    pub async fn get_action_executor_info(&self, name: &str) -> Option<(String, String)> {
        self.action_executors
            .read()
            .await
            .get(name)
            .map(|e| (e.executor.name().to_string(), e.executor.version().to_string()))
    }

    pub async fn list_action_executors(&self) -> Vec<String> {
        self.action_executors.read().await.keys().cloned().collect()
    }

    pub async fn has_action_executor(&self, name: &str) -> bool {
        self.action_executors.read().await.contains_key(name)
    }

    pub async fn register_input_source(&self, source: Arc<dyn InputSource>, config: Value) {
        let name = source.name().to_string();
        self.input_sources
            .write()
            .await
            .insert(name, InputSourceEntry { source, config });
    }

    pub async fn get_input_source(&self, name: &str) -> Option<Arc<dyn InputSource>> {
        self.input_sources.read().await.get(name).map(|e| e.source.clone())
    }

    pub async fn get_input_source_config(&self, name: &str) -> Option<Value> {
        self.input_sources.read().await.get(name).map(|e| e.config.clone())
    }

    pub async fn list_input_sources(&self) -> Vec<String> {
        self.input_sources.read().await.keys().cloned().collect()
    }

    pub async fn has_input_source(&self, name: &str) -> bool {
        self.input_sources.read().await.contains_key(name)
    }

    /// Register a reconciler plugin, claiming every resource type it
    /// declares. Fails without registering anything if any claimed type is
    /// already owned by a different reconciler.
    pub async fn register_reconciler_plugin(
        &self,
        plugin: Arc<dyn ReconcilerPlugin>,
    ) -> Result<(), String> {
        let name = plugin.name().to_string();
        let types = plugin.resource_types();

        let mut claims = self.resource_type_claims.write().await;
        for resource_type in &types {
            if let Some(owner) = claims.get(resource_type) {
                if owner != &name {
                    return Err(format!(
                        "resource type '{resource_type}' already claimed by reconciler '{owner}'"
                    ));
                }
            }
        }
        for resource_type in &types {
            claims.insert(resource_type.clone(), name.clone());
        }
        drop(claims);

        self.reconciler_plugins.write().await.insert(name, plugin);
        Ok(())
    }

    pub async fn get_reconciler_plugin(&self, name: &str) -> Option<Arc<dyn ReconcilerPlugin>> {
        self.reconciler_plugins.read().await.get(name).cloned()
    }

    pub async fn list_reconciler_plugins(&self) -> Vec<String> {
        self.reconciler_plugins.read().await.keys().cloned().collect()
    }

    pub async fn has_reconciler_plugin(&self, name: &str) -> bool {
        self.reconciler_plugins.read().await.contains_key(name)
    }

    pub async fn has_reconciler_for_resource_type(&self, resource_type_name: &str) -> bool {
        self.resource_type_claims.read().await.contains_key(resource_type_name)
    }

    pub async fn get_reconciler_for_resource_type(
        &self,
        resource_type_name: &str,
    ) -> Option<Arc<dyn ReconcilerPlugin>> {
        let owner = self
            .resource_type_claims
            .read()
            .await
            .get(resource_type_name)
            .cloned()?;
        self.get_reconciler_plugin(&owner).await
    }

    /// Builds and registers one plugin per `(factory, config)` pair. A
    /// single factory failing to build, or a claim conflict during
    /// registration, is logged and skipped rather than aborting the rest
    /// of discovery; the names of every plugin that registered
    /// successfully are returned.
    pub async fn discover_reconciler_plugins(
        &self,
        factories: Vec<(Arc<dyn ReconcilerPluginFactory>, Value)>,
    ) -> Vec<String> {
        let mut registered = Vec::new();
        for (factory, config) in factories {
            let plugin = match factory.build(&config) {
                Ok(plugin) => plugin,
                Err(error) => {
                    tracing::warn!(factory = factory.factory_name(), %error, "reconciler plugin factory failed to build");
                    continue;
                }
            };
            let name = plugin.name().to_string();
            if let Err(error) = self.register_reconciler_plugin(plugin).await {
                tracing::warn!(factory = factory.factory_name(), %error, "reconciler plugin discovery skipped a plugin");
                continue;
            }
            registered.push(name);
        }
        registered
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
