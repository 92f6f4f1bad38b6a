// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Runs every registered [`ReconcilerPlugin`] in its own task, alongside the
//! dispatcher, and coordinates their shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::plugins::{PluginRegistry, ReconcilerContext};
use crate::shutdown::ShutdownHandle;
use crate::store::Store;

/// Grace period given to a reconciler's `stop()` before its task is
/// abandoned and the host moves on.
const STOP_TIMEOUT_SECS: u64 = 30;

struct RunningPlugin {
    name: String,
    handle: JoinHandle<()>,
}

/// Owns the lifetime of every reconciler plugin task. Built once at startup
/// from whichever plugins were registered, then run until shutdown.
pub struct ReconcilerHost {
    registry: Arc<PluginRegistry>,
    store: Arc<dyn Store>,
    shutdown: ShutdownHandle,
    running: Vec<RunningPlugin>,
}

impl ReconcilerHost {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>, store: Arc<dyn Store>, shutdown: ShutdownHandle) -> Self {
        Self {
            registry,
            store,
            shutdown,
            running: Vec::new(),
        }
    }

    /// Spawn a task per registered plugin. A plugin whose `start` returns an
    /// error is logged and dropped; it never brings down the others.
    pub async fn spawn_all(&mut self) {
        for name in self.registry.list_reconciler_plugins().await {
            let Some(plugin) = self.registry.get_reconciler_plugin(&name).await else {
                continue;
            };
            let ctx = ReconcilerContext::new(self.store.clone(), self.registry.clone(), self.shutdown.clone());
            let plugin_name = name.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = plugin.start(ctx).await {
                    tracing::error!(reconciler = %plugin_name, error = %e, "reconciler plugin exited with an error");
                }
            });
            self.running.push(RunningPlugin { name, handle });
        }
    }

    /// Signal shutdown, ask each plugin to `stop()` within a grace period,
    /// then wait for its task to finish (or abandon it past the timeout).
    pub async fn shutdown(mut self) {
        self.shutdown.signal();

        for name in self.registry.list_reconciler_plugins().await {
            let Some(plugin) = self.registry.get_reconciler_plugin(&name).await else {
                continue;
            };
            let stop = tokio::time::timeout(Duration::from_secs(STOP_TIMEOUT_SECS), plugin.stop());
            match stop.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(reconciler = %name, error = %e, "reconciler plugin stop() failed"),
                Err(_) => tracing::warn!(reconciler = %name, "reconciler plugin stop() timed out"),
            }
        }

        for running in self.running.drain(..) {
            let mut handle = running.handle;
            let wait = tokio::time::timeout(Duration::from_secs(STOP_TIMEOUT_SECS), &mut handle);
            if wait.await.is_err() {
                handle.abort();
                tracing::warn!(reconciler = %running.name, "reconciler task did not exit within the shutdown grace period, aborting");
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_host_tests.rs"]
mod reconciler_host_tests;
