use super::*;
use crate::store::memory::MemoryStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

struct RecordingReconciler {
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicUsize>,
}

#[async_trait]
impl crate::plugins::ReconcilerPlugin for RecordingReconciler {
    fn name(&self) -> &str {
        "recording"
    }
    fn resource_types(&self) -> Vec<String> {
        vec!["Widget".into()]
    }
    async fn start(&self, ctx: ReconcilerContext) -> anyhow::Result<()> {
        self.started.store(true, Ordering::SeqCst);
        ctx.shutdown.notified().await;
        Ok(())
    }
    async fn stop(&self) -> anyhow::Result<()> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

use crate::plugins::ReconcilerContext;

#[tokio::test]
async fn spawned_plugin_starts_and_stops_cleanly_on_shutdown() {
    let registry = Arc::new(PluginRegistry::new());
    let started = Arc::new(AtomicBool::new(false));
    let stopped = Arc::new(AtomicUsize::new(0));
    let plugin = Arc::new(RecordingReconciler {
        started: started.clone(),
        stopped: stopped.clone(),
    });
    registry.register_reconciler_plugin(plugin).await.unwrap();

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let shutdown = ShutdownHandle::new();
    let mut host = ReconcilerHost::new(registry, store, shutdown);
    host.spawn_all().await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(started.load(Ordering::SeqCst));

    host.shutdown().await;
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn host_with_no_plugins_shuts_down_immediately() {
    let registry = Arc::new(PluginRegistry::new());
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let shutdown = ShutdownHandle::new();
    let mut host = ReconcilerHost::new(registry, store, shutdown);
    host.spawn_all().await;
    host.shutdown().await;
}
