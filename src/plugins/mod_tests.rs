use super::*;
use crate::plugins::action_executor::{ActionContext, ApplyResult, DriftReport, PlanResult, Workspace};
use async_trait::async_trait;
use std::collections::BTreeMap;

struct StubWorkspace;
impl Workspace for StubWorkspace {}

struct StubExecutor(&'static str);

#[async_trait]
impl ActionExecutor for StubExecutor {
    fn name(&self) -> &str {
        self.0
    }
    fn version(&self) -> &str {
        "0.1.0"
    }
    async fn initialize(&self, _config: &Value) -> anyhow::Result<()> {
        Ok(())
    }
    async fn prepare(&self, _ctx: &ActionContext) -> anyhow::Result<Box<dyn Workspace>> {
        Ok(Box::new(StubWorkspace))
    }
    async fn plan(&self, _ctx: &ActionContext, _ws: &dyn Workspace) -> anyhow::Result<PlanResult> {
        Ok(PlanResult {
            success: true,
            has_changes: false,
            plan_output: None,
            error_message: None,
        })
    }
    async fn apply(&self, _ctx: &ActionContext, _ws: &dyn Workspace) -> anyhow::Result<ApplyResult> {
        Ok(ApplyResult::default())
    }
    async fn destroy(&self, _ctx: &ActionContext, _ws: &dyn Workspace) -> anyhow::Result<ApplyResult> {
        Ok(ApplyResult::default())
    }
    async fn get_outputs(&self, _ctx: &ActionContext) -> anyhow::Result<BTreeMap<String, Value>> {
        Ok(BTreeMap::new())
    }
    async fn get_state(&self, _ctx: &ActionContext) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }
    async fn cleanup(&self, _ws: &dyn Workspace) -> anyhow::Result<()> {
        Ok(())
    }
}

struct StubReconciler(&'static str, Vec<String>);

#[async_trait]
impl ReconcilerPlugin for StubReconciler {
    fn name(&self) -> &str {
        self.0
    }
    fn resource_types(&self) -> Vec<String> {
        self.1.clone()
    }
    async fn start(&self, _ctx: ReconcilerContext) -> anyhow::Result<()> {
        Ok(())
    }
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn register_and_fetch_action_executor() {
    let registry = PluginRegistry::new();
    registry
        .register_action_executor(Arc::new(StubExecutor("noop_success")), serde_json::json!({"x": 1}))
        .await;

    assert!(registry.has_action_executor("noop_success").await);
    assert!(!registry.has_action_executor("missing").await);
    let fetched = registry.get_action_executor("noop_success").await.unwrap();
    assert_eq!(fetched.name(), "noop_success");
    assert_eq!(
        registry.get_action_executor_config("noop_success").await,
        Some(serde_json::json!({"x": 1}))
    );
    assert_eq!(
        registry.get_action_executor_info("noop_success").await,
        Some(("noop_success".to_string(), "0.1.0".to_string()))
    );
    assert_eq!(registry.list_action_executors().await, vec!["noop_success".to_string()]);
}

#[tokio::test]
async fn reconciler_claims_its_resource_types() {
    let registry = PluginRegistry::new();
    let reconciler = Arc::new(StubReconciler("workflows", vec!["GitHubWorkflow".into()]));
    registry.register_reconciler_plugin(reconciler).await.unwrap();

    assert!(registry.has_reconciler_for_resource_type("GitHubWorkflow").await);
    assert!(!registry.has_reconciler_for_resource_type("Database").await);
    let owner = registry
        .get_reconciler_for_resource_type("GitHubWorkflow")
        .await
        .unwrap();
    assert_eq!(owner.name(), "workflows");
}

#[tokio::test]
async fn conflicting_resource_type_claim_is_rejected() {
    let registry = PluginRegistry::new();
    let first = Arc::new(StubReconciler("a", vec!["Database".into()]));
    let second = Arc::new(StubReconciler("b", vec!["Database".into()]));

    registry.register_reconciler_plugin(first).await.unwrap();
    let result = registry.register_reconciler_plugin(second).await;

    assert!(result.is_err());
    assert!(!registry.has_reconciler_plugin("b").await);
}

#[tokio::test]
async fn same_reconciler_may_reclaim_its_own_types() {
    let registry = PluginRegistry::new();
    let reconciler = Arc::new(StubReconciler("a", vec!["Database".into(), "Queue".into()]));
    registry.register_reconciler_plugin(reconciler.clone()).await.unwrap();
    // Re-registering the same name with overlapping types is not a conflict.
    registry.register_reconciler_plugin(reconciler).await.unwrap();
}

struct StubFactory(&'static str, &'static str);

impl ReconcilerPluginFactory for StubFactory {
    fn factory_name(&self) -> &str {
        self.0
    }
    fn build(&self, _config: &Value) -> anyhow::Result<Arc<dyn ReconcilerPlugin>> {
        Ok(Arc::new(StubReconciler(self.1, vec![self.1.to_string()])))
    }
}

struct FailingFactory;

impl ReconcilerPluginFactory for FailingFactory {
    fn factory_name(&self) -> &str {
        "failing"
    }
    fn build(&self, _config: &Value) -> anyhow::Result<Arc<dyn ReconcilerPlugin>> {
        anyhow::bail!("construction failed")
    }
}

#[tokio::test]
async fn discovery_registers_every_buildable_factory() {
    let registry = PluginRegistry::new();
    let factories: Vec<(Arc<dyn ReconcilerPluginFactory>, Value)> = vec![
        (Arc::new(StubFactory("f1", "workflows")), serde_json::json!({})),
        (Arc::new(StubFactory("f2", "databases")), serde_json::json!({})),
    ];

    let registered = registry.discover_reconciler_plugins(factories).await;

    assert_eq!(registered.len(), 2);
    assert!(registry.has_reconciler_plugin("workflows").await);
    assert!(registry.has_reconciler_plugin("databases").await);
}

#[tokio::test]
async fn discovery_skips_a_factory_that_fails_to_build() {
    let registry = PluginRegistry::new();
    let factories: Vec<(Arc<dyn ReconcilerPluginFactory>, Value)> = vec![
        (Arc::new(FailingFactory), serde_json::json!({})),
        (Arc::new(StubFactory("f2", "workflows")), serde_json::json!({})),
    ];

    let registered = registry.discover_reconciler_plugins(factories).await;

    assert_eq!(registered, vec!["workflows".to_string()]);
}

#[tokio::test]
async fn discovery_skips_a_conflicting_claim_but_keeps_going() {
    let registry = PluginRegistry::new();
    registry
        .register_reconciler_plugin(Arc::new(StubReconciler("existing", vec!["Database".into()])))
        .await
        .unwrap();

    let factories: Vec<(Arc<dyn ReconcilerPluginFactory>, Value)> = vec![
        (Arc::new(StubFactory("f1", "Database")), serde_json::json!({})),
        (Arc::new(StubFactory("f2", "workflows")), serde_json::json!({})),
    ];

    let registered = registry.discover_reconciler_plugins(factories).await;

    assert_eq!(registered, vec!["workflows".to_string()]);
}
