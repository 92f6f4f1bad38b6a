use super::*;

struct NoopWorkspace;
impl Workspace for NoopWorkspace {}

struct NoopExecutor {
    has_changes: bool,
}

#[async_trait]
impl ActionExecutor for NoopExecutor {
    fn name(&self) -> &str {
        "noop"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    async fn initialize(&self, _config: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    async fn prepare(&self, _ctx: &ActionContext) -> anyhow::Result<Box<dyn Workspace>> {
        Ok(Box::new(NoopWorkspace))
    }

    async fn plan(&self, _ctx: &ActionContext, _workspace: &dyn Workspace) -> anyhow::Result<PlanResult> {
        Ok(PlanResult {
            success: true,
            has_changes: self.has_changes,
            plan_output: Some("no-op plan".into()),
            error_message: None,
        })
    }

    async fn apply(&self, _ctx: &ActionContext, _workspace: &dyn Workspace) -> anyhow::Result<ApplyResult> {
        Ok(ApplyResult {
            success: true,
            apply_output: Some("applied".into()),
            ..Default::default()
        })
    }

    async fn destroy(&self, _ctx: &ActionContext, _workspace: &dyn Workspace) -> anyhow::Result<ApplyResult> {
        Ok(ApplyResult {
            success: true,
            ..Default::default()
        })
    }

    async fn get_outputs(&self, _ctx: &ActionContext) -> anyhow::Result<BTreeMap<String, Value>> {
        Ok(BTreeMap::new())
    }

    async fn get_state(&self, _ctx: &ActionContext) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }

    async fn cleanup(&self, _workspace: &dyn Workspace) -> anyhow::Result<()> {
        Ok(())
    }
}

fn sample_ctx() -> ActionContext {
    ActionContext {
        resource_id: Uuid::new_v4(),
        name: "demo".into(),
        generation: 1,
        spec: serde_json::json!({}),
        spec_hash: "deadbeef".into(),
        plugin_config: serde_json::json!({}),
    }
}

#[tokio::test]
async fn default_validate_spec_accepts_anything() {
    let executor = NoopExecutor { has_changes: false };
    assert!(executor.validate_spec(&serde_json::json!({"whatever": 1})).is_ok());
}

#[tokio::test]
async fn default_detect_drift_is_none() {
    let executor = NoopExecutor { has_changes: false };
    let ctx = sample_ctx();
    assert!(executor.detect_drift(&ctx).await.unwrap().is_none());
}

#[tokio::test]
async fn full_phase_sequence_runs() {
    let executor = NoopExecutor { has_changes: true };
    let ctx = sample_ctx();
    let ws = executor.prepare(&ctx).await.unwrap();
    let plan = executor.plan(&ctx, ws.as_ref()).await.unwrap();
    assert!(plan.success && plan.has_changes);
    let apply = executor.apply(&ctx, ws.as_ref()).await.unwrap();
    assert!(apply.success);
    executor.cleanup(ws.as_ref()).await.unwrap();
}
