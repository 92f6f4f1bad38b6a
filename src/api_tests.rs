use super::*;
use crate::store::memory::MemoryStore;
use crate::store::NewResource;

async fn api_with_resource(finalizers: Vec<String>) -> (ControllerApi, Uuid) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let event_bus = Arc::new(EventBus::new());
    let id = store
        .create_resource(NewResource {
            name: "demo".into(),
            resource_type_name: "Widget".into(),
            resource_type_version: "v1".into(),
            action_plugin: "stub".into(),
            spec: serde_json::json!({}),
            plugin_config: serde_json::json!({}),
            metadata: Default::default(),
            finalizers,
        })
        .await
        .unwrap();
    (ControllerApi::new(store, event_bus), id)
}

#[tokio::test]
async fn ensure_finalizer_is_idempotent() {
    let (api, id) = api_with_resource(vec![]).await;
    api.ensure_finalizer(id, "stub").await.unwrap();
    api.ensure_finalizer(id, "stub").await.unwrap();
    let resource = api.store.get_resource(id).await.unwrap();
    assert_eq!(resource.finalizers.iter().filter(|f| *f == "stub").count(), 1);
}

#[tokio::test]
async fn removing_last_finalizer_without_soft_delete_does_not_hard_delete() {
    let (api, id) = api_with_resource(vec!["stub".into()]).await;
    let hard_deleted = api.remove_finalizer_and_maybe_hard_delete(id, "stub").await.unwrap();
    assert!(!hard_deleted);
    assert!(api.store.get_resource(id).await.is_ok());
}

#[tokio::test]
async fn removing_last_finalizer_after_soft_delete_hard_deletes() {
    let (api, id) = api_with_resource(vec!["stub".into()]).await;
    api.store.delete_resource(id).await.unwrap();

    let hard_deleted = api.remove_finalizer_and_maybe_hard_delete(id, "stub").await.unwrap();
    assert!(hard_deleted);
    assert!(matches!(
        api.store.get_resource(id).await,
        Err(crate::errors::StoreError::NotFound)
    ));
}

#[tokio::test]
async fn set_ready_upserts_the_ready_condition() {
    let (api, id) = api_with_resource(vec![]).await;
    api.set_ready(id, "AllGood", "resource is healthy", 3).await.unwrap();
    let conditions = api.store.get_conditions(id).await.unwrap();
    let ready = conditions.iter().find(|c| c.r#type == CONDITION_READY).unwrap();
    assert_eq!(ready.status, ConditionStatus::True);
    assert_eq!(ready.observed_generation, 3);
}
