use super::*;

fn sample_row() -> ResourceRow {
    let now = Utc::now();
    ResourceRow {
        id: Uuid::new_v4(),
        name: "demo".into(),
        resource_type_name: "Widget".into(),
        resource_type_version: "v1".into(),
        spec: serde_json::json!({"replicas": 3}),
        spec_hash: "abc".into(),
        plugin_config: serde_json::json!({}),
        metadata: Json(BTreeMap::new()),
        outputs: serde_json::json!({}),
        action_plugin: "stub".into(),
        status: ResourceStatus::Ready,
        status_message: None,
        generation: 2,
        observed_generation: 2,
        retry_count: 0,
        last_reconcile_time: Some(now),
        next_reconcile_time: Some(now),
        deleted_at: None,
        finalizers: Json(vec!["stub".into()]),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn resource_row_conversion_preserves_every_field() {
    let row = sample_row();
    let id = row.id;
    let resource: Resource = row.into();
    assert_eq!(resource.id, id);
    assert_eq!(resource.status, ResourceStatus::Ready);
    assert_eq!(resource.finalizers, vec!["stub".to_string()]);
    assert_eq!(resource.generation, 2);
}

#[test]
fn webhook_row_clamps_negative_timeout_to_zero() {
    let now = Utc::now();
    let row = WebhookRow {
        id: Uuid::new_v4(),
        name: "mutate-widgets".into(),
        webhook_url: "https://example.invalid/admit".into(),
        webhook_type: WebhookType::Mutating,
        operations: Json(vec![AdmissionOperation::Create]),
        resource_type_name: None,
        resource_type_version: None,
        timeout_seconds: -5,
        failure_policy: FailurePolicy::Fail,
        ordering: 0,
        created_at: now,
        updated_at: now,
    };
    let webhook: AdmissionWebhook = row.into();
    assert_eq!(webhook.timeout_seconds, 0);
}

#[test]
fn resource_filter_default_excludes_deleted() {
    let filter = ResourceFilter::default();
    assert!(!filter.include_deleted);
    assert!(filter.resource_type_name.is_none());
    assert!(filter.status.is_none());
}

#[test]
fn resource_type_update_default_changes_nothing() {
    let update = ResourceTypeUpdate::default();
    assert!(update.schema.is_none());
    assert!(update.description.is_none());
    assert!(update.status.is_none());
    assert!(update.metadata.is_none());
}

#[test]
fn condition_row_conversion_preserves_every_field() {
    let now = Utc::now();
    let row = ConditionRow {
        r#type: crate::model::CONDITION_READY.into(),
        status: crate::model::ConditionStatus::True,
        reason: Some("Done".into()),
        message: Some("ready".into()),
        observed_generation: 4,
        last_transition_time: now,
    };
    let condition: Condition = row.into();
    assert_eq!(condition.r#type, crate::model::CONDITION_READY);
    assert_eq!(condition.observed_generation, 4);
    assert_eq!(condition.last_transition_time, now);
}

#[test]
fn unchanged_condition_does_not_differ_across_row_round_trip() {
    let now = Utc::now();
    let row = ConditionRow {
        r#type: crate::model::CONDITION_READY.into(),
        status: crate::model::ConditionStatus::True,
        reason: Some("Done".into()),
        message: Some("ready".into()),
        observed_generation: 4,
        last_transition_time: now,
    };
    let existing: Condition = row.into();
    let fresh = Condition::new(crate::model::CONDITION_READY, crate::model::ConditionStatus::True, "Done", "ready", 4);

    assert!(!fresh.differs_from(&existing), "same facets with a newer timestamp must not count as a change");
}

#[test]
fn resource_columns_list_matches_resource_row_field_count() {
    let column_count = RESOURCE_COLUMNS.split(',').count();
    // id, name, resource_type_name, resource_type_version, spec, spec_hash,
    // plugin_config, metadata, outputs, action_plugin, status, status_message,
    // generation, observed_generation, retry_count, last_reconcile_time,
    // next_reconcile_time, deleted_at, finalizers, created_at, updated_at
    assert_eq!(column_count, 21);
}
