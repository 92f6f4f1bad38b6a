use super::*;

fn webhook(type_name: Option<&str>, type_version: Option<&str>) -> AdmissionWebhook {
    AdmissionWebhook {
        id: uuid::Uuid::new_v4(),
        name: "mutate-ha".into(),
        webhook_url: "https://example.test/admit".into(),
        webhook_type: WebhookType::Mutating,
        operations: vec![AdmissionOperation::Create, AdmissionOperation::Update],
        resource_type_name: type_name.map(str::to_string),
        resource_type_version: type_version.map(str::to_string),
        timeout_seconds: 5,
        failure_policy: FailurePolicy::Fail,
        ordering: 0,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[test]
fn null_type_and_version_match_everything() {
    let w = webhook(None, None);
    assert!(w.matches(AdmissionOperation::Create, "Anything", "v1"));
    assert!(w.matches(AdmissionOperation::Create, "Else", "v2"));
}

#[test]
fn specific_type_restricts_match() {
    let w = webhook(Some("Database"), Some("v1"));
    assert!(w.matches(AdmissionOperation::Create, "Database", "v1"));
    assert!(!w.matches(AdmissionOperation::Create, "Database", "v2"));
    assert!(!w.matches(AdmissionOperation::Create, "Other", "v1"));
}

#[test]
fn operation_not_registered_does_not_match() {
    let w = webhook(None, None);
    assert!(!w.matches(AdmissionOperation::Delete, "Database", "v1"));
}
