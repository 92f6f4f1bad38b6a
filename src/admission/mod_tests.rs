use super::*;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::model::{FailurePolicy, WebhookType};

fn webhook(
    url: String,
    webhook_type: WebhookType,
    ordering: i32,
    failure_policy: FailurePolicy,
) -> AdmissionWebhook {
    AdmissionWebhook {
        id: Uuid::new_v4(),
        name: format!("{webhook_type:?}-{ordering}"),
        webhook_url: url,
        webhook_type,
        operations: vec![AdmissionOperation::Create],
        resource_type_name: None,
        resource_type_version: None,
        timeout_seconds: 5,
        failure_policy,
        ordering,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn mutating_patches_apply_before_validating_runs() {
    let mutator = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": true,
            "patches": [{"op": "add", "path": "/spec/ha", "value": true}]
        })))
        .mount(&mutator)
        .await;

    let validator = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"allowed": true})))
        .mount(&validator)
        .await;

    let webhooks = vec![
        webhook(mutator.uri(), WebhookType::Mutating, 0, FailurePolicy::Fail),
        webhook(validator.uri(), WebhookType::Validating, 0, FailurePolicy::Fail),
    ];

    let client = reqwest::Client::new();
    let chain = AdmissionChain::new(&client);
    let spec = json!({"engine": "pg"});
    let outcome = chain
        .run(
            &webhooks,
            AdmissionOperation::Create,
            "demo",
            "Database",
            "v1",
            &spec,
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.spec, json!({"engine": "pg", "ha": true}));
}

#[tokio::test]
async fn validating_denial_aborts_chain() {
    let validator = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": false,
            "message": "nope"
        })))
        .mount(&validator)
        .await;

    let webhooks = vec![webhook(
        validator.uri(),
        WebhookType::Validating,
        0,
        FailurePolicy::Fail,
    )];

    let client = reqwest::Client::new();
    let chain = AdmissionChain::new(&client);
    let spec = json!({});
    let result = chain
        .run(
            &webhooks,
            AdmissionOperation::Create,
            "demo",
            "Database",
            "v1",
            &spec,
            None,
        )
        .await;

    assert!(matches!(result, Err(ControllerError::AdmissionDenied(_))));
}

#[tokio::test]
async fn unreachable_webhook_with_ignore_policy_allows() {
    // No mock server started at this address: the request will fail to connect.
    let webhooks = vec![webhook(
        "http://127.0.0.1:1".into(),
        WebhookType::Validating,
        0,
        FailurePolicy::Ignore,
    )];

    let client = reqwest::Client::new();
    let chain = AdmissionChain::new(&client);
    let spec = json!({"a": 1});
    let outcome = chain
        .run(
            &webhooks,
            AdmissionOperation::Create,
            "demo",
            "Database",
            "v1",
            &spec,
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.spec, spec);
}

#[tokio::test]
async fn unreachable_webhook_with_fail_policy_denies() {
    let webhooks = vec![webhook(
        "http://127.0.0.1:1".into(),
        WebhookType::Validating,
        0,
        FailurePolicy::Fail,
    )];

    let client = reqwest::Client::new();
    let chain = AdmissionChain::new(&client);
    let spec = json!({});
    let result = chain
        .run(
            &webhooks,
            AdmissionOperation::Create,
            "demo",
            "Database",
            "v1",
            &spec,
            None,
        )
        .await;

    assert!(matches!(result, Err(ControllerError::AdmissionDenied(_))));
}

#[tokio::test]
async fn non_matching_webhook_is_skipped() {
    let webhooks = vec![AdmissionWebhook {
        resource_type_name: Some("OtherType".into()),
        ..webhook(
            "http://127.0.0.1:1".into(),
            WebhookType::Validating,
            0,
            FailurePolicy::Fail,
        )
    }];

    let client = reqwest::Client::new();
    let chain = AdmissionChain::new(&client);
    let spec = json!({"a": 1});
    let outcome = chain
        .run(
            &webhooks,
            AdmissionOperation::Create,
            "demo",
            "Database",
            "v1",
            &spec,
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.spec, spec);
}
