use super::*;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn webhook(url: String) -> AdmissionWebhook {
    AdmissionWebhook {
        id: Uuid::new_v4(),
        name: "test-webhook".into(),
        webhook_url: url,
        webhook_type: crate::model::WebhookType::Mutating,
        operations: vec![AdmissionOperation::Create],
        resource_type_name: None,
        resource_type_version: None,
        timeout_seconds: 5,
        failure_policy: crate::model::FailurePolicy::Fail,
        ordering: 0,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn allowed_response_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": true,
            "patches": [{"op": "add", "path": "/spec/ha", "value": true}]
        })))
        .mount(&server)
        .await;

    let wh = webhook(format!("{}/admit", server.uri()));
    let client = reqwest::Client::new();
    let spec = json!({"engine": "pg"});
    let request = AdmissionRequest {
        operation: AdmissionOperation::Create,
        resource: AdmissionResource {
            name: "demo",
            resource_type_name: "Database",
            resource_type_version: "v1",
            spec: &spec,
        },
        old_resource: None,
    };

    let response = call_webhook(&client, &wh, &request).await.unwrap();
    assert!(response.allowed);
    assert_eq!(response.patches.len(), 1);
}

#[tokio::test]
async fn denied_response_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": false,
            "message": "engine must be postgres"
        })))
        .mount(&server)
        .await;

    let wh = webhook(format!("{}/admit", server.uri()));
    let client = reqwest::Client::new();
    let spec = json!({"engine": "mysql"});
    let request = AdmissionRequest {
        operation: AdmissionOperation::Create,
        resource: AdmissionResource {
            name: "demo",
            resource_type_name: "Database",
            resource_type_version: "v1",
            spec: &spec,
        },
        old_resource: None,
    };

    let response = call_webhook(&client, &wh, &request).await.unwrap();
    assert!(!response.allowed);
    assert_eq!(response.message.as_deref(), Some("engine must be postgres"));
}

#[tokio::test]
async fn server_error_is_reported_as_transport_err() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admit"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let wh = webhook(format!("{}/admit", server.uri()));
    let client = reqwest::Client::new();
    let spec = json!({});
    let request = AdmissionRequest {
        operation: AdmissionOperation::Create,
        resource: AdmissionResource {
            name: "demo",
            resource_type_name: "Database",
            resource_type_version: "v1",
            spec: &spec,
        },
        old_resource: None,
    };

    assert!(call_webhook(&client, &wh, &request).await.is_err());
}
