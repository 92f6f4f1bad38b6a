// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! HTTP transport for calling an admission webhook.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::admission::patch::JsonPatchOp;
use crate::model::{AdmissionOperation, AdmissionWebhook};

/// The resource envelope carried in an `AdmissionRequest`: not just the
/// bare `spec`, but enough identity for a webhook to tell which resource
/// and type it is being asked about.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionResource<'a> {
    pub name: &'a str,
    pub resource_type_name: &'a str,
    pub resource_type_version: &'a str,
    pub spec: &'a Value,
}

/// Request body POSTed to a webhook's `webhook_url`.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionRequest<'a> {
    pub operation: AdmissionOperation,
    pub resource: AdmissionResource<'a>,
    pub old_resource: Option<AdmissionResource<'a>>,
}

/// Response body a webhook is expected to return.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionResponse {
    pub allowed: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub patches: Vec<JsonPatchOp>,
}

impl AdmissionResponse {
    /// The fallback used when a webhook is unreachable and its
    /// `failure_policy` is `Ignore`.
    #[must_use]
    pub fn allow_with_no_patches() -> Self {
        Self {
            allowed: true,
            message: None,
            patches: Vec::new(),
        }
    }
}

/// POST an admission request to a single webhook, honoring its configured
/// timeout. Callers interpret the `Result`'s `Err` per the webhook's
/// `failure_policy` — this function only reports whether the call itself
/// succeeded at the transport/HTTP level.
pub async fn call_webhook(
    client: &reqwest::Client,
    webhook: &AdmissionWebhook,
    request: &AdmissionRequest<'_>,
) -> Result<AdmissionResponse, String> {
    let response = client
        .post(&webhook.webhook_url)
        .timeout(Duration::from_secs(u64::from(webhook.timeout_seconds)))
        .json(request)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().as_u16() >= 500 {
        return Err(format!("webhook returned HTTP {}", response.status()));
    }

    response
        .json::<AdmissionResponse>()
        .await
        .map_err(|e| format!("failed to parse webhook response: {e}"))
}

#[cfg(test)]
#[path = "webhook_client_tests.rs"]
mod webhook_client_tests;
