// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The admission chain: mutating webhooks run first and may patch `spec`,
//! then validating webhooks run against the mutated result. Both share the
//! same transport and failure-policy rules.

pub mod patch;
pub mod webhook_client;

use serde_json::Value;

use crate::errors::ControllerError;
use crate::model::{AdmissionOperation, AdmissionWebhook, FailurePolicy, WebhookType};

use patch::apply_patches;
use webhook_client::{call_webhook, AdmissionRequest, AdmissionResource, AdmissionResponse};

/// The outcome of running a resource write through the admission chain:
/// either the (possibly patched) spec to persist, or the reason it was
/// rejected.
pub struct AdmissionOutcome {
    pub spec: Value,
}

/// Drives a set of already-fetched webhooks through the mutating-then-
/// validating protocol for a single write.
pub struct AdmissionChain<'a> {
    client: &'a reqwest::Client,
}

impl<'a> AdmissionChain<'a> {
    #[must_use]
    pub fn new(client: &'a reqwest::Client) -> Self {
        Self { client }
    }

    /// Run `webhooks` (already filtered to whatever resource type this
    /// write applies to, but not yet split by operation or type) against
    /// `spec`. Webhooks are selected with `AdmissionWebhook::matches`, split
    /// into mutating/validating, and each group runs in `ordering ASC`
    /// order (ties broken by id).
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        webhooks: &[AdmissionWebhook],
        operation: AdmissionOperation,
        resource_name: &str,
        resource_type_name: &str,
        resource_type_version: &str,
        spec: &Value,
        old_spec: Option<&Value>,
    ) -> Result<AdmissionOutcome, ControllerError> {
        let matching: Vec<&AdmissionWebhook> = webhooks
            .iter()
            .filter(|w| w.matches(operation, resource_type_name, resource_type_version))
            .collect();

        let mut mutating: Vec<&AdmissionWebhook> = matching
            .iter()
            .copied()
            .filter(|w| w.webhook_type == WebhookType::Mutating)
            .collect();
        let mut validating: Vec<&AdmissionWebhook> = matching
            .iter()
            .copied()
            .filter(|w| w.webhook_type == WebhookType::Validating)
            .collect();
        sort_by_ordering(&mut mutating);
        sort_by_ordering(&mut validating);

        let mut current_spec = spec.clone();
        for webhook in &mutating {
            let response = self
                .invoke(webhook, operation, resource_name, resource_type_name, resource_type_version, &current_spec, old_spec)
                .await?;
            if !response.allowed {
                return Err(ControllerError::AdmissionDenied(
                    response
                        .message
                        .unwrap_or_else(|| format!("denied by {}", webhook.name)),
                ));
            }
            current_spec = apply_patches(&current_spec, &response.patches).map_err(|e| {
                ControllerError::Validation(format!("{} returned an invalid patch: {e}", webhook.name))
            })?;
        }

        for webhook in &validating {
            let response = self
                .invoke(webhook, operation, resource_name, resource_type_name, resource_type_version, &current_spec, old_spec)
                .await?;
            if !response.allowed {
                return Err(ControllerError::AdmissionDenied(
                    response
                        .message
                        .unwrap_or_else(|| format!("denied by {}", webhook.name)),
                ));
            }
            // Validating webhooks' patches, if any, are ignored.
        }

        Ok(AdmissionOutcome { spec: current_spec })
    }

    #[allow(clippy::too_many_arguments)]
    async fn invoke(
        &self,
        webhook: &AdmissionWebhook,
        operation: AdmissionOperation,
        resource_name: &str,
        resource_type_name: &str,
        resource_type_version: &str,
        spec: &Value,
        old_spec: Option<&Value>,
    ) -> Result<AdmissionResponse, ControllerError> {
        let request = AdmissionRequest {
            operation,
            resource: AdmissionResource {
                name: resource_name,
                resource_type_name,
                resource_type_version,
                spec,
            },
            old_resource: old_spec.map(|old| AdmissionResource {
                name: resource_name,
                resource_type_name,
                resource_type_version,
                spec: old,
            }),
        };
        match call_webhook(self.client, webhook, &request).await {
            Ok(response) => Ok(response),
            Err(transport_err) => match webhook.failure_policy {
                FailurePolicy::Ignore => {
                    tracing::warn!(
                        webhook = %webhook.name,
                        error = %transport_err,
                        "webhook unreachable, ignoring per failure policy"
                    );
                    Ok(AdmissionResponse::allow_with_no_patches())
                }
                FailurePolicy::Fail => Err(ControllerError::AdmissionDenied(format!(
                    "{} unreachable: {transport_err}",
                    webhook.name
                ))),
            },
        }
    }
}

fn sort_by_ordering(webhooks: &mut [&AdmissionWebhook]) {
    webhooks.sort_by(|a, b| a.ordering.cmp(&b.ordering).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
