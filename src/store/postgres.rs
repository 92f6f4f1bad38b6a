// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The production [`Store`]: Postgres via `sqlx`, with dynamic (not
//! compile-time-checked) queries so this crate builds without a live
//! database.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::dispatcher::requeue::compute_backoff_delay;
use crate::errors::StoreError;
use crate::model::{
    AdmissionOperation, AdmissionWebhook, Condition, ConditionStatus, FailurePolicy, ReconciliationHistory, Resource,
    ResourceStatus, ResourceType, ResourceTypeStatus, WebhookType,
};

use super::{NewResource, NewResourceType, ResourceFilter, ResourceTypeUpdate, ResourceUpdate, Store};

/// A `Store` backed by a Postgres connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ResourceRow {
    id: Uuid,
    name: String,
    resource_type_name: String,
    resource_type_version: String,
    spec: serde_json::Value,
    spec_hash: String,
    plugin_config: serde_json::Value,
    metadata: Json<BTreeMap<String, String>>,
    outputs: serde_json::Value,
    action_plugin: String,
    status: ResourceStatus,
    status_message: Option<String>,
    generation: i64,
    observed_generation: i64,
    retry_count: i32,
    last_reconcile_time: Option<DateTime<Utc>>,
    next_reconcile_time: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    finalizers: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        Resource {
            id: row.id,
            name: row.name,
            resource_type_name: row.resource_type_name,
            resource_type_version: row.resource_type_version,
            spec: row.spec,
            spec_hash: row.spec_hash,
            plugin_config: row.plugin_config,
            metadata: row.metadata.0,
            outputs: row.outputs,
            action_plugin: row.action_plugin,
            status: row.status,
            status_message: row.status_message,
            generation: row.generation,
            observed_generation: row.observed_generation,
            retry_count: row.retry_count,
            last_reconcile_time: row.last_reconcile_time,
            next_reconcile_time: row.next_reconcile_time,
            deleted_at: row.deleted_at,
            finalizers: row.finalizers.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const RESOURCE_COLUMNS: &str = "id, name, resource_type_name, resource_type_version, spec, spec_hash, \
    plugin_config, metadata, outputs, action_plugin, status, status_message, generation, \
    observed_generation, retry_count, last_reconcile_time, next_reconcile_time, deleted_at, \
    finalizers, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ResourceTypeRow {
    id: Uuid,
    name: String,
    version: String,
    schema: serde_json::Value,
    description: Option<String>,
    status: ResourceTypeStatus,
    metadata: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ResourceTypeRow> for ResourceType {
    fn from(row: ResourceTypeRow) -> Self {
        ResourceType {
            id: row.id,
            name: row.name,
            version: row.version,
            schema: row.schema,
            description: row.description,
            status: row.status,
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ConditionRow {
    r#type: String,
    status: ConditionStatus,
    reason: Option<String>,
    message: Option<String>,
    observed_generation: i64,
    last_transition_time: DateTime<Utc>,
}

impl From<ConditionRow> for Condition {
    fn from(row: ConditionRow) -> Self {
        Condition {
            r#type: row.r#type,
            status: row.status,
            reason: row.reason,
            message: row.message,
            observed_generation: row.observed_generation,
            last_transition_time: row.last_transition_time,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    resource_id: Uuid,
    generation: i64,
    success: bool,
    phase: crate::model::HistoryPhase,
    plan_output: Option<String>,
    apply_output: Option<String>,
    error_message: Option<String>,
    resources_created: i32,
    resources_updated: i32,
    resources_deleted: i32,
    duration_seconds: f64,
    trigger_reason: crate::model::TriggerReason,
    drift_detected: bool,
    reconcile_time: DateTime<Utc>,
}

impl From<HistoryRow> for ReconciliationHistory {
    fn from(row: HistoryRow) -> Self {
        ReconciliationHistory {
            id: row.id,
            resource_id: row.resource_id,
            generation: row.generation,
            success: row.success,
            phase: row.phase,
            plan_output: row.plan_output,
            apply_output: row.apply_output,
            error_message: row.error_message,
            resources_created: row.resources_created,
            resources_updated: row.resources_updated,
            resources_deleted: row.resources_deleted,
            duration_seconds: row.duration_seconds,
            trigger_reason: row.trigger_reason,
            drift_detected: row.drift_detected,
            reconcile_time: row.reconcile_time,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WebhookRow {
    id: Uuid,
    name: String,
    webhook_url: String,
    webhook_type: WebhookType,
    operations: Json<Vec<AdmissionOperation>>,
    resource_type_name: Option<String>,
    resource_type_version: Option<String>,
    timeout_seconds: i32,
    failure_policy: FailurePolicy,
    ordering: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WebhookRow> for AdmissionWebhook {
    fn from(row: WebhookRow) -> Self {
        AdmissionWebhook {
            id: row.id,
            name: row.name,
            webhook_url: row.webhook_url,
            webhook_type: row.webhook_type,
            operations: row.operations.0,
            resource_type_name: row.resource_type_name,
            resource_type_version: row.resource_type_version,
            timeout_seconds: row.timeout_seconds.max(0) as u32,
            failure_policy: row.failure_policy,
            ordering: row.ordering,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_resource(&self, input: NewResource) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let finalizers = if input.finalizers.is_empty() {
            vec![input.action_plugin.clone()]
        } else {
            input.finalizers
        };
        let spec_hash = crate::model::spec_hash(&input.spec);
        let query = format!("INSERT INTO resources ({RESOURCE_COLUMNS}) VALUES \
            ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,now(),now())");
        sqlx::query(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.resource_type_name)
            .bind(&input.resource_type_version)
            .bind(&input.spec)
            .bind(&spec_hash)
            .bind(&input.plugin_config)
            .bind(Json(input.metadata))
            .bind(serde_json::json!({}))
            .bind(&input.action_plugin)
            .bind(ResourceStatus::Pending)
            .bind(Option::<String>::None)
            .bind(1i64)
            .bind(0i64)
            .bind(0i32)
            .bind(Option::<DateTime<Utc>>::None)
            .bind(Some(Utc::now()))
            .bind(Option::<DateTime<Utc>>::None)
            .bind(Json(finalizers))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn get_resource(&self, id: Uuid) -> Result<Resource, StoreError> {
        let query = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1");
        let row: ResourceRow = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn list_resources(&self, filter: ResourceFilter) -> Result<Vec<Resource>, StoreError> {
        let mut builder = sqlx::QueryBuilder::new(format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE 1 = 1"));
        if !filter.include_deleted {
            builder.push(" AND deleted_at IS NULL");
        }
        if let Some(type_name) = &filter.resource_type_name {
            builder.push(" AND resource_type_name = ").push_bind(type_name);
        }
        if let Some(type_version) = &filter.resource_type_version {
            builder.push(" AND resource_type_version = ").push_bind(type_version);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        builder.push(" ORDER BY created_at ASC");
        let rows: Vec<ResourceRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_resource(&self, id: Uuid, update: ResourceUpdate) -> Result<(), StoreError> {
        // Concurrent `update_resource_status(reconciling)` calls are not row-locked
        // against this write; a racing status write may be clobbered, but the next
        // poll cycle observes the bumped generation and re-reconciles regardless.
        if let Some(spec) = update.spec {
            let spec_hash = crate::model::spec_hash(&spec);
            let result = sqlx::query(
                "UPDATE resources SET spec = $1, spec_hash = $2, plugin_config = COALESCE($3, plugin_config), \
                 generation = generation + 1, status = 'pending', next_reconcile_time = now(), updated_at = now() \
                 WHERE id = $4",
            )
            .bind(&spec)
            .bind(&spec_hash)
            .bind(update.plugin_config)
            .bind(id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
        } else {
            let result = sqlx::query(
                "UPDATE resources SET plugin_config = COALESCE($1, plugin_config), generation = generation + 1, \
                 status = 'pending', next_reconcile_time = now(), updated_at = now() WHERE id = $2",
            )
            .bind(update.plugin_config)
            .bind(id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
        }
        Ok(())
    }

    async fn delete_resource(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE resources SET status = 'deleting', deleted_at = now(), next_reconcile_time = now(), \
             updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn hard_delete_resource(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM resources WHERE id = $1 AND deleted_at IS NOT NULL AND finalizers = '[]'::jsonb",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_finalizer(&self, id: Uuid, key: &str) -> Result<(), StoreError> {
        let mut resource = self.get_resource(id).await?;
        resource.add_finalizer(key);
        self.write_finalizers(id, &resource.finalizers).await
    }

    async fn remove_finalizer(&self, id: Uuid, key: &str) -> Result<(), StoreError> {
        let mut resource = self.get_resource(id).await?;
        resource.remove_finalizer(key);
        self.write_finalizers(id, &resource.finalizers).await
    }

    async fn update_resource_status(
        &self,
        id: Uuid,
        status: ResourceStatus,
        message: Option<String>,
        observed_generation: Option<i64>,
    ) -> Result<(), StoreError> {
        let result = match status {
            ResourceStatus::Ready => {
                let next_reconcile_time = Utc::now() + chrono::Duration::seconds(crate::config::READY_REQUEUE_SECS);
                sqlx::query(
                    "UPDATE resources SET status = $1, status_message = $2, \
                     observed_generation = COALESCE($3, observed_generation), last_reconcile_time = now(), \
                     retry_count = 0, next_reconcile_time = $4, updated_at = now() WHERE id = $5",
                )
                .bind(status)
                .bind(message)
                .bind(observed_generation)
                .bind(next_reconcile_time)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            ResourceStatus::Failed => {
                sqlx::query(
                    "UPDATE resources SET status = $1, status_message = $2, \
                     observed_generation = COALESCE($3, observed_generation), last_reconcile_time = now(), \
                     retry_count = retry_count + 1, updated_at = now() WHERE id = $4",
                )
                .bind(status)
                .bind(message)
                .bind(observed_generation)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            _ => {
                sqlx::query(
                    "UPDATE resources SET status = $1, status_message = $2, \
                     observed_generation = COALESCE($3, observed_generation), updated_at = now() WHERE id = $4",
                )
                .bind(status)
                .bind(message)
                .bind(observed_generation)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
        };
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_resource_outputs(&self, id: Uuid, outputs: serde_json::Value) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE resources SET outputs = $1, updated_at = now() WHERE id = $2")
            .bind(outputs)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_resources_needing_reconciliation(&self, limit: i64) -> Result<Vec<Resource>, StoreError> {
        self.get_resources_needing_reconciliation_by_type(&[], limit).await
    }

    async fn get_resources_needing_reconciliation_by_type(
        &self,
        resource_type_names: &[String],
        limit: i64,
    ) -> Result<Vec<Resource>, StoreError> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources \
             WHERE (deleted_at IS NULL OR status = 'deleting') \
             AND status != 'reconciling' \
             AND (last_reconcile_time IS NULL OR generation > observed_generation \
                  OR next_reconcile_time <= now() OR status = 'deleting')"
        ));
        if !resource_type_names.is_empty() {
            builder
                .push(" AND resource_type_name = ANY(")
                .push_bind(resource_type_names.to_vec())
                .push(")");
        }
        builder.push(
            " ORDER BY \
               CASE status \
                 WHEN 'deleting' THEN 0 \
                 WHEN 'pending' THEN 1 \
                 WHEN 'failed' THEN 2 \
                 ELSE 3 \
               END, \
               next_reconcile_time ASC NULLS FIRST \
             LIMIT ",
        );
        builder.push_bind(limit);
        let rows: Vec<ResourceRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn requeue_failed_resources(
        &self,
        base: Duration,
        max_delay: Duration,
        jitter: f64,
    ) -> Result<u64, StoreError> {
        let due: Vec<(Uuid, i32)> = sqlx::query(
            "SELECT id, retry_count FROM resources \
             WHERE status = 'failed' AND (next_reconcile_time IS NULL OR next_reconcile_time < now())",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| (row.get("id"), row.get("retry_count")))
        .collect();

        let mut updated = 0u64;
        for (id, retry_count) in due {
            let delay = compute_backoff_delay(retry_count, base, max_delay, jitter);
            let delay_secs = delay.as_secs_f64();
            sqlx::query(
                "UPDATE resources SET next_reconcile_time = now() + make_interval(secs => $1), updated_at = now() \
                 WHERE id = $2",
            )
            .bind(delay_secs)
            .bind(id)
            .execute(&self.pool)
            .await?;
            updated += 1;
        }
        Ok(updated)
    }

    async fn record_reconciliation(&self, history: ReconciliationHistory) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO reconciliation_history (id, resource_id, generation, success, phase, plan_output, \
             apply_output, error_message, resources_created, resources_updated, resources_deleted, \
             duration_seconds, trigger_reason, drift_detected, reconcile_time) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)",
        )
        .bind(history.id)
        .bind(history.resource_id)
        .bind(history.generation)
        .bind(history.success)
        .bind(history.phase)
        .bind(history.plan_output)
        .bind(history.apply_output)
        .bind(history.error_message)
        .bind(history.resources_created)
        .bind(history.resources_updated)
        .bind(history.resources_deleted)
        .bind(history.duration_seconds)
        .bind(history.trigger_reason)
        .bind(history.drift_detected)
        .bind(history.reconcile_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_history(&self, resource_id: Uuid) -> Result<Vec<ReconciliationHistory>, StoreError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT id, resource_id, generation, success, phase, plan_output, apply_output, error_message, \
             resources_created, resources_updated, resources_deleted, duration_seconds, trigger_reason, \
             drift_detected, reconcile_time FROM reconciliation_history WHERE resource_id = $1 \
             ORDER BY reconcile_time DESC",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_condition(&self, resource_id: Uuid, condition: Condition) -> Result<(), StoreError> {
        let existing: Option<ConditionRow> = sqlx::query_as(
            "SELECT type, status, reason, message, observed_generation, last_transition_time \
             FROM resource_conditions WHERE resource_id = $1 AND type = $2",
        )
        .bind(resource_id)
        .bind(&condition.r#type)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = existing {
            if !condition.differs_from(&Condition::from(row)) {
                return Ok(());
            }
        }

        sqlx::query(
            "INSERT INTO resource_conditions (resource_id, type, status, reason, message, observed_generation, \
             last_transition_time) VALUES ($1,$2,$3,$4,$5,$6,$7) \
             ON CONFLICT (resource_id, type) DO UPDATE SET \
               status = EXCLUDED.status, reason = EXCLUDED.reason, message = EXCLUDED.message, \
               observed_generation = EXCLUDED.observed_generation, last_transition_time = EXCLUDED.last_transition_time",
        )
        .bind(resource_id)
        .bind(condition.r#type)
        .bind(condition.status)
        .bind(condition.reason)
        .bind(condition.message)
        .bind(condition.observed_generation)
        .bind(condition.last_transition_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_conditions(&self, resource_id: Uuid) -> Result<Vec<Condition>, StoreError> {
        let rows: Vec<ConditionRow> = sqlx::query_as(
            "SELECT type, status, reason, message, observed_generation, last_transition_time \
             FROM resource_conditions WHERE resource_id = $1",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_resource_type(&self, input: NewResourceType) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO resource_types (id, name, version, schema, description, status, metadata, \
             created_at, updated_at) VALUES ($1,$2,$3,$4,$5,$6,$7,now(),now())",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.version)
        .bind(&input.schema)
        .bind(&input.description)
        .bind(ResourceTypeStatus::Active)
        .bind(Json(&input.metadata))
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get_resource_type(&self, name: &str, version: &str) -> Result<ResourceType, StoreError> {
        let row: ResourceTypeRow = sqlx::query_as(
            "SELECT id, name, version, schema, description, status, metadata, created_at, updated_at \
             FROM resource_types WHERE name = $1 AND version = $2",
        )
        .bind(name)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn update_resource_type(&self, name: &str, version: &str, update: ResourceTypeUpdate) -> Result<(), StoreError> {
        let mut builder = sqlx::QueryBuilder::new("UPDATE resource_types SET updated_at = now()");
        if let Some(schema) = update.schema {
            builder.push(", schema = ").push_bind(schema);
        }
        if let Some(description) = update.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(status) = update.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(metadata) = update.metadata {
            builder.push(", metadata = ").push_bind(Json(metadata));
        }
        builder.push(" WHERE name = ").push_bind(name.to_string());
        builder.push(" AND version = ").push_bind(version.to_string());
        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_resource_types(&self) -> Result<Vec<ResourceType>, StoreError> {
        let rows: Vec<ResourceTypeRow> = sqlx::query_as(
            "SELECT id, name, version, schema, description, status, metadata, created_at, updated_at \
             FROM resource_types",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_resource_type(&self, name: &str, version: &str) -> Result<(), StoreError> {
        let referenced: i64 = sqlx::query(
            "SELECT count(*) AS count FROM resources WHERE resource_type_name = $1 AND resource_type_version = $2",
        )
        .bind(name)
        .bind(version)
        .fetch_one(&self.pool)
        .await?
        .get("count");
        if referenced > 0 {
            return Err(StoreError::Conflict(format!(
                "resource type {name}/{version} is still referenced by resources"
            )));
        }
        let result = sqlx::query("DELETE FROM resource_types WHERE name = $1 AND version = $2")
            .bind(name)
            .bind(version)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn register_webhook(&self, webhook: AdmissionWebhook) -> Result<Uuid, StoreError> {
        sqlx::query(
            "INSERT INTO admission_webhooks (id, name, webhook_url, webhook_type, operations, \
             resource_type_name, resource_type_version, timeout_seconds, failure_policy, ordering, \
             created_at, updated_at) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,now(),now())",
        )
        .bind(webhook.id)
        .bind(&webhook.name)
        .bind(&webhook.webhook_url)
        .bind(webhook.webhook_type)
        .bind(Json(&webhook.operations))
        .bind(&webhook.resource_type_name)
        .bind(&webhook.resource_type_version)
        .bind(webhook.timeout_seconds as i32)
        .bind(webhook.failure_policy)
        .bind(webhook.ordering)
        .execute(&self.pool)
        .await?;
        Ok(webhook.id)
    }

    async fn get_webhook(&self, name: &str) -> Result<AdmissionWebhook, StoreError> {
        let row: WebhookRow = sqlx::query_as(
            "SELECT id, name, webhook_url, webhook_type, operations, resource_type_name, \
             resource_type_version, timeout_seconds, failure_policy, ordering, created_at, updated_at \
             FROM admission_webhooks WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn list_webhooks(&self) -> Result<Vec<AdmissionWebhook>, StoreError> {
        let rows: Vec<WebhookRow> = sqlx::query_as(
            "SELECT id, name, webhook_url, webhook_type, operations, resource_type_name, \
             resource_type_version, timeout_seconds, failure_policy, ordering, created_at, updated_at \
             FROM admission_webhooks",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_webhook(&self, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM admission_webhooks WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

impl PostgresStore {
    async fn write_finalizers(&self, id: Uuid, finalizers: &[String]) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE resources SET finalizers = $1, updated_at = now() WHERE id = $2")
            .bind(Json(finalizers))
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "postgres_tests.rs"]
mod postgres_tests;
