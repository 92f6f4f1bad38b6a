// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The error taxonomy for the controller.
//!
//! `ControllerError` is what write-path callers see. Reconcile-path errors
//! never escape the per-resource task boundary (they land in history and
//! the resource's status instead) — see `dispatcher::run_reconcile_task`.

use thiserror::Error;

/// Errors surfaced to a write-path caller (create/update/delete, webhook and
/// resource-type management). The store is left unchanged whenever one of
/// these is returned, except `FinalizerBlocking`, which is a silent no-op.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Spec failed schema validation, the name is malformed, a field
    /// exceeds the size cap, or an unknown plugin/type was referenced.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An admission webhook returned `allowed=false`, or all retries failed
    /// under `failure_policy=Fail`.
    #[error("admission denied: {0}")]
    AdmissionDenied(String),

    /// The target id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate `(name, version)`, duplicate webhook name, or deletion of
    /// a type still referenced by resources.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Hard-delete was requested but finalizers remain; this is reported as
    /// a silent success by the public API, but is distinguished here for
    /// callers (like tests) that want to observe it.
    #[error("finalizers still present, hard delete skipped")]
    FinalizerBlocking,

    /// The store's connection pool rejected or timed out a call.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors internal to the store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection or query failed: {0}")]
    Transient(String),

    #[error("row not found")]
    NotFound,

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Transient(other.to_string()),
        }
    }
}

/// Errors from driving an action executor through its phase protocol.
/// These are caught at the reconcile-task boundary and converted into a
/// failed history row plus a `Degraded` condition; they never propagate to
/// the dispatcher's loops.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("prepare failed: {0}")]
    Prepare(String),

    #[error("plan failed: {0}")]
    Plan(String),

    #[error("apply failed: {0}")]
    Apply(String),

    #[error("destroy failed: {0}")]
    Destroy(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from applying or validating an admission webhook's JSON-Patch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("patch path must not be empty")]
    EmptyPath,

    #[error("missing intermediate key '{0}' while applying patch")]
    MissingIntermediateKey(String),

    #[error("cannot remove missing key '{0}'")]
    RemoveMissingKey(String),

    #[error("array index patching is not supported")]
    ArrayIndexUnsupported,

    #[error("unsupported patch operation '{0}'")]
    UnsupportedOp(String),
}
