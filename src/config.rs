// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Recognized configuration options.
//!
//! Loading this struct from the environment or a config file is the
//! caller's responsibility (outside this crate's scope); `Config`'s job is
//! to hold the validated, typed result with sane defaults so the rest of
//! the crate never has to guess at a default.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Deserialize;

/// Default poll period for the dispatcher's poll loop.
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;
/// Default size of the reconcile semaphore.
pub const DEFAULT_MAX_CONCURRENT_RECONCILES: usize = 5;
/// Default requeue-loop tick period.
pub const DEFAULT_REQUEUE_TICK_SECS: u64 = 30;
/// Default exponential backoff base delay.
pub const DEFAULT_BACKOFF_BASE_SECS: u64 = 60;
/// Default exponential backoff cap.
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 3600;
/// Default backoff jitter factor (±10%).
pub const DEFAULT_BACKOFF_JITTER_FACTOR: f64 = 0.1;
/// Sleep duration after an exception bubbles out of the poll loop body.
pub const POLL_LOOP_ERROR_SLEEP_SECS: u64 = 10;
/// `next_reconcile_time` offset set on a successful reconcile (drift recheck).
pub const READY_REQUEUE_SECS: i64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(deserialize_with = "deserialize_secret")]
    pub url: SecretString,
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: u32,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

fn default_min_pool_size() -> u32 {
    1
}
fn default_max_pool_size() -> u32 {
    10
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::from(raw))
}

/// Everything the dispatcher and requeue scheduler need to run.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_reconciles: usize,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,
    #[serde(default = "default_backoff_jitter")]
    pub backoff_jitter_factor: f64,
}

fn default_reconcile_interval() -> u64 {
    DEFAULT_RECONCILE_INTERVAL_SECS
}
fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT_RECONCILES
}
fn default_backoff_base() -> u64 {
    DEFAULT_BACKOFF_BASE_SECS
}
fn default_backoff_max() -> u64 {
    DEFAULT_BACKOFF_MAX_SECS
}
fn default_backoff_jitter() -> f64 {
    DEFAULT_BACKOFF_JITTER_FACTOR
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
            max_concurrent_reconciles: DEFAULT_MAX_CONCURRENT_RECONCILES,
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            backoff_jitter_factor: DEFAULT_BACKOFF_JITTER_FACTOR,
        }
    }
}

/// Full process configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    /// Action-plugin keys enabled for this process, each with an opaque
    /// config map merged with per-resource `plugin_config` (per-resource
    /// wins on key collision).
    #[serde(default)]
    pub enabled_action_plugins: BTreeMap<String, serde_json::Value>,
    /// Input-source plugin keys enabled for this process.
    #[serde(default)]
    pub enabled_input_sources: Vec<String>,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
