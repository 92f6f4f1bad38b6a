// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Input sources feed externally-observed changes into the controller
//! without going through the write API directly (e.g. a webhook receiver
//! or a poll against a third-party system).

use async_trait::async_trait;
use serde_json::Value;

/// The kind of change an input source observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventType {
    Created,
    Updated,
    Deleted,
}

/// What an input source hands back to its registered callback. Opaque to
/// the core beyond this shape.
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub event_type: InputEventType,
    pub resource_spec: Value,
}

/// A callback an input source invokes for every observed change.
pub type InputEventCallback = std::sync::Arc<dyn Fn(InputEvent) + Send + Sync>;

#[async_trait]
pub trait InputSource: Send + Sync {
    fn name(&self) -> &str;

    async fn initialize(&self, config: &Value) -> anyhow::Result<()>;

    /// Begin observing. The source owns its own loop and invokes `callback`
    /// for every change; it must return once `start` has spawned whatever
    /// background work it needs, not block for the source's lifetime.
    async fn start(&self, callback: InputEventCallback) -> anyhow::Result<()>;

    async fn stop(&self) -> anyhow::Result<()>;

    async fn health_check(&self) -> anyhow::Result<bool>;
}

#[cfg(test)]
#[path = "input_source_tests.rs"]
mod input_source_tests;
