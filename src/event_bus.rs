// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! In-process fan-out of resource lifecycle events to filtered subscribers.
//!
//! Publish never blocks and never fails: a subscriber whose queue is full
//! simply misses the event, and a warning is logged. Consumers only see
//! ordering guarantees relative to their own queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Default bounded capacity for a subscriber's queue.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

/// The kind of lifecycle transition a `ResourceEvent` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Created,
    Modified,
    Deleted,
    Reconciled,
}

/// A single resource lifecycle event, as published to every matching
/// subscriber. Field names are Rust-idiomatic; the wire JSON keys (set via
/// `rename`) match the SSE event-stream convention instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEvent {
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    #[serde(rename = "resource_id")]
    pub id: Uuid,
    #[serde(rename = "resource_name")]
    pub name: String,
    #[serde(rename = "resource_type_name")]
    pub type_name: String,
    #[serde(rename = "resource_type_version")]
    pub type_version: String,
    #[serde(rename = "resource_data")]
    pub resource_snapshot: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// A predicate evaluated client-side by the subscriber's stream adapter.
/// Delivery itself is non-selective: every subscriber's queue receives
/// every event, and filtering only decides what `next()` yields.
pub type EventFilter = Arc<dyn Fn(&ResourceEvent) -> bool + Send + Sync>;

/// What a subscriber's stream yields: either a live event or the sentinel
/// marking that `unsubscribe` was called.
#[derive(Debug, Clone)]
pub enum SubscriberMessage {
    Event(Box<ResourceEvent>),
    EndOfStream,
}

struct Subscriber {
    id: u64,
    filter: Option<EventFilter>,
    sender: mpsc::Sender<SubscriberMessage>,
}

/// A handle returned from `subscribe`: an id for `unsubscribe`, and the
/// receiving half of the subscriber's bounded queue.
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<SubscriberMessage>,
}

/// Fans out `ResourceEvent`s to zero or more subscribers.
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            capacity,
        }
    }

    /// Allocate a bounded FIFO queue and an optional predicate.
    pub async fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.subscribers
            .lock()
            .await
            .push(Subscriber { id, filter, sender });
        Subscription { id, receiver }
    }

    /// Enqueue `event` to every subscriber without blocking. A full queue
    /// drops the event for that subscriber only.
    pub async fn publish(&self, event: ResourceEvent) {
        let subscribers = self.subscribers.lock().await;
        for sub in subscribers.iter() {
            if let Some(filter) = &sub.filter {
                if !filter(&event) {
                    continue;
                }
            }
            let message = SubscriberMessage::Event(Box::new(event.clone()));
            if sub.sender.try_send(message).is_err() {
                tracing::warn!(subscriber_id = sub.id, kind = ?event.kind, "event bus queue full, dropping event for subscriber");
                crate::metrics::record_event_bus_dropped();
            }
        }
    }

    /// Remove a subscriber's queue, first pushing the end-of-stream
    /// sentinel so any in-flight consumer iteration terminates gracefully.
    pub async fn unsubscribe(&self, subscriber_id: u64) {
        let mut subscribers = self.subscribers.lock().await;
        if let Some(pos) = subscribers.iter().position(|s| s.id == subscriber_id) {
            let sub = subscribers.remove(pos);
            let _ = sub.sender.try_send(SubscriberMessage::EndOfStream);
        }
    }

    /// Current subscriber count, mostly useful for tests and metrics.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

/// Renders a subscriber message as one `text/event-stream` frame. Pure and
/// transport-agnostic: the axum route that would serve this over HTTP is
/// out of scope, but any caller wiring one up writes this string directly
/// to the response body. `EndOfStream` is rendered as a `close` event so a
/// browser `EventSource` can detect the end of the stream.
#[must_use]
pub fn to_sse_frame(message: &SubscriberMessage) -> String {
    match message {
        SubscriberMessage::Event(event) => {
            let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
            // `EventKind`'s own `rename_all = "UPPERCASE"` is the source of truth for the
            // `event:` line, so this serializes it rather than hand-matching each variant.
            let event_name = serde_json::to_value(event.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "UNKNOWN".to_string());
            format!("event: {event_name}\ndata: {data}\n\n")
        }
        SubscriberMessage::EndOfStream => "event: close\ndata: {}\n\n".to_string(),
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod event_bus_tests;
