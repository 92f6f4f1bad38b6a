// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! A shared shutdown signal observed by every long-running loop: the poll
//! loop, the requeue loop, and each reconciler-plugin loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Set the shutdown flag and wake every task waiting on `notified`.
    pub fn signal(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already shut down, otherwise waits for the
    /// next `signal()`. Intended to be raced against a loop's sleep/work
    /// future with `tokio::select!`.
    pub async fn notified(&self) {
        if self.is_shutdown() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod shutdown_tests;
