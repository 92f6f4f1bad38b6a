// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Exponential backoff with jitter for failed resources.

use std::time::Duration;

use rand::Rng;

/// `delay = min(base * 2^min(retry_count, 10), max_delay) * (1 + U(-jitter, +jitter))`,
/// floored at `max(base/2, 1s)` so a large negative jitter draw can never
/// collapse the delay to near zero.
pub fn compute_backoff_delay(retry_count: i32, base: Duration, max_delay: Duration, jitter: f64) -> Duration {
    let exponent = retry_count.clamp(0, 10) as u32;
    let capped = base.saturating_mul(1u32 << exponent).min(max_delay);

    let jitter_factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
    let floor = (base / 2).max(Duration::from_secs(1));

    capped.mul_f64(jitter_factor.max(0.0)).max(floor)
}

#[cfg(test)]
#[path = "requeue_tests.rs"]
mod requeue_tests;
