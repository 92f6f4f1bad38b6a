use super::*;

const BASE: Duration = Duration::from_secs(60);
const MAX: Duration = Duration::from_secs(3600);
const JITTER: f64 = 0.1;

#[test]
fn delay_falls_within_jitter_bounds_for_each_retry_count() {
    for retry_count in 0..=15 {
        let expected_base = (BASE.as_secs_f64() * 2f64.powi(retry_count.min(10))).min(MAX.as_secs_f64());
        let lower = expected_base * (1.0 - JITTER);
        let upper = expected_base * (1.0 + JITTER);

        for _ in 0..20 {
            let delay = compute_backoff_delay(retry_count, BASE, MAX, JITTER).as_secs_f64();
            assert!(
                delay >= lower - 0.001 && delay <= upper + 0.001,
                "retry_count={retry_count} delay={delay} expected [{lower}, {upper}]"
            );
        }
    }
}

#[test]
fn exponent_is_capped_at_ten() {
    let at_cap = compute_backoff_delay(10, BASE, MAX, 0.0);
    let beyond_cap = compute_backoff_delay(50, BASE, MAX, 0.0);
    assert_eq!(at_cap, beyond_cap);
}

#[test]
fn delay_never_exceeds_max() {
    for retry_count in [8, 9, 10, 20] {
        let delay = compute_backoff_delay(retry_count, BASE, MAX, JITTER);
        assert!(delay <= MAX.mul_f64(1.0 + JITTER));
    }
}

#[test]
fn delay_never_drops_below_floor() {
    // A large negative jitter draw must still be floored at max(base/2, 1s).
    let floor = (BASE / 2).max(Duration::from_secs(1));
    for _ in 0..200 {
        let delay = compute_backoff_delay(0, BASE, MAX, 0.99);
        assert!(delay >= floor, "delay {delay:?} below floor {floor:?}");
    }
}

#[test]
fn zero_jitter_is_deterministic() {
    let a = compute_backoff_delay(3, BASE, MAX, 0.0);
    let b = compute_backoff_delay(3, BASE, MAX, 0.0);
    assert_eq!(a, b);
}
