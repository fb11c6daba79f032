//! Bounded exponential reconnect delays.
//!
//! The broker will be intermittently unreachable for the lifetime of the
//! service, so reconnect pacing has to be boring: start small, double up
//! to a fixed cap, add jitter so restarted instances do not reconnect in
//! lockstep, and reset once a subscription is established.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with a fixed cap and +/-10% jitter.
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    next: Duration,
}

impl Backoff {
    /// Create a backoff starting at `base` and capped at `cap`.
    pub fn new(base: Duration, cap: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            base,
            cap: cap.max(base),
            next: base,
        }
    }

    /// Return the delay to sleep before the next attempt and advance the
    /// schedule.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.next;
        self.next = current.saturating_mul(2).min(self.cap);
        jitter(current)
    }

    /// Reset to the base delay after a successful subscribe.
    pub fn reset(&mut self) {
        self.next = self.base;
    }
}

/// Spread a delay by up to +/-10% to avoid synchronized reconnect storms.
fn jitter(delay: Duration) -> Duration {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let tenth = millis / 10;
    if tenth == 0 {
        return delay;
    }
    let offset = rand::rng().random_range(0..=tenth.saturating_mul(2));
    Duration::from_millis(millis.saturating_sub(tenth).saturating_add(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strip jitter: a delay within +/-10% of `expected` millis.
    fn close_to(actual: Duration, expected: u64) {
        let millis = u64::try_from(actual.as_millis()).unwrap_or(0);
        let tenth = expected / 10;
        assert!(
            millis >= expected.saturating_sub(tenth) && millis <= expected.saturating_add(tenth),
            "expected ~{expected}ms, got {millis}ms"
        );
    }

    #[test]
    fn delays_double_up_to_the_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(400));
        close_to(backoff.next_delay(), 100);
        close_to(backoff.next_delay(), 200);
        close_to(backoff.next_delay(), 400);
        // Capped from here on.
        close_to(backoff.next_delay(), 400);
        close_to(backoff.next_delay(), 400);
    }

    #[test]
    fn reset_returns_to_base() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(30));
        let _ = backoff.next_delay();
        let _ = backoff.next_delay();
        backoff.reset();
        close_to(backoff.next_delay(), 100);
    }

    #[test]
    fn zero_base_is_never_zero_forever() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::from_millis(50));
        // The base is floored so the loop cannot spin hot.
        assert!(backoff.next_delay() >= Duration::from_millis(1));
    }

    #[test]
    fn cap_smaller_than_base_is_raised_to_base() {
        let mut backoff = Backoff::new(Duration::from_millis(200), Duration::from_millis(50));
        close_to(backoff.next_delay(), 200);
        close_to(backoff.next_delay(), 200);
    }
}
