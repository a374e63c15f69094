use std::time::Duration;

/// Pacing between lock acquisition or release attempts.
///
/// The shipped configuration polls at a fixed interval; the trait lets the
/// policy change without touching the lock contract.
pub trait Backoff: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Waits the same interval between every attempt.
#[derive(Debug, Clone)]
pub struct Fixed(Duration);

impl Fixed {
    pub fn new(interval: Duration) -> Self {
        Self(interval)
    }
}

impl Backoff for Fixed {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Doubles a base interval per attempt, capped.
#[derive(Debug, Clone)]
pub struct Exponential {
    base: Duration,
    max: Duration,
}

impl Exponential {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }
}

impl Backoff for Exponential {
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));

        self.base.saturating_mul(factor).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ignores_attempt() {
        let backoff = Fixed::new(Duration::from_millis(1));

        assert_eq!(backoff.delay(0), Duration::from_millis(1));
        assert_eq!(backoff.delay(100), Duration::from_millis(1));
    }

    #[test]
    fn exponential_doubles_to_cap() {
        let backoff = Exponential::new(Duration::from_millis(100), Duration::from_secs(5));

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(20), Duration::from_secs(5));
    }
}
