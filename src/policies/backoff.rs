//! Backoff policy for restart delays.
//!
//! [`BackoffPolicy`] controls how the delay before a restart grows with the
//! number of restarts already performed. The delay for restart `n`
//! (0-indexed) is `first × factor^n`, clamped to `max`, with jitter applied
//! last. The base is derived purely from the restart count, so jitter never
//! feeds back into later delays.

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Restart backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first restart.
    pub first: Duration,
    /// Cap for all delays.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied to the computed delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns exponential backoff: `first = 100ms`, `max = 30s`,
    /// `factor = 2.0`, equal jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay before restart number `restart` (0-indexed).
    ///
    /// Overflowing or non-finite intermediate values clamp to `max`.
    pub fn delay_for(&self, restart: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = restart.min(i32::MAX as u32) as i32;
        let raw = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !raw.is_finite() || raw < 0.0 || raw > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(raw)
        };

        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(first_ms: u64, max: Duration, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max,
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn restart_zero_uses_first() {
        let p = no_jitter(100, Duration::from_secs(30), 2.0);
        assert_eq!(p.delay_for(0), Duration::from_millis(100));
    }

    #[test]
    fn grows_exponentially() {
        let p = no_jitter(100, Duration::from_secs(30), 2.0);
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn constant_when_factor_is_one() {
        let p = no_jitter(250, Duration::from_secs(30), 1.0);
        for n in 0..8 {
            assert_eq!(p.delay_for(n), Duration::from_millis(250));
        }
    }

    #[test]
    fn clamps_to_max() {
        let p = no_jitter(100, Duration::from_secs(1), 2.0);
        assert_eq!(p.delay_for(20), Duration::from_secs(1));
    }

    #[test]
    fn first_above_max_clamps() {
        let p = no_jitter(10_000, Duration::from_secs(5), 2.0);
        assert_eq!(p.delay_for(0), Duration::from_secs(5));
    }

    #[test]
    fn huge_restart_count_does_not_overflow() {
        let p = no_jitter(100, Duration::from_secs(60), 2.0);
        assert_eq!(p.delay_for(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn equal_jitter_stays_within_bounds() {
        let p = BackoffPolicy {
            first: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::Equal,
        };
        for n in 0..50 {
            let d = p.delay_for(n);
            assert!(d >= Duration::from_millis(500), "{d:?} below half");
            assert!(d <= Duration::from_millis(1000), "{d:?} above base");
        }
    }
}
