//! Jitter for restart delays.
//!
//! When several processes crash together (shared dependency down, machine
//! hiccup), identical backoff delays make them all retry in lockstep.
//! [`JitterPolicy`] spreads the retries out.
//!
//! - [`JitterPolicy::None`] — exact delays; predictable, used in tests.
//! - [`JitterPolicy::Full`] — uniform in `[0, delay]`; maximum spread.
//! - [`JitterPolicy::Equal`] — `delay/2 + uniform[0, delay/2]`; keeps at
//!   least half the computed delay (the default used by
//!   [`BackoffPolicy::default`](crate::BackoffPolicy::default)).

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of restart delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the exact computed delay.
    #[default]
    None,
    /// Uniform random delay in `[0, delay]`.
    Full,
    /// `delay/2` plus uniform random in `[0, delay/2]`.
    Equal,
}

impl JitterPolicy {
    /// Applies this jitter to a computed delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => {
                let mut rng = rand::rng();
                Duration::from_millis(rng.random_range(0..=ms))
            }
            JitterPolicy::Equal => {
                let half = ms / 2;
                let extra = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + extra)
            }
        }
    }
}
