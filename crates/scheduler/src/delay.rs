//! Delay ranges and the random roll that turns them into deadlines.
//!
//! Scripts schedule abilities as "between 8 and 12 seconds from now". A
//! [`DelayRange`] carries that interval and [`DelayRoller`] picks a uniform
//! value inside it at millisecond granularity. Bad input is corrected on
//! construction and logged, never rejected: a broken timer in one script must
//! not take down the tick loop.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::clock::duration_millis;

/// Inclusive `[min, max]` delay interval. `min <= max` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    pub const ZERO: Self = Self::fixed(Duration::ZERO);

    /// A range that always rolls exactly `delay`.
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    /// A range between `min` and `max`. Swapped (and logged) when reversed.
    pub fn between(min: Duration, max: Duration) -> Self {
        if min > max {
            warn!(
                target: "scheduler::delay",
                min_ms = duration_millis(min),
                max_ms = duration_millis(max),
                "delay range has min > max, swapping bounds"
            );
            return Self { min: max, max: min };
        }
        Self { min, max }
    }

    /// Builds a range from signed millisecond values, clamping negatives to
    /// zero. Script code often computes delays as differences of timers.
    pub fn from_millis(min: i64, max: i64) -> Self {
        let clamp = |value: i64, bound: &'static str| -> Duration {
            if value < 0 {
                warn!(
                    target: "scheduler::delay",
                    bound,
                    value,
                    "negative delay clamped to zero"
                );
                Duration::ZERO
            } else {
                Duration::from_millis(value.unsigned_abs())
            }
        };
        Self::between(clamp(min, "min"), clamp(max, "max"))
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }
}

impl From<Duration> for DelayRange {
    fn from(delay: Duration) -> Self {
        Self::fixed(delay)
    }
}

impl From<(Duration, Duration)> for DelayRange {
    fn from((min, max): (Duration, Duration)) -> Self {
        Self::between(min, max)
    }
}

/// Random source used to roll [`DelayRange`]s.
///
/// Seed it for deterministic replays and tests; the default draws from OS
/// entropy.
#[derive(Clone, Debug)]
pub struct DelayRoller {
    rng: StdRng,
}

impl DelayRoller {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform value in `[range.min(), range.max()]`.
    pub fn roll(&mut self, range: DelayRange) -> Duration {
        if range.is_fixed() {
            return range.min;
        }
        let lo = duration_millis(range.min);
        let hi = duration_millis(range.max);
        Duration::from_millis(self.rng.gen_range(lo..=hi))
    }
}

impl Default for DelayRoller {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let range = DelayRange::between(ms(900), ms(100));
        assert_eq!(range.min(), ms(100));
        assert_eq!(range.max(), ms(900));
    }

    #[test]
    fn negative_millis_clamp_to_zero() {
        let range = DelayRange::from_millis(-50, 200);
        assert_eq!(range.min(), Duration::ZERO);
        assert_eq!(range.max(), ms(200));

        let range = DelayRange::from_millis(-5, -10);
        assert_eq!(range, DelayRange::ZERO);
    }

    #[test]
    fn rolls_stay_inside_range() {
        let mut roller = DelayRoller::seeded(7);
        let range = DelayRange::between(ms(1_000), ms(1_500));
        for _ in 0..500 {
            let delay = roller.roll(range);
            assert!(delay >= range.min() && delay <= range.max());
        }
    }

    #[test]
    fn fixed_range_rolls_exact_value() {
        let mut roller = DelayRoller::seeded(1);
        assert_eq!(roller.roll(ms(5_000).into()), ms(5_000));
    }

    #[test]
    fn same_seed_same_sequence() {
        let range = DelayRange::between(ms(0), ms(10_000));
        let mut a = DelayRoller::seeded(42);
        let mut b = DelayRoller::seeded(42);
        let left: Vec<_> = (0..16).map(|_| a.roll(range)).collect();
        let right: Vec<_> = (0..16).map(|_| b.roll(range)).collect();
        assert_eq!(left, right);
    }
}
