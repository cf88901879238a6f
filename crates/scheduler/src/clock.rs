//! Simulation clock values.

use std::fmt;
use std::time::Duration;

/// Absolute simulation time in milliseconds since the owning scheduler was
/// created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Time remaining until `self`, or zero if it already passed.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(duration_millis(rhs)))
    }
}

impl std::ops::AddAssign<Duration> for Timestamp {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Millisecond count of a duration, saturating at `u64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_duration_advances_by_millis() {
        let t = Timestamp(100) + Duration::from_millis(250);
        assert_eq!(t, Timestamp(350));
    }

    #[test]
    fn add_saturates_instead_of_overflowing() {
        let t = Timestamp(u64::MAX - 1) + Duration::from_secs(10);
        assert_eq!(t, Timestamp(u64::MAX));
    }

    #[test]
    fn saturating_since_is_zero_for_past_instants() {
        assert_eq!(
            Timestamp(10).saturating_since(Timestamp(50)),
            Duration::ZERO
        );
        assert_eq!(
            Timestamp(50).saturating_since(Timestamp(10)),
            Duration::from_millis(40)
        );
    }
}
