//! Clocks for time-dependent cache behavior
//!
//! Everything that asks "what time is it?" goes through the [`Clock`] trait so
//! that expiration logic can be driven by a fake clock in tests instead of
//! the wall clock.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_must_use
)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{
    ops,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unix time
///
/// The number of whole seconds elapsed since the beginning of the Unix
/// epoch on 1970/01/01 at 00:00:00 UTC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

/// A span of time in whole seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct DurationSecs(pub u64);

impl From<SystemTime> for UnixTime {
    /// Converts a system time, clamping instants before the epoch to zero
    #[inline]
    fn from(t: SystemTime) -> Self {
        let secs = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        UnixTime(secs)
    }
}

impl From<DurationSecs> for Duration {
    #[inline]
    fn from(d: DurationSecs) -> Self {
        Duration::from_secs(d.0)
    }
}

impl From<Duration> for DurationSecs {
    /// Truncates to whole seconds
    #[inline]
    fn from(d: Duration) -> Self {
        DurationSecs(d.as_secs())
    }
}

impl ops::Add<DurationSecs> for UnixTime {
    type Output = UnixTime;

    #[inline]
    fn add(self, rhs: DurationSecs) -> Self::Output {
        UnixTime(self.0.saturating_add(rhs.0))
    }
}

impl ops::AddAssign<DurationSecs> for UnixTime {
    #[inline]
    fn add_assign(&mut self, rhs: DurationSecs) {
        *self = *self + rhs;
    }
}

impl ops::Sub<DurationSecs> for UnixTime {
    type Output = UnixTime;

    #[inline]
    fn sub(self, rhs: DurationSecs) -> Self::Output {
        UnixTime(self.0.saturating_sub(rhs.0))
    }
}

impl ops::Sub for UnixTime {
    type Output = DurationSecs;

    /// The time elapsed from `rhs` to `self`, or zero if `rhs` is later
    #[inline]
    fn sub(self, rhs: UnixTime) -> Self::Output {
        DurationSecs(self.0.saturating_sub(rhs.0))
    }
}

impl ops::Add for DurationSecs {
    type Output = DurationSecs;

    #[inline]
    fn add(self, rhs: DurationSecs) -> Self::Output {
        DurationSecs(self.0.saturating_add(rhs.0))
    }
}

impl ops::Sub for DurationSecs {
    type Output = DurationSecs;

    #[inline]
    fn sub(self, rhs: DurationSecs) -> Self::Output {
        DurationSecs(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(any(feature = "serde", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl Serialize for UnixTime {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(any(feature = "serde", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> Deserialize<'de> for UnixTime {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self)
    }
}

#[cfg(any(feature = "serde", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl Serialize for DurationSecs {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(any(feature = "serde", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> Deserialize<'de> for DurationSecs {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self)
    }
}

/// Represents a clock, which can tell the current time
pub trait Clock {
    /// Gets the current time according to this clock
    fn now(&self) -> UnixTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> UnixTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> UnixTime {
        (**self).now()
    }
}

/// The system clock as provided by `std::time::SystemTime`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A test clock which maintains the current time as internal state
///
/// Moving the clock requires exclusive access. When the clock has to be
/// moved after it has been handed off, use [`SharedTestClock`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

impl TestClock {
    /// Creates a new test clock with the specified time
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Updates the clock's current time to `val`
    pub fn set(&mut self, val: UnixTime) {
        self.0 = val;
    }

    /// Advances the clock's current time by `inc`
    pub fn advance(&mut self, inc: DurationSecs) {
        self.0 += inc;
    }
}

/// A test clock whose handles all observe the same time
///
/// Clones share state, so a test can keep one handle and move the time seen
/// by a cache that owns another.
#[derive(Clone, Debug, Default)]
pub struct SharedTestClock(Arc<AtomicU64>);

impl SharedTestClock {
    /// Creates a new shared test clock with the specified time
    pub fn new(time: UnixTime) -> Self {
        Self(Arc::new(AtomicU64::new(time.0)))
    }

    /// Updates the current time on every handle to `val`
    pub fn set(&self, val: UnixTime) {
        self.0.store(val.0, Ordering::SeqCst);
    }

    /// Advances the current time on every handle by `inc`
    pub fn advance(&self, inc: DurationSecs) {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(inc.0);
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for SharedTestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime(self.0.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_arithmetic_saturates() {
        assert_eq!(UnixTime(5) - DurationSecs(10), UnixTime(0));
        assert_eq!(UnixTime(5) - UnixTime(10), DurationSecs(0));
        assert_eq!(UnixTime(10) - UnixTime(4), DurationSecs(6));
        assert_eq!(UnixTime(u64::MAX) + DurationSecs(1), UnixTime(u64::MAX));
    }

    #[test]
    fn pre_epoch_system_time_clamps_to_zero() {
        let before = SystemTime::UNIX_EPOCH - Duration::from_secs(30);
        assert_eq!(UnixTime::from(before), UnixTime(0));
    }

    #[test]
    fn test_clock_moves_only_when_told() {
        let mut clock = TestClock::new(UnixTime(100));
        assert_eq!(clock.now(), UnixTime(100));

        clock.advance(DurationSecs(20));
        assert_eq!(clock.now(), UnixTime(120));

        clock.set(UnixTime(7));
        assert_eq!(clock.now(), UnixTime(7));
    }

    #[test]
    fn shared_clock_handles_see_the_same_time() {
        let clock = SharedTestClock::new(UnixTime(1_000));
        let handle = clock.clone();

        clock.advance(DurationSecs(3_600));
        assert_eq!(handle.now(), UnixTime(4_600));

        handle.set(UnixTime(1));
        assert_eq!(clock.now(), UnixTime(1));
    }

    #[test]
    fn shared_clock_advance_saturates() {
        let clock = SharedTestClock::new(UnixTime(u64::MAX - 1));
        clock.advance(DurationSecs(10));
        assert_eq!(clock.now(), UnixTime(u64::MAX));
    }

    #[test]
    fn borrowed_and_arced_clocks_delegate() {
        fn read<C: Clock>(clock: C) -> UnixTime {
            clock.now()
        }

        let clock = TestClock::new(UnixTime(42));
        assert_eq!(read(&clock), UnixTime(42));
        assert_eq!(read(Arc::new(clock)), UnixTime(42));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_seconds() {
        assert_eq!(serde_json::to_string(&UnixTime(1_700_000_000)).unwrap(), "1700000000");
        let d: DurationSecs = serde_json::from_str("3600").unwrap();
        assert_eq!(d, DurationSecs(3600));
    }
}
