use credcache_clock::{Clock, DurationSecs, System, UnixTime};
use serde::{Deserialize, Serialize};

use crate::{AccessToken, AccessTokenRef, UserId, UserIdRef};

/// An issued access token along with who it was issued for and when it expires
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    access_token: AccessToken,
    user_id: UserId,
    expiry: UnixTime,
}

/// A token's validity as of some instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    /// The token may still be used
    Valid,
    /// The token's expiry is at or before the instant in question
    Expired,
}

impl TokenRecord {
    /// Constructs a new token record
    pub fn new(access_token: AccessToken, user_id: UserId, expiry: UnixTime) -> Self {
        Self {
            access_token,
            user_id,
            expiry,
        }
    }

    /// Constructs a token record that expires `lifetime` after the clock's current time
    pub fn issued_now<C: Clock>(
        access_token: AccessToken,
        user_id: UserId,
        lifetime: DurationSecs,
        clock: &C,
    ) -> Self {
        Self::new(access_token, user_id, clock.now() + lifetime)
    }

    /// Gets the access token
    #[inline]
    pub fn access_token(&self) -> &AccessTokenRef {
        &self.access_token
    }

    /// Gets the principal the token was issued for
    #[inline]
    pub fn user_id(&self) -> &UserIdRef {
        &self.user_id
    }

    /// Gets the time at which the token stops being valid
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Gets the token's current status according to the system clock
    #[inline]
    pub fn token_status(&self) -> TokenStatus {
        self.token_status_with_clock(&System)
    }

    /// Gets the token's status based on the current time as reported by the provided clock
    #[inline]
    pub fn token_status_with_clock<C: Clock>(&self, clock: &C) -> TokenStatus {
        self.token_status_at(clock.now())
    }

    /// Gets the token's status as of the provided time
    ///
    /// A token is valid strictly before its expiry.
    #[inline]
    pub fn token_status_at(&self, time: UnixTime) -> TokenStatus {
        if time < self.expiry {
            TokenStatus::Valid
        } else {
            TokenStatus::Expired
        }
    }

    #[inline]
    pub(crate) fn is_valid_at(&self, time: UnixTime) -> bool {
        matches!(self.token_status_at(time), TokenStatus::Valid)
    }

    /// Gets a duration for how much longer the token would be valid as of the provided time
    #[inline]
    pub fn until_expired_at(&self, time: UnixTime) -> DurationSecs {
        self.expiry - time
    }
}

#[cfg(test)]
mod tests {
    use credcache_clock::TestClock;

    use super::*;

    fn record(expiry: u64) -> TokenRecord {
        TokenRecord::new(
            AccessToken::from_static("tok"),
            UserId::from_static("user"),
            UnixTime(expiry),
        )
    }

    #[test]
    fn valid_strictly_before_expiry() {
        let r = record(100);
        assert_eq!(r.token_status_at(UnixTime(99)), TokenStatus::Valid);
        assert_eq!(r.token_status_at(UnixTime(100)), TokenStatus::Expired);
        assert_eq!(r.token_status_at(UnixTime(101)), TokenStatus::Expired);
    }

    #[test]
    fn status_against_system_clock() {
        assert_eq!(record(0).token_status(), TokenStatus::Expired);
        assert_eq!(record(u64::MAX).token_status(), TokenStatus::Valid);
    }

    #[test]
    fn remaining_lifetime_saturates() {
        let r = record(100);
        assert_eq!(r.until_expired_at(UnixTime(40)), DurationSecs(60));
        assert_eq!(r.until_expired_at(UnixTime(400)), DurationSecs(0));
    }

    #[test]
    fn issued_now_counts_from_the_clock() {
        let clock = TestClock::new(UnixTime(1_000));
        let r = TokenRecord::issued_now(
            AccessToken::from_static("tok"),
            UserId::from_static("user"),
            DurationSecs(3_600),
            &clock,
        );
        assert_eq!(r.expiry(), UnixTime(4_600));
        assert_eq!(r.token_status_with_clock(&clock), TokenStatus::Valid);
    }

    #[test]
    fn serializes_as_flat_json() {
        let json = serde_json::to_value(record(5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "access_token": "tok", "user_id": "user", "expiry": 5 })
        );
    }
}
