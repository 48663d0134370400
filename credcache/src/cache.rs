//! The credential-keyed token cache

use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use credcache_clock::{Clock, System, UnixTime};

use crate::{key::CacheKey, AccessToken, ClientIdRef, SecretIdRef, TokenRecord, UserId};

/// An in-memory cache of issued tokens, keyed by client ID and secret ID
///
/// Expired records are never returned. They are dropped lazily: every
/// [`get`][Self::get] first sweeps the whole cache, so there is no
/// background task. Every operation holds one cache-wide lock for its full
/// duration and never awaits, so a `get`'s sweep and lookup cannot
/// interleave with a concurrent `put` or `remove`.
///
/// Racing misses on the same credentials are not deduplicated. Each caller
/// goes to the issuer and the last `put` wins.
pub struct CredentialTokenCache<C = System> {
    records: Mutex<HashMap<CacheKey, TokenRecord>>,
    clock: C,
}

impl CredentialTokenCache<System> {
    /// Constructs an empty cache that reads the system clock
    pub fn new() -> Self {
        Self::with_clock(System)
    }
}

impl Default for CredentialTokenCache<System> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CredentialTokenCache<C> {
    /// Constructs an empty cache that reads the provided clock
    ///
    /// Useful for testing purposes
    pub fn with_clock(clock: C) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Gets the clock used to judge expiration
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The number of records held, including expired records not yet swept
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no records at all
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stores a token for a credential pair
    ///
    /// Overwrites any record already held for the pair. The expiry is not
    /// checked, so a token that has already expired is accepted but will
    /// never be returned by [`get`][Self::get].
    pub fn put(
        &self,
        client_id: &ClientIdRef,
        secret_id: &SecretIdRef,
        user_id: UserId,
        expiry: UnixTime,
        access_token: AccessToken,
    ) {
        self.put_record(
            client_id,
            secret_id,
            TokenRecord::new(access_token, user_id, expiry),
        )
    }

    /// Stores a prebuilt record for a credential pair
    pub fn put_record(
        &self,
        client_id: &ClientIdRef,
        secret_id: &SecretIdRef,
        record: TokenRecord,
    ) {
        let key = CacheKey::new(client_id, secret_id);
        let expiry = record.expiry();

        let prior = self.lock().insert(key.clone(), record);
        if let Some(prior) = prior {
            tracing::debug!(
                %key,
                prior_expiry = prior.expiry().0,
                expiry = expiry.0,
                "replaced cached token"
            );
        } else {
            tracing::trace!(%key, expiry = expiry.0, "cached token");
        }
    }

    /// Removes the record for a credential pair, if any
    pub fn remove(&self, client_id: &ClientIdRef, secret_id: &SecretIdRef) {
        let key = CacheKey::new(client_id, secret_id);
        if self.lock().remove(&key).is_some() {
            tracing::debug!(%key, "removed cached token");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, TokenRecord>> {
        // No critical section can leave the map half-updated.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> CredentialTokenCache<C> {
    /// Gets a still-valid token for a credential pair
    ///
    /// Sweeps all expired records before the lookup. The sweep and the
    /// validity check use the same reading of the clock, so the record
    /// returned, if any, expires strictly after that instant.
    pub fn get(&self, client_id: &ClientIdRef, secret_id: &SecretIdRef) -> Option<TokenRecord> {
        let key = CacheKey::new(client_id, secret_id);
        let now = self.clock.now();

        let mut records = self.lock();
        sweep(&mut records, now);

        match records.get(&key) {
            Some(record) if record.is_valid_at(now) => {
                tracing::trace!(%key, expiry = record.expiry().0, "cache hit");
                Some(record.clone())
            }
            _ => {
                tracing::trace!(%key, "cache miss");
                None
            }
        }
    }

    /// Drops every record whose expiry is at or before the current time
    ///
    /// Returns how many records were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        sweep(&mut self.lock(), now)
    }
}

fn sweep(records: &mut HashMap<CacheKey, TokenRecord>, now: UnixTime) -> usize {
    let before = records.len();
    records.retain(|_, record| record.is_valid_at(now));
    let removed = before - records.len();

    if removed > 0 {
        tracing::debug!(removed, now = now.0, "swept expired tokens");
    }

    removed
}

impl<C: fmt::Debug> fmt::Debug for CredentialTokenCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let records = self.lock();
        f.debug_struct("CredentialTokenCache")
            .field("keys", &records.keys().collect::<Vec<_>>())
            .field("clock", &self.clock)
            .finish()
    }
}
