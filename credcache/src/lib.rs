//! An in-memory cache of access tokens keyed by client credentials
//!
//! Signing in to a third-party authority with a pair of client credentials
//! produces an access token, the principal it was issued for, and the time at
//! which it expires. This crate remembers that result so that later requests
//! with the same credentials can reuse the token instead of signing in again.
//!
//! The [`CredentialTokenCache`] is the core. It is a plain object rather than
//! a global. Construct it once, share it behind an [`Arc`][std::sync::Arc], and
//! inject a [`Clock`][credcache_clock::Clock] to control time in tests.
//! Expired tokens are never returned. They are swept lazily on every read.
//!
//! ```
//! use credcache::{AccessToken, ClientId, CredentialTokenCache, SecretId, UserId};
//! use credcache_clock::{Clock, DurationSecs, SharedTestClock, UnixTime};
//!
//! # fn main() -> Result<(), credcache::InvalidCredential> {
//! let clock = SharedTestClock::new(UnixTime(1_700_000_000));
//! let cache = CredentialTokenCache::with_clock(clock.clone());
//!
//! let client_id = ClientId::new("C1".to_owned())?;
//! let secret_id = SecretId::new("S1".to_owned())?;
//!
//! cache.put(
//!     &client_id,
//!     &secret_id,
//!     UserId::from_static("U1"),
//!     clock.now() + DurationSecs(3600),
//!     AccessToken::from_static("tok-A"),
//! );
//!
//! let token = cache.get(&client_id, &secret_id).expect("token is still valid");
//! assert_eq!(token.user_id().as_str(), "U1");
//!
//! clock.advance(DurationSecs(3600));
//! assert!(cache.get(&client_id, &secret_id).is_none());
//! # Ok(())
//! # }
//! ```
//!
//! # Issuing on a miss
//!
//! Most callers want "a valid token, signing in only if necessary". Wrap the
//! code that talks to the authority in an
//! [`AsyncTokenIssuer`][issuers::AsyncTokenIssuer] and put a
//! [`CachingIssuer`][issuers::CachingIssuer] in front of it. When a downstream
//! service rejects a token, call
//! [`invalidate`][issuers::CachingIssuer::invalidate] so the next request
//! signs in again.
//!
//! Concurrent misses for the same credentials are not coalesced. Each one
//! signs in, and the token stored last is the one that stays cached.
//!
//! This crate includes an example of fronting an issuer with the cache in the
//! examples folder.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod cache;
pub mod issuers;
mod key;
mod tokens;

pub use braids::*;
pub use cache::CredentialTokenCache;
pub use key::CacheKey;
pub use tokens::{TokenRecord, TokenStatus};
