//! An issuer that always hands out the same token

use std::convert::Infallible;

use async_trait::async_trait;
use credcache_clock::{Clock, DurationSecs, System};

use super::AsyncTokenIssuer;
use crate::{AccessToken, ClientIdRef, SecretIdRef, TokenRecord, UserId};

/// A token issuer that returns a fixed token for any credentials
///
/// Each issued record expires `lifetime` after the issuer's clock reads at
/// the time of issue. Mostly useful for demos and tests.
#[derive(Clone, Debug)]
pub struct ConstTokenIssuer<C = System> {
    access_token: AccessToken,
    user_id: UserId,
    lifetime: DurationSecs,
    clock: C,
}

impl ConstTokenIssuer<System> {
    /// Constructs a new constant issuer using the system clock
    pub fn new(access_token: AccessToken, user_id: UserId, lifetime: DurationSecs) -> Self {
        Self {
            access_token,
            user_id,
            lifetime,
            clock: System,
        }
    }
}

impl<C> ConstTokenIssuer<C> {
    /// Sets a custom clock to be used
    pub fn with_clock<D>(self, clock: D) -> ConstTokenIssuer<D> {
        ConstTokenIssuer {
            access_token: self.access_token,
            user_id: self.user_id,
            lifetime: self.lifetime,
            clock,
        }
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> AsyncTokenIssuer for ConstTokenIssuer<C> {
    type Error = Infallible;

    async fn issue_token(
        &self,
        _client_id: &ClientIdRef,
        _secret_id: &SecretIdRef,
    ) -> Result<TokenRecord, Self::Error> {
        Ok(TokenRecord::issued_now(
            self.access_token.clone(),
            self.user_id.clone(),
            self.lifetime,
            &self.clock,
        ))
    }
}
