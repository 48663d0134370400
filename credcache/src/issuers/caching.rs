//! Reusing cached tokens before asking an issuer for a new one

use std::{error, fmt, sync::Arc};

use async_trait::async_trait;
use credcache_clock::{Clock, DurationSecs, System};

use super::AsyncTokenIssuer;
use crate::{ClientIdRef, CredentialTokenCache, SecretIdRef, TokenRecord, TokenStatus};

/// A token issuer fronted by a shared [`CredentialTokenCache`]
///
/// A request is served from the cache when it holds a record that is valid
/// for at least the configured minimum validity. Otherwise the inner issuer
/// is asked and its token is cached before being returned.
///
/// The cache is never locked while the inner issuer is running. Two
/// requests that miss at the same time will both reach the issuer, and
/// whichever token is stored last is the one that stays cached.
pub struct CachingIssuer<I, C = System> {
    cache: Arc<CredentialTokenCache<C>>,
    issuer: I,
    minimum_validity: DurationSecs,
}

impl<I, C> CachingIssuer<I, C> {
    /// Constructs a caching issuer over a shared cache
    pub fn new(cache: Arc<CredentialTokenCache<C>>, issuer: I) -> Self {
        Self {
            cache,
            issuer,
            minimum_validity: DurationSecs(0),
        }
    }

    /// Sets the minimum validity for any cached token returned
    ///
    /// A cached token with less than `minimum_validity` remaining is treated
    /// as a miss, and a new token is issued in its place. Defaults to zero,
    /// meaning any unexpired token is reused.
    pub fn with_minimum_validity(mut self, minimum_validity: DurationSecs) -> Self {
        self.minimum_validity = minimum_validity;
        self
    }

    /// The shared cache consulted before issuing
    pub fn cache(&self) -> &Arc<CredentialTokenCache<C>> {
        &self.cache
    }

    /// The issuer consulted on a miss
    pub fn inner(&self) -> &I {
        &self.issuer
    }

    /// Forgets any cached token for the credentials
    ///
    /// Intended for when a downstream service rejects the token, so that the
    /// next request obtains a new one.
    pub fn invalidate(&self, client_id: &ClientIdRef, secret_id: &SecretIdRef) {
        tracing::info!(client_id = %client_id, secret_id = %secret_id, "invalidating cached token");
        self.cache.remove(client_id, secret_id);
    }
}

impl<I, C> CachingIssuer<I, C>
where
    I: AsyncTokenIssuer,
    C: Clock,
{
    /// Gets a token for the credentials, issuing a new one only if needed
    ///
    /// Errors from the inner issuer are returned unchanged and leave the
    /// cache untouched.
    #[tracing::instrument(
        level = "debug",
        skip(self, client_id, secret_id),
        fields(client_id = %client_id, secret_id = %secret_id),
    )]
    pub async fn token(
        &self,
        client_id: &ClientIdRef,
        secret_id: &SecretIdRef,
    ) -> Result<TokenRecord, I::Error> {
        if let Some(token) = self.cache.get(client_id, secret_id) {
            let must_be_valid_until = self.cache.clock().now() + self.minimum_validity;

            if token.token_status_at(must_be_valid_until) == TokenStatus::Expired {
                tracing::debug!(
                    must_be_valid_until = must_be_valid_until.0,
                    token_expiry = token.expiry().0,
                    "cached token does not meet minimum validity requirement, issuing new token"
                );
            } else {
                tracing::debug!(token_expiry = token.expiry().0, "returning cached token");
                return Ok(token);
            }
        } else {
            tracing::debug!("no cached token, issuing new token");
        }

        match self.issuer.issue_token(client_id, secret_id).await {
            Ok(token) => {
                tracing::debug!(
                    user_id = %token.user_id(),
                    expiry = token.expiry().0,
                    "issued new token"
                );
                self.cache.put_record(client_id, secret_id, token.clone());
                Ok(token)
            }
            Err(error) => {
                tracing::warn!(
                    error = (&error as &dyn error::Error),
                    "token issuer returned error"
                );
                Err(error)
            }
        }
    }
}

#[async_trait]
impl<I, C> AsyncTokenIssuer for CachingIssuer<I, C>
where
    I: AsyncTokenIssuer,
    C: Clock + Send + Sync,
{
    type Error = I::Error;

    async fn issue_token(
        &self,
        client_id: &ClientIdRef,
        secret_id: &SecretIdRef,
    ) -> Result<TokenRecord, Self::Error> {
        self.token(client_id, secret_id).await
    }
}

impl<I, C> fmt::Debug for CachingIssuer<I, C>
where
    I: fmt::Debug,
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CachingIssuer")
            .field("cache", &self.cache)
            .field("issuer", &self.issuer)
            .field("minimum_validity", &self.minimum_validity)
            .finish()
    }
}
