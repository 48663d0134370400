//! Token issuers and the caching layer in front of them

use async_trait::async_trait;
use std::error;

use crate::{ClientIdRef, SecretIdRef, TokenRecord};

pub mod caching;
pub mod constant;

pub use caching::CachingIssuer;
pub use constant::ConstTokenIssuer;

/// An asynchronous authority that exchanges client credentials for a token
///
/// Implementations own everything about how the exchange happens (building
/// a signed assertion, calling the sign-in endpoint). The cache only sees the
/// resulting [`TokenRecord`].
#[async_trait]
pub trait AsyncTokenIssuer: Send + Sync {
    /// The error type returned in the event that issuing a token fails
    type Error: error::Error + Send + Sync + 'static;

    /// Requests a new token for the given credentials
    async fn issue_token(
        &self,
        client_id: &ClientIdRef,
        secret_id: &SecretIdRef,
    ) -> Result<TokenRecord, Self::Error>;
}
