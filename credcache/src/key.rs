use std::fmt;

use crate::{ClientIdRef, SecretIdRef};

/// The cache key for one pair of client credentials
///
/// Encoded as `<byte length of client ID>:<client ID><secret ID>`. The length
/// prefix fixes where the client ID ends, so no two distinct pairs share a
/// key regardless of which characters the identifiers contain.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    encoded: Box<str>,
    start: usize,
    split: usize,
}

impl CacheKey {
    /// Derives the key for a credential pair
    pub fn new(client_id: &ClientIdRef, secret_id: &SecretIdRef) -> Self {
        let client_id = client_id.as_str();
        let secret_id = secret_id.as_str();
        let prefix = client_id.len().to_string();

        let mut encoded =
            String::with_capacity(prefix.len() + 1 + client_id.len() + secret_id.len());
        encoded.push_str(&prefix);
        encoded.push(':');
        encoded.push_str(client_id);
        encoded.push_str(secret_id);

        Self {
            encoded: encoded.into_boxed_str(),
            start: prefix.len() + 1,
            split: prefix.len() + 1 + client_id.len(),
        }
    }

    /// The encoded form of the key
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// The client ID this key was derived from
    #[inline]
    pub fn client_id(&self) -> &str {
        &self.encoded[self.start..self.split]
    }

    /// The secret ID this key was derived from
    #[inline]
    pub fn secret_id(&self) -> &str {
        &self.encoded[self.split..]
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.as_str()).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    fn key(client_id: &str, secret_id: &str) -> Result<CacheKey> {
        Ok(CacheKey::new(
            ClientIdRef::from_str(client_id)?,
            SecretIdRef::from_str(secret_id)?,
        ))
    }

    #[test]
    fn encodes_with_length_prefix() -> Result<()> {
        assert_eq!(key("C1", "S1")?.as_str(), "2:C1S1");
        Ok(())
    }

    #[test]
    fn is_deterministic() -> Result<()> {
        assert_eq!(key("client", "secret")?, key("client", "secret")?);
        Ok(())
    }

    #[test]
    fn shifted_boundaries_do_not_collide() -> Result<()> {
        assert_ne!(key("xy", "z")?, key("x", "yz")?);
        assert_ne!(key("a:b", "c")?, key("a", "b:c")?);
        assert_ne!(key("1:a", "b")?, key("1", ":ab")?);
        Ok(())
    }

    #[test]
    fn order_matters() -> Result<()> {
        assert_ne!(key("left", "right")?, key("right", "left")?);
        Ok(())
    }

    #[test]
    fn decodes_back_into_parts() -> Result<()> {
        let k = key("10:tenant:app", "secret:1")?;
        assert_eq!(k.client_id(), "10:tenant:app");
        assert_eq!(k.secret_id(), "secret:1");
        Ok(())
    }
}
