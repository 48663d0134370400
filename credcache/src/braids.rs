use aliri_braid::braid;
use std::fmt;
use thiserror::Error;

macro_rules! limited_reveal {
    ($ty:ty: $hidden:literal, $default:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    f.write_str("\"")?;
                    limited_reveal(self.as_str(), &mut *f, $default)?;
                    f.write_str("\"")
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    limited_reveal(self.as_str(), &mut *f, usize::MAX)
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }
    };
}

/// Writes at most `width` (or `default_len`) characters, ending in `…` when cut short
fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

/// A malformed credential identifier
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidCredential {
    /// The client ID was the empty string
    #[error("client ID cannot be empty")]
    EmptyClientId,
    /// The secret ID was the empty string
    #[error("secret ID cannot be empty")]
    EmptySecretId,
}

aliri_braid::from_infallible!(InvalidCredential);

/// The client ID of a registered application
///
/// Any non-empty string is a valid client ID.
#[braid(
    serde,
    validator,
    ref_doc = "A borrowed reference to a [`ClientId`]"
)]
pub struct ClientId;

impl aliri_braid::Validator for ClientId {
    type Error = InvalidCredential;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if s.is_empty() {
            Err(InvalidCredential::EmptyClientId)
        } else {
            Ok(())
        }
    }
}

/// The identifier of a client secret
///
/// This names which secret of the client was used, not the secret value,
/// so it is safe to log. Any non-empty string is a valid secret ID.
#[braid(
    serde,
    validator,
    ref_doc = "A borrowed reference to a [`SecretId`]"
)]
pub struct SecretId;

impl aliri_braid::Validator for SecretId {
    type Error = InvalidCredential;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if s.is_empty() {
            Err(InvalidCredential::EmptySecretId)
        } else {
            Ok(())
        }
    }
}

/// The principal that a token was issued for
#[braid(serde, ref_doc = "A borrowed reference to a [`UserId`]")]
pub struct UserId;

/// An opaque access token
///
/// The cache never looks inside a token. `Debug` and `Display` hide the
/// value unless the alternate flag is given, in which case a prefix is
/// revealed (bounded by the format width, if any).
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ref_doc = "A borrowed reference to an [`AccessToken`]"
)]
pub struct AccessToken;

limited_reveal!(AccessTokenRef: "ACCESS TOKEN", 15);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_client_id_is_rejected() {
        let x = ClientIdRef::from_str("");
        assert!(matches!(x, Err(InvalidCredential::EmptyClientId)));
    }

    #[test]
    fn empty_secret_id_is_rejected() {
        let x = SecretId::new(String::new());
        assert!(matches!(x, Err(InvalidCredential::EmptySecretId)));
    }

    #[test]
    fn separators_are_ordinary_characters() {
        let x = ClientIdRef::from_str("tenant:app").unwrap();
        assert_eq!(x.as_str(), "tenant:app");
    }

    #[test]
    fn access_token_is_hidden_by_default() {
        let token = AccessToken::from_static("eyJhbGciOiJIUzI1NiJ9.payload.signature");
        assert_eq!(format!("{}", token), "***ACCESS TOKEN***");
        assert_eq!(format!("{:?}", token), "***ACCESS TOKEN***");
    }

    #[test]
    fn access_token_reveals_prefix_when_alternate() {
        let token = AccessToken::from_static("eyJhbGciOiJIUzI1NiJ9.payload.signature");
        assert_eq!(format!("{:#?}", token), "\"eyJhbGciOiJIUz…\"");
        assert_eq!(format!("{:#6}", token), "eyJhb…");
        assert_eq!(format!("{:#}", AccessToken::from_static("short")), "short");
    }
}
