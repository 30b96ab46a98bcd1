//! Signed bearer tokens for the admin API.
//!
//! A token is `base64url(claims_json) "." hex(hmac_sha256(secret, base64_part))`.
//! Tokens are stateless: revocation happens by demoting or deleting the user,
//! which the admin extractor checks on every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use taxpoint_core::UserId;

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

/// How long an admin token stays valid.
pub const TOKEN_TTL_HOURS: i64 = 12;

/// Errors that can occur when issuing or verifying a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not two dot-separated parts, or undecodable.
    #[error("malformed token")]
    Malformed,

    /// Signature did not match.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Past its expiry time.
    #[error("token expired")]
    Expired,

    /// Claims could not be encoded.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Claims carried in an admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// User id.
    pub sub: UserId,
    /// Email at issue time (informational).
    pub email: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// A freshly issued token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies admin tokens with a shared HMAC key.
#[derive(Clone)]
pub struct AdminTokenSigner {
    secret: SecretString,
}

impl AdminTokenSigner {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Issue a token for `user` valid for [`TOKEN_TTL_HOURS`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if the claims cannot be serialized.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + Duration::hours(TOKEN_TTL_HOURS);
        let claims = AdminClaims {
            sub: user.id,
            email: user.email.to_string(),
            exp: expires_at.timestamp(),
        };

        let json = serde_json::to_vec(&claims).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{payload}.{signature}"),
            expires_at,
        })
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed`, `InvalidSignature` or `Expired`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AdminClaims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: AdminClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Compare a submitted admin key with the configured one in constant time.
///
/// Both sides are hashed first so the comparison length never depends on
/// the input.
#[must_use]
pub fn admin_key_matches(provided: &str, expected: &SecretString) -> bool {
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.expose_secret().as_bytes());

    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use taxpoint_core::{AuthProvider, Email, UserRole};

    use super::*;

    fn admin() -> User {
        User {
            id: UserId::new(7),
            name: "Priya".to_string(),
            email: Email::parse("priya@taxpoint.test").unwrap(),
            password_hash: None,
            image: None,
            role: UserRole::Admin,
            provider: AuthProvider::Credentials,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn signer() -> AdminTokenSigner {
        AdminTokenSigner::new(SecretString::from("Zp9Lm4Xw1Vb8Nc3Hd6Tf0Gj5Ysk7Rq2@"))
    }

    #[test]
    fn test_issue_then_verify() {
        let now = Utc::now();
        let issued = signer().issue(&admin(), now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::hours(12));

        let claims = signer().verify(&issued.token, now).unwrap();
        assert_eq!(claims.sub, UserId::new(7));
        assert_eq!(claims.email, "priya@taxpoint.test");
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let now = Utc::now();
        let issued = signer().issue(&admin(), now).unwrap();
        let (_, signature) = issued.token.split_once('.').unwrap();

        let forged_claims = AdminClaims {
            sub: UserId::new(1),
            email: "priya@taxpoint.test".to_string(),
            exp: (now + Duration::hours(100)).timestamp(),
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");

        assert_eq!(
            signer().verify(&forged, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_other_secret() {
        let now = Utc::now();
        let issued = signer().issue(&admin(), now).unwrap();
        let other = AdminTokenSigner::new(SecretString::from("k7Rq2Zp9Lm4Xw1Vb8Nc3Hd6Tf0Gj5Ys!"));
        assert_eq!(
            other.verify(&issued.token, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_expired() {
        let issued_at = Utc::now() - Duration::hours(13);
        let issued = signer().issue(&admin(), issued_at).unwrap();
        assert_eq!(
            signer().verify(&issued.token, Utc::now()),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_rejects_malformed() {
        let now = Utc::now();
        assert_eq!(signer().verify("", now), Err(TokenError::Malformed));
        assert_eq!(signer().verify("abc", now), Err(TokenError::Malformed));
        assert_eq!(signer().verify("abc.zz", now), Err(TokenError::Malformed));
    }

    #[test]
    fn test_admin_key_matches() {
        let key = SecretString::from("Qm8#vT2pLx9!rW4z");
        assert!(admin_key_matches("Qm8#vT2pLx9!rW4z", &key));
        assert!(!admin_key_matches("Qm8#vT2pLx9!rW4", &key));
        assert!(!admin_key_matches("", &key));
    }
}
