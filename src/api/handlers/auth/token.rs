//! Signed, time-bound bearer tokens (HS256 JWT).
//!
//! Issue and verify are pure cryptographic operations: expiry and signature
//! are enforced here, independently of the session store. Revocability comes
//! from the server-side session record, not from the token itself.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BearerTokenHeader {
    pub alg: String,
    pub typ: String,
}

impl BearerTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BearerTokenClaims {
    /// User id the token was issued to.
    pub sub: Uuid,
    /// Issued-at, unix seconds. Compared against the user's last password
    /// change during the per-request authentication check.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    InvalidKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Create an HS256 signed bearer token.
///
/// # Errors
///
/// Returns an error if the claims/header JSON cannot be encoded or the key is
/// rejected by the MAC.
pub fn sign_hs256(secret: &[u8], claims: &BearerTokenClaims) -> Result<String, Error> {
    let header_b64 = b64e_json(&BearerTokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 bearer token and return its decoded claims.
///
/// # Errors
///
/// Returns an error if:
/// - the token is malformed or contains invalid base64/json,
/// - the algorithm is not HS256,
/// - the signature does not match,
/// - the token is expired at `now_unix_seconds`.
pub fn verify_hs256(
    token: &str,
    secret: &[u8],
    now_unix_seconds: i64,
) -> Result<BearerTokenClaims, Error> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }

    let header: BearerTokenHeader = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    // verify_slice is a constant-time comparison.
    mac.verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    let claims: BearerTokenClaims = b64d_json(claims_b64)?;
    if claims.exp <= now_unix_seconds {
        return Err(Error::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const SECRET: &[u8] = b"test-signing-secret";

    fn test_claims() -> BearerTokenClaims {
        BearerTokenClaims {
            sub: Uuid::nil(),
            iat: NOW,
            exp: NOW + 3600,
        }
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), Error> {
        let token = sign_hs256(SECRET, &test_claims())?;
        let verified = verify_hs256(&token, SECRET, NOW)?;
        assert_eq!(verified, test_claims());
        Ok(())
    }

    #[test]
    fn rejects_wrong_secret() -> Result<(), Error> {
        let token = sign_hs256(SECRET, &test_claims())?;
        let result = verify_hs256(&token, b"other-secret", NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_tampered_claims() -> Result<(), Error> {
        let token = sign_hs256(SECRET, &test_claims())?;
        let mut parts: Vec<&str> = token.split('.').collect();

        let mut forged = test_claims();
        forged.sub = Uuid::new_v4();
        let forged_b64 = b64e_json(&forged)?;
        parts[1] = &forged_b64;
        let forged_token = parts.join(".");

        let result = verify_hs256(&forged_token, SECRET, NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_expired_token() -> Result<(), Error> {
        let token = sign_hs256(SECRET, &test_claims())?;
        let result = verify_hs256(&token, SECRET, NOW + 9999);
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(
            verify_hs256("only-one-part", SECRET, NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            verify_hs256("a.b.c.d", SECRET, NOW),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            verify_hs256("!!.!!.!!", SECRET, NOW),
            Err(Error::Base64)
        ));
    }

    #[test]
    fn rejects_unsupported_algorithm() -> Result<(), Error> {
        // Algorithm is checked before the signature, so a garbage signature
        // still surfaces the alg error.
        let header = BearerTokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let token = format!("{}.{}.{}", b64e_json(&header)?, b64e_json(&test_claims())?, "AAAA");
        let result = verify_hs256(&token, SECRET, NOW);
        assert!(matches!(result, Err(Error::UnsupportedAlg(alg)) if alg == "none"));
        Ok(())
    }
}
