//! C3 — token provider. Access and refresh tokens share cryptographic
//! framing (a compact JWS, RS256 or ES256 depending on the configured key)
//! but carry distinct claim sets semantically: both currently serialize the
//! same fields, so one `Claims` struct backs both token classes.

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{SigningKey, VerifyingKey};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub jti: String,
    pub sub: String,
    pub org_id: String,
    pub session_id: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// What a successful validation reveals — nothing more, nothing less, per
/// §4.3: "On success returns `(session_id, jti, user_id, org_id)`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    pub session_id: String,
    pub jti: String,
    pub user_id: String,
    pub org_id: String,
}

pub struct TokenProvider {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    issuer: String,
    audience: String,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenProvider {
    pub fn new(
        signing_key: SigningKey,
        verifying_key: VerifyingKey,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        access_ttl: chrono::Duration,
        refresh_ttl: chrono::Duration,
    ) -> CryptoResult<Self> {
        let issuer = issuer.into();
        let audience = audience.into();
        if issuer.is_empty() || audience.is_empty() {
            return Err(CryptoError::InvalidKey);
        }
        if access_ttl <= chrono::Duration::zero() || refresh_ttl <= chrono::Duration::zero() {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self {
            signing_key,
            verifying_key,
            issuer,
            audience,
            access_ttl,
            refresh_ttl,
        })
    }

    fn generate_jti() -> String {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn issue(
        &self,
        user_id: &str,
        org_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> CryptoResult<(String, DateTime<Utc>)> {
        let exp = now + ttl;
        let claims = Claims {
            jti: Self::generate_jti(),
            sub: user_id.to_string(),
            org_id: org_id.to_string(),
            session_id: session_id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let header = Header::new(self.signing_key.algorithm);
        let token = encode(&header, &claims, &self.signing_key.key)
            .map_err(|_| CryptoError::InvalidKey)?;
        Ok((token, exp))
    }

    /// Issues an access token, returning `(token, expires_at)`.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        org_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> CryptoResult<(String, DateTime<Utc>)> {
        self.issue(user_id, org_id, session_id, now, self.access_ttl)
    }

    /// Issues a refresh token, returning `(token, jti)`. The caller is
    /// responsible for hashing the token and persisting `(jti, hash)` on the
    /// session before the token leaves the process.
    pub fn issue_refresh_token(
        &self,
        user_id: &str,
        org_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> CryptoResult<(String, String)> {
        let (token, _) = self.issue(user_id, org_id, session_id, now, self.refresh_ttl)?;
        let jti = Self::jti_of(&token)?;
        Ok((token, jti))
    }

    /// The expiry a refresh token issued `now` would carry, for callers that
    /// need to stamp a session row's `expires_at` without re-decoding the
    /// token they just issued.
    pub fn refresh_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.refresh_ttl
    }

    /// Validates a token's signature, expiry, issuer, and audience. Any
    /// failure collapses to a single opaque error — no side channel
    /// distinguishes "expired" from "bad signature" from "wrong audience".
    pub fn validate(&self, token: &str) -> CryptoResult<ValidatedToken> {
        let mut validation = Validation::new(self.verifying_key.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        let data = decode::<Claims>(token, &self.verifying_key.key, &validation)
            .map_err(|_| CryptoError::InvalidToken)?;
        Ok(ValidatedToken {
            session_id: data.claims.session_id,
            jti: data.claims.jti,
            user_id: data.claims.sub,
            org_id: data.claims.org_id,
        })
    }

    /// Extracts the `jti` from a token this provider just signed, without a
    /// second round-trip through `validate` (which would re-check `exp`).
    fn jti_of(token: &str) -> CryptoResult<String> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        let data = decode::<Claims>(
            token,
            &jsonwebtoken::DecodingKey::from_secret(&[]),
            &validation,
        )
        .map_err(|_| CryptoError::InvalidToken)?;
        Ok(data.claims.jti)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{SigningKey, VerifyingKey};
    use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
    use rsa::{RsaPrivateKey, RsaPublicKey};

    /// Generates a fresh RSA key pair for each test run instead of checking
    /// in a fixture PEM, matching how the `rsa` crate's own test suite
    /// exercises round trips.
    fn rsa_key_pair() -> (SigningKey, VerifyingKey) {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        let signing = SigningKey {
            key: EncodingKey::from_rsa_der(private.to_pkcs1_der().unwrap().as_bytes()),
            algorithm: Algorithm::RS256,
        };
        let verifying = VerifyingKey {
            key: DecodingKey::from_rsa_der(public.to_pkcs1_der().unwrap().as_bytes()),
            algorithm: Algorithm::RS256,
        };
        (signing, verifying)
    }

    fn provider_with(signing: SigningKey, verifying: VerifyingKey) -> TokenProvider {
        TokenProvider::new(
            signing,
            verifying,
            "ztcp",
            "ztcp-clients",
            chrono::Duration::minutes(15),
            chrono::Duration::days(30),
        )
        .unwrap()
    }

    #[test]
    fn round_trip_access_token() {
        let (signing, verifying) = rsa_key_pair();
        let provider = provider_with(signing, verifying);
        let now = Utc::now();
        let (token, _exp) = provider
            .issue_access_token("user-1", "org-1", "sess-1", now)
            .unwrap();
        let validated = provider.validate(&token).unwrap();
        assert_eq!(validated.user_id, "user-1");
        assert_eq!(validated.org_id, "org-1");
        assert_eq!(validated.session_id, "sess-1");
    }

    #[test]
    fn refresh_token_jti_matches_across_issue_and_validate() {
        let (signing, verifying) = rsa_key_pair();
        let provider = provider_with(signing, verifying);
        let now = Utc::now();
        let (token, jti) = provider
            .issue_refresh_token("user-1", "org-1", "sess-1", now)
            .unwrap();
        let validated = provider.validate(&token).unwrap();
        assert_eq!(validated.jti, jti);
    }

    #[test]
    fn rejects_token_signed_by_a_different_key_pair() {
        let (signing_a, verifying_a) = rsa_key_pair();
        let provider_a = provider_with(signing_a, verifying_a);
        let (_signing_b, verifying_b) = rsa_key_pair();
        let provider_b_view = TokenProvider::new(
            // never signs with this key in this test; only used to decode
            SigningKey {
                key: EncodingKey::from_secret(b"unused"),
                algorithm: Algorithm::HS256,
            },
            verifying_b,
            "ztcp",
            "ztcp-clients",
            chrono::Duration::minutes(15),
            chrono::Duration::days(30),
        )
        .unwrap();

        let now = Utc::now();
        let (token, _) = provider_a
            .issue_access_token("user-1", "org-1", "sess-1", now)
            .unwrap();
        assert!(provider_a.validate(&token).is_ok());
        assert!(provider_b_view.validate(&token).is_err());
    }

    #[test]
    fn construction_rejects_non_positive_ttls() {
        let (signing, verifying) = rsa_key_pair();
        assert!(TokenProvider::new(
            signing,
            verifying,
            "ztcp",
            "ztcp-clients",
            chrono::Duration::zero(),
            chrono::Duration::days(30),
        )
        .is_err());
    }
}
