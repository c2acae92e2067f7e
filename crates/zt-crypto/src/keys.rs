//! C2 — key loading. Accepts an inline PEM block (sniffed by a `-----BEGIN`
//! prefix) or a filesystem path, and returns a signing key (private) or a
//! verification key (public) plus the JWS algorithm that key implies.
//!
//! Supported shapes: PKCS1 RSA private/public, PKCS8 generic private (must
//! wrap an RSA or ECDSA P-256 key), SEC1 EC private, and PKIX (SPKI) public.
//! Anything else — or empty/unparseable input — is `CryptoError::InvalidKey`.

use crate::error::{CryptoError, CryptoResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use pkcs8::der::Decode;
use pkcs8::PrivateKeyInfo;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey as RsaDecodePkcs8PrivateKey;
use rsa::RsaPrivateKey;
use spki::SubjectPublicKeyInfoRef;
use std::path::Path;

/// OID for `rsaEncryption` (PKCS #1).
const OID_RSA: &str = "1.2.840.113549.1.1.1";
/// OID for `id-ecPublicKey`.
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
/// OID for the `prime256v1` / P-256 named curve.
const OID_P256: &str = "1.2.840.10045.3.1.7";

pub struct SigningKey {
    pub key: EncodingKey,
    pub algorithm: Algorithm,
}

pub struct VerifyingKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

/// Resolves `input` to PEM bytes: an inline block if it starts with
/// `-----BEGIN`, otherwise the contents of the file at that path.
fn resolve_pem(input: &str) -> CryptoResult<Vec<u8>> {
    if input.is_empty() {
        return Err(CryptoError::InvalidKey);
    }
    if input.trim_start().starts_with("-----BEGIN") {
        return Ok(input.as_bytes().to_vec());
    }
    std::fs::read(Path::new(input)).map_err(|_| CryptoError::InvalidKey)
}

fn pem_label(pem: &str) -> Option<&str> {
    let start = pem.find("-----BEGIN ")? + "-----BEGIN ".len();
    let end = pem[start..].find("-----")? + start;
    Some(&pem[start..end])
}

pub fn load_private_key(input: &str) -> CryptoResult<SigningKey> {
    let pem_bytes = resolve_pem(input)?;
    let pem = std::str::from_utf8(&pem_bytes).map_err(|_| CryptoError::InvalidKey)?;
    let label = pem_label(pem).ok_or(CryptoError::InvalidKey)?;

    match label {
        "RSA PRIVATE KEY" => Ok(SigningKey {
            key: EncodingKey::from_rsa_pem(&pem_bytes).map_err(|_| CryptoError::InvalidKey)?,
            algorithm: Algorithm::RS256,
        }),
        "EC PRIVATE KEY" => Ok(SigningKey {
            key: EncodingKey::from_ec_pem(&pem_bytes).map_err(|_| CryptoError::InvalidKey)?,
            algorithm: Algorithm::ES256,
        }),
        "PRIVATE KEY" => load_pkcs8_private_key(pem),
        _ => Err(CryptoError::InvalidKey),
    }
}

/// A generic PKCS8 `BEGIN PRIVATE KEY` block wraps either an RSA or an EC
/// key; the `AlgorithmIdentifier` OID tells us which, then we re-encode to
/// the PKCS1/SEC1 DER form `jsonwebtoken` expects.
fn load_pkcs8_private_key(pem: &str) -> CryptoResult<SigningKey> {
    let der = pkcs8::Document::from_pem(pem)
        .map_err(|_| CryptoError::InvalidKey)?
        .1;
    let info = PrivateKeyInfo::from_der(der.as_bytes()).map_err(|_| CryptoError::InvalidKey)?;
    let oid = info.algorithm.oid.to_string();

    if oid == OID_RSA {
        let rsa_key =
            RsaPrivateKey::from_pkcs8_der(der.as_bytes()).map_err(|_| CryptoError::InvalidKey)?;
        let pkcs1_der = rsa_key
            .to_pkcs1_der()
            .map_err(|_| CryptoError::InvalidKey)?;
        return Ok(SigningKey {
            key: EncodingKey::from_rsa_der(pkcs1_der.as_bytes()),
            algorithm: Algorithm::RS256,
        });
    }

    if oid == OID_EC_PUBLIC_KEY {
        let curve_oid = info
            .algorithm
            .parameters_oid()
            .map_err(|_| CryptoError::InvalidKey)?
            .to_string();
        if curve_oid != OID_P256 {
            return Err(CryptoError::InvalidKey);
        }
        let secret = p256::SecretKey::from_pkcs8_der(der.as_bytes())
            .map_err(|_| CryptoError::InvalidKey)?;
        let sec1_der = secret
            .to_sec1_der()
            .map_err(|_| CryptoError::InvalidKey)?;
        return Ok(SigningKey {
            key: EncodingKey::from_ec_der(&sec1_der),
            algorithm: Algorithm::ES256,
        });
    }

    Err(CryptoError::InvalidKey)
}

pub fn load_public_key(input: &str) -> CryptoResult<VerifyingKey> {
    let pem_bytes = resolve_pem(input)?;
    let pem = std::str::from_utf8(&pem_bytes).map_err(|_| CryptoError::InvalidKey)?;
    let label = pem_label(pem).ok_or(CryptoError::InvalidKey)?;

    match label {
        "RSA PUBLIC KEY" => {
            let der = pkcs8::Document::from_pem(pem)
                .map_err(|_| CryptoError::InvalidKey)?
                .1;
            let _ = rsa::RsaPublicKey::from_pkcs1_der(der.as_bytes())
                .map_err(|_| CryptoError::InvalidKey)?;
            Ok(VerifyingKey {
                key: DecodingKey::from_rsa_der(der.as_bytes()),
                algorithm: Algorithm::RS256,
            })
        }
        "PUBLIC KEY" => load_pkix_public_key(pem),
        _ => Err(CryptoError::InvalidKey),
    }
}

fn load_pkix_public_key(pem: &str) -> CryptoResult<VerifyingKey> {
    let der = pkcs8::Document::from_pem(pem)
        .map_err(|_| CryptoError::InvalidKey)?
        .1;
    let spki = SubjectPublicKeyInfoRef::try_from(der.as_bytes()).map_err(|_| CryptoError::InvalidKey)?;
    let oid = spki.algorithm.oid.to_string();

    if oid == OID_RSA {
        let rsa_key =
            rsa::RsaPublicKey::try_from(spki).map_err(|_| CryptoError::InvalidKey)?;
        let pkcs1_der = rsa_key
            .to_pkcs1_der()
            .map_err(|_| CryptoError::InvalidKey)?;
        return Ok(VerifyingKey {
            key: DecodingKey::from_rsa_der(pkcs1_der.as_bytes()),
            algorithm: Algorithm::RS256,
        });
    }

    if oid == OID_EC_PUBLIC_KEY {
        let curve_oid = spki
            .algorithm
            .parameters_oid()
            .map_err(|_| CryptoError::InvalidKey)?
            .to_string();
        if curve_oid != OID_P256 {
            return Err(CryptoError::InvalidKey);
        }
        let point_bytes = spki.subject_public_key.raw_bytes();
        return Ok(VerifyingKey {
            key: DecodingKey::from_ec_der(point_bytes),
            algorithm: Algorithm::ES256,
        });
    }

    Err(CryptoError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_invalid_key() {
        assert!(matches!(
            load_private_key(""),
            Err(CryptoError::InvalidKey)
        ));
        assert!(matches!(load_public_key(""), Err(CryptoError::InvalidKey)));
    }

    #[test]
    fn unparseable_pem_is_invalid_key() {
        assert!(matches!(
            load_private_key("-----BEGIN NONSENSE-----\nnope\n-----END NONSENSE-----\n"),
            Err(CryptoError::InvalidKey)
        ));
    }

    #[test]
    fn missing_path_is_invalid_key() {
        assert!(matches!(
            load_private_key("/nonexistent/path/to/key.pem"),
            Err(CryptoError::InvalidKey)
        ));
    }
}
