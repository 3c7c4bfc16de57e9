//! Loading DAP signing keys from PEM files.
//!
//! Accepted encodings:
//! - `PRIVATE KEY` (PKCS#8, RSA or EC)
//! - `RSA PRIVATE KEY` (PKCS#1)
//! - `EC PRIVATE KEY` (SEC1)
//!
//! Keys are classified rather than rejected here. Whether a key can sign a
//! DAP block is the signer's decision, so an EC key on the wrong curve still
//! loads as [`PrivateKey::UnsupportedEc`].

use std::fmt;
use std::path::Path;

use p256::ecdsa::{SigningKey, VerifyingKey};
use pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

use crate::{Error, Result};

/// `rsaEncryption`
pub const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
/// `id-ecPublicKey`
pub const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// `secp256r1` (P-256)
pub const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

/// A private key as found in a key file.
pub enum PrivateKey {
    /// RSA key of any size.
    Rsa(RsaPrivateKey),
    /// EC key on P-256.
    P256(SigningKey),
    /// EC key on another named curve.
    UnsupportedEc {
        /// Curve OID.
        curve: ObjectIdentifier,
    },
    /// Neither RSA nor EC.
    Unsupported {
        /// Key algorithm OID.
        algorithm: ObjectIdentifier,
    },
}

impl PrivateKey {
    /// Short human-readable description, e.g. `RSA-1024`.
    pub fn describe(&self) -> String {
        match self {
            Self::Rsa(key) => format!("RSA-{}", key.size() * 8),
            Self::P256(_) => "EC P-256".to_string(),
            Self::UnsupportedEc { curve } => format!("EC on curve {curve}"),
            Self::Unsupported { algorithm } => format!("key algorithm {algorithm}"),
        }
    }

    /// Public half, where it can be derived.
    pub fn public_key(&self) -> Option<PublicKey> {
        match self {
            Self::Rsa(key) => Some(PublicKey::Rsa(key.to_public_key())),
            Self::P256(key) => Some(PublicKey::P256(VerifyingKey::from(key))),
            Self::UnsupportedEc { .. } | Self::Unsupported { .. } => None,
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.describe())
    }
}

/// A public key matching a [`PrivateKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKey {
    /// RSA public key.
    Rsa(RsaPublicKey),
    /// P-256 public key.
    P256(VerifyingKey),
}

/// A private key and, when derivable, its public key.
#[derive(Debug)]
pub struct KeyPair {
    /// Signing half.
    pub private: PrivateKey,
    /// Verifying half.
    pub public: Option<PublicKey>,
}

impl KeyPair {
    /// Pair `private` with its derived public key.
    pub fn new(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }
}

/// Read a PEM key file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Key`] if it
/// is not a PEM private key this crate can decode.
pub fn load_key_pair(path: impl AsRef<Path>) -> Result<KeyPair> {
    let path = path.as_ref();
    let pem = std::fs::read(path)?;
    let key = parse_private_key_pem(&pem)
        .map_err(|e| Error::Key(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), key = %key.describe(), "Loaded key");
    Ok(KeyPair::new(key))
}

/// Decode a PEM-encoded private key.
///
/// # Errors
///
/// Returns [`Error::Key`] for malformed PEM, an unknown label, or an
/// undecodable body.
pub fn parse_private_key_pem(pem: &[u8]) -> Result<PrivateKey> {
    let (label, der) =
        pem_rfc7468::decode_vec(pem).map_err(|e| Error::Key(format!("bad PEM: {e}")))?;
    match label {
        "PRIVATE KEY" => from_pkcs8(&der),
        "RSA PRIVATE KEY" => RsaPrivateKey::from_pkcs1_der(&der)
            .map(PrivateKey::Rsa)
            .map_err(|e| Error::Key(format!("bad PKCS#1 key: {e}"))),
        "EC PRIVATE KEY" => from_sec1(&der),
        "ENCRYPTED PRIVATE KEY" => Err(Error::Key("encrypted keys are not supported".into())),
        other => Err(Error::Key(format!("unexpected PEM label {other:?}"))),
    }
}

fn from_pkcs8(der: &[u8]) -> Result<PrivateKey> {
    let info =
        PrivateKeyInfo::try_from(der).map_err(|e| Error::Key(format!("bad PKCS#8 key: {e}")))?;
    let algorithm = info.algorithm.oid;

    if algorithm == RSA_ENCRYPTION {
        return RsaPrivateKey::from_pkcs8_der(der)
            .map(PrivateKey::Rsa)
            .map_err(|e| Error::Key(format!("bad RSA key: {e}")));
    }

    if algorithm == EC_PUBLIC_KEY {
        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|e| Error::Key(format!("EC key without named curve: {e}")))?;
        if curve != SECP256R1 {
            return Ok(PrivateKey::UnsupportedEc { curve });
        }
        return SigningKey::from_pkcs8_der(der)
            .map(PrivateKey::P256)
            .map_err(|e| Error::Key(format!("bad P-256 key: {e}")));
    }

    Ok(PrivateKey::Unsupported { algorithm })
}

fn from_sec1(der: &[u8]) -> Result<PrivateKey> {
    let key = sec1::EcPrivateKey::try_from(der)
        .map_err(|e| Error::Key(format!("bad SEC1 key: {e}")))?;
    let curve = key
        .parameters
        .and_then(|p| p.named_curve())
        .ok_or_else(|| Error::Key("EC key without named curve".into()))?;
    if curve != SECP256R1 {
        return Ok(PrivateKey::UnsupportedEc { curve });
    }
    let secret = p256::SecretKey::from_sec1_der(der)
        .map_err(|e| Error::Key(format!("bad P-256 key: {e}")))?;
    Ok(PrivateKey::P256(SigningKey::from(secret)))
}
