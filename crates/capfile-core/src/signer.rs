//! DAP signing.
//!
//! A DAP (Data Authentication Pattern) block is a signature over the load
//! file data hash, stored as a `META-INF/` entry of the CAP file. Each signing
//! call writes two blocks: one over the SHA-1 hash and one over the SHA-256
//! hash.
//!
//! | Key | Entries | Primitive |
//! |---|---|---|
//! | RSA-1024 | `dap.rsa.sha1`, `dap.rsa.sha256` | RSASSA-PKCS1-v1_5 with SHA-1 |
//! | EC P-256 | `dap.p256.sha1`, `dap.p256.sha256` | ECDSA with SHA-256, DER |
//!
//! The RSA block over the SHA-256 hash still uses SHA-1 as the signature
//! digest. Cards in the field verify it that way.

use rsa::RsaPrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use sha1::Sha1;
use tracing::info;

use crate::cap::CapFile;
use crate::keys::PrivateKey;
use crate::{Error, HashAlgorithm, Result};

/// Directory of DAP blocks inside the CAP file.
pub const DAP_DIR: &str = "META-INF/";

/// RSA block over the SHA-1 hash.
pub const DAP_RSA_SHA1: &str = "dap.rsa.sha1";
/// RSA block over the SHA-256 hash.
pub const DAP_RSA_SHA256: &str = "dap.rsa.sha256";
/// ECDSA block over the SHA-1 hash.
pub const DAP_P256_SHA1: &str = "dap.p256.sha1";
/// ECDSA block over the SHA-256 hash.
pub const DAP_P256_SHA256: &str = "dap.p256.sha256";

/// Only 1024 bit RSA keys can sign DAP blocks.
pub const RSA_MODULUS_BYTES: usize = 128;

/// One signature block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DapBlock {
    /// Block name, e.g. `dap.rsa.sha1`.
    pub name: &'static str,
    /// Signature bytes.
    pub signature: Vec<u8>,
}

impl DapBlock {
    /// Archive entry name, e.g. `META-INF/dap.rsa.sha1`.
    pub fn entry_name(&self) -> String {
        format!("{DAP_DIR}{}", self.name)
    }
}

/// Compute both DAP blocks for `cap` without modifying it.
///
/// # Errors
///
/// Returns [`Error::UnsupportedKey`] unless `key` is RSA-1024 or EC P-256,
/// and [`Error::Signature`] if the signing primitive fails.
pub fn dap_blocks(cap: &CapFile, key: &PrivateKey) -> Result<[DapBlock; 2]> {
    let sha1 = cap.load_file_data_hash(HashAlgorithm::Sha1);
    let sha256 = cap.load_file_data_hash(HashAlgorithm::Sha256);

    match key {
        PrivateKey::Rsa(key) => {
            let key = rsa_signing_key(key)?;
            Ok([
                DapBlock {
                    name: DAP_RSA_SHA1,
                    signature: sign_rsa(&key, &sha1)?,
                },
                DapBlock {
                    name: DAP_RSA_SHA256,
                    signature: sign_rsa(&key, &sha256)?,
                },
            ])
        }
        PrivateKey::P256(key) => Ok([
            DapBlock {
                name: DAP_P256_SHA1,
                signature: sign_p256(key, &sha1)?,
            },
            DapBlock {
                name: DAP_P256_SHA256,
                signature: sign_p256(key, &sha256)?,
            },
        ]),
        PrivateKey::UnsupportedEc { curve } => Err(Error::UnsupportedKey(format!(
            "Only P-256 keys are supported, not curve {curve}"
        ))),
        PrivateKey::Unsupported { algorithm } => Err(Error::UnsupportedKey(format!(
            "Only RSA and EC keys are supported, not {algorithm}"
        ))),
    }
}

/// Sign `cap` with `key`, adding two DAP entries to it, and return the
/// blocks that were written.
///
/// Nothing is added if either signature fails. Existing blocks with the same
/// names are replaced.
///
/// # Errors
///
/// See [`dap_blocks`].
pub fn add_signature(cap: &mut CapFile, key: &PrivateKey) -> Result<[DapBlock; 2]> {
    let blocks = dap_blocks(cap, key)?;
    for block in &blocks {
        cap.entries
            .insert(block.entry_name(), block.signature.clone());
    }
    info!(package = %cap.package_aid(), key = %key.describe(), "Added DAP signature");
    Ok(blocks)
}

fn rsa_signing_key(key: &RsaPrivateKey) -> Result<rsa::pkcs1v15::SigningKey<Sha1>> {
    if key.size() != RSA_MODULUS_BYTES {
        return Err(Error::UnsupportedKey(format!(
            "Only 1024 bit RSA keys are supported, got {} bits",
            key.size() * 8
        )));
    }
    Ok(rsa::pkcs1v15::SigningKey::<Sha1>::new(key.clone()))
}

fn sign_rsa(key: &rsa::pkcs1v15::SigningKey<Sha1>, message: &[u8]) -> Result<Vec<u8>> {
    let signature = key
        .try_sign(message)
        .map_err(|e| Error::Signature(format!("RSA: {e}")))?;
    Ok(signature.to_vec())
}

fn sign_p256(key: &p256::ecdsa::SigningKey, message: &[u8]) -> Result<Vec<u8>> {
    let signature: p256::ecdsa::Signature = key
        .try_sign(message)
        .map_err(|e| Error::Signature(format!("ECDSA: {e}")))?;
    Ok(signature.to_der().as_bytes().to_vec())
}
