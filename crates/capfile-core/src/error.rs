//! Error type for capfile operations.
//!
//! Every public function in this crate returns [`crate::Result<T>`].
//! "No SDK found" is not an error: [`crate::JavaCardSdk::detect`] returns
//! `Ok(None)` for it.

use thiserror::Error;

use crate::Aid;

/// Error type for capfile operations.
///
/// # Examples
///
/// ```no_run
/// use capfile_core::{CapFile, Error, load_key_pair, signer};
///
/// let mut cap = CapFile::from_path("applet.cap")?;
/// let keys = load_key_pair("dap.pem")?;
/// match signer::add_signature(&mut cap, &keys.private) {
///     Ok(blocks) => println!("Signed with {} blocks", blocks.len()),
///     Err(Error::UnsupportedKey(msg)) => eprintln!("Wrong key: {msg}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # Ok::<(), capfile_core::Error>(())
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// An AID was constructed from fewer than 5 or more than 16 bytes.
    #[error("AID must be between 5 and 16 bytes: {0}")]
    InvalidLength(usize),

    /// An AID string was not valid hexadecimal.
    #[error("Invalid AID encoding: {0}")]
    InvalidEncoding(String),

    /// The signing key is not a 1024 bit RSA key or a P-256 EC key.
    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    /// The off-card verifier rejected the package.
    ///
    /// Carries the verifier's own diagnostic text.
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// The SDK toolchain could not be loaded or invoked.
    ///
    /// Usually means a broken or unsupported SDK installation.
    #[error("Could not run verifier: {0}")]
    Toolchain(String),

    /// The package imports a package that is not a known platform package.
    #[error("Only plain packages can be verified, found import of {0}")]
    UnsupportedImport(Aid),

    /// The CAP file is malformed or lacks a required component.
    #[error("Invalid CAP file: {0}")]
    Cap(String),

    /// A key file could not be decoded.
    #[error("Invalid key: {0}")]
    Key(String),

    /// A signature could not be computed.
    #[error("Signing failed: {0}")]
    Signature(String),

    /// Invalid configuration data (AID list).
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive operation failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
