//! Core library for capfile.
//!
//! Detects installed JavaCard SDKs, verifies CAP files against export files
//! with the SDK's off-card verifier, and signs CAP files with DAP blocks.
//!
//! # Overview
//!
//! - [`JavaCardSdk`] probes an SDK directory and resolves which release it is.
//! - [`OffCardVerifier`] collects export files and runs the verifier of that
//!   release.
//! - [`signer::add_signature`] writes the two DAP blocks for an RSA-1024 or
//!   P-256 key into a [`CapFile`].

pub mod aid;
pub mod cap;
pub mod config;
pub mod error;
pub mod keys;
pub mod registry;
pub mod sdk;
pub mod signer;
pub mod verifier;

mod reader;

pub use aid::Aid;
pub use cap::{CapFile, HashAlgorithm};
pub use config::VerifierConfig;
pub use error::Error;
pub use keys::{KeyPair, PrivateKey, PublicKey, load_key_pair};
pub use registry::PlatformRegistry;
pub use sdk::{ArtifactKind, JavaCardSdk, JavaCardVersion, Release, Update};
pub use verifier::{JavaLauncher, Launcher, OffCardVerifier};

/// Convenience alias used by every fallible function in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension of JavaCard export files.
pub const EXPORT_FILE_SUFFIX: &str = ".exp";
