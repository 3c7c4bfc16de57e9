mod support;

use capfile_core::signer::{self, DAP_P256_SHA1, DAP_P256_SHA256, DAP_RSA_SHA1, DAP_RSA_SHA256};
use capfile_core::{CapFile, Error, HashAlgorithm, PrivateKey, load_key_pair};
use support::{JAVA_LANG, cap_bytes, fixture};
use tempfile::TempDir;

const APPLET_AID: [u8; 6] = [0xA0, 0x00, 0x00, 0x00, 0x01, 0x01];

fn sample_cap() -> CapFile {
    CapFile::from_bytes(&cap_bytes("com/example/applet", &APPLET_AID, &[&JAVA_LANG]))
        .expect("failed to open CAP")
}

fn dap_names(cap: &CapFile) -> Vec<String> {
    cap.entries
        .keys()
        .filter_map(|k| k.strip_prefix(signer::DAP_DIR))
        .filter(|k| k.starts_with("dap."))
        .map(str::to_string)
        .collect()
}

#[test]
fn test_signed_cap_survives_store() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let keys = load_key_pair(fixture("rsa1024.pem")).expect("failed to load key");
    assert!(keys.public.is_some());

    let mut cap = sample_cap();
    let hash = cap.load_file_data_hash(HashAlgorithm::Sha256);
    signer::add_signature(&mut cap, &keys.private).expect("sign");

    let out = dir.path().join("signed.cap");
    cap.store_to_path(&out).expect("store");
    let reopened = CapFile::from_path(&out).expect("reopen");

    assert_eq!(dap_names(&reopened), [DAP_RSA_SHA1, DAP_RSA_SHA256]);
    assert_eq!(reopened.entries, cap.entries);
    // DAP blocks are not part of the signed data
    assert_eq!(reopened.load_file_data_hash(HashAlgorithm::Sha256), hash);
}

#[test]
fn test_p256_key_from_file() {
    let keys = load_key_pair(fixture("p256.pem")).expect("failed to load key");
    let mut cap = sample_cap();
    signer::add_signature(&mut cap, &keys.private).expect("sign");
    assert_eq!(dap_names(&cap), [DAP_P256_SHA1, DAP_P256_SHA256]);
    assert!(cap.entries.values().all(|v| !v.is_empty()));
}

#[test]
fn test_unsupported_keys_write_nothing() {
    for name in ["rsa2048.pem", "p384.pem", "ed25519.pem"] {
        let keys = load_key_pair(fixture(name)).expect("failed to load key");
        let mut cap = sample_cap();
        let err = signer::add_signature(&mut cap, &keys.private).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKey(_)), "{name}: {err}");
        assert!(dap_names(&cap).is_empty(), "{name}");
    }
}

#[test]
fn test_p384_loads_as_unsupported_curve() {
    let keys = load_key_pair(fixture("p384.pem")).expect("failed to load key");
    assert!(matches!(keys.private, PrivateKey::UnsupportedEc { .. }));
    assert!(keys.public.is_none());
}

#[test]
fn test_missing_key_file_is_io_error() {
    let dir = TempDir::new().expect("failed to create temp dir");
    assert!(matches!(
        load_key_pair(dir.path().join("nope.pem")),
        Err(Error::Io(_))
    ));
}
