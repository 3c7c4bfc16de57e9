mod support;

use capfile_core::{ArtifactKind, Error, JavaCardSdk, JavaCardVersion, Release, Update};
use support::{U1_METHODS, U2_METHODS, U3_METHODS, sdk_305, verifier_class, write_jar};
use tempfile::TempDir;

fn detect(root: &std::path::Path) -> JavaCardSdk {
    JavaCardSdk::detect(root)
        .expect("failed to probe SDK")
        .expect("no SDK detected")
}

#[test]
fn test_305_update_levels() {
    for (methods, update) in [
        (U1_METHODS, Update::U1),
        (U2_METHODS, Update::U2),
        (U3_METHODS, Update::U3),
    ] {
        let dir = TempDir::new().expect("failed to create temp dir");
        sdk_305(dir.path(), methods);
        let sdk = detect(dir.path());
        assert_eq!(sdk.version(), JavaCardVersion::V305);
        assert_eq!(sdk.release().expect("release"), Release::v305(update));
    }
}

#[test]
fn test_no_known_method_ranks_as_u2() {
    let dir = TempDir::new().expect("failed to create temp dir");
    sdk_305(dir.path(), &[("main", "([Ljava/lang/String;)V")]);
    assert_eq!(
        detect(dir.path()).release().expect("release").to_string(),
        "3.0.5u2"
    );
}

#[test]
fn test_release_is_cached() {
    let dir = TempDir::new().expect("failed to create temp dir");
    sdk_305(dir.path(), U3_METHODS);
    let sdk = detect(dir.path());
    assert_eq!(sdk.release().expect("release"), Release::v305(Update::U3));

    // a later change on disk is not seen by the same instance
    write_jar(
        &dir.path().join("lib/tools.jar"),
        &[(
            "com/sun/javacard/offcardverifier/Verifier.class",
            &verifier_class(U1_METHODS),
        )],
    );
    assert_eq!(sdk.release().expect("release"), Release::v305(Update::U3));
    assert_eq!(
        detect(dir.path()).release().expect("release"),
        Release::v305(Update::U1)
    );
}

#[test]
fn test_corrupt_verifier_class_is_toolchain_error() {
    let dir = TempDir::new().expect("failed to create temp dir");
    sdk_305(dir.path(), U3_METHODS);
    write_jar(
        &dir.path().join("lib/tools.jar"),
        &[("com/sun/javacard/offcardverifier/Verifier.class", b"\xCA\xFE")],
    );
    assert!(matches!(
        detect(dir.path()).release(),
        Err(Error::Toolchain(_))
    ));
}

#[test]
fn test_sdk_is_shareable_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<JavaCardSdk>();

    let dir = TempDir::new().expect("failed to create temp dir");
    sdk_305(dir.path(), U1_METHODS);
    let sdk = detect(dir.path());
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| sdk.release())).collect();
        for handle in handles {
            let release = handle.join().expect("thread panicked").expect("release");
            assert_eq!(release, Release::v305(Update::U1));
        }
    });
}

#[test]
fn test_305_artifacts() {
    let dir = TempDir::new().expect("failed to create temp dir");
    sdk_305(dir.path(), U3_METHODS);
    let sdk = detect(dir.path());
    assert_eq!(
        sdk.artifacts(ArtifactKind::Api),
        vec![
            dir.path().join("lib/api_classic.jar"),
            dir.path().join("lib/api_classic_annotations.jar")
        ]
    );
    assert_eq!(sdk.tool_jars(), vec![dir.path().join("lib/tools.jar")]);
    assert_eq!(sdk.export_dir(), dir.path().join("api_export_files"));
    assert_eq!(sdk.java_version(), "1.6");
}
