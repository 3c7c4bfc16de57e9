//! Builders for on-disk fixtures: jars, SDK layouts, CAP files.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

pub const JAVA_LANG: [u8; 7] = [0xA0, 0x00, 0x00, 0x00, 0x62, 0x00, 0x01];
pub const JAVACARD_FRAMEWORK: [u8; 7] = [0xA0, 0x00, 0x00, 0x00, 0x62, 0x01, 0x01];

pub const U1_METHODS: &[(&str, &str)] = &[(
    "verifyCap",
    "(Ljava/io/FileInputStream;Ljava/lang/String;Ljava/util/Vector;)V",
)];
pub const U2_METHODS: &[(&str, &str)] = &[(
    "verifyCap",
    "(Ljava/io/File;Ljava/lang/String;Ljava/util/Vector;)V",
)];
pub const U3_METHODS: &[(&str, &str)] = &[
    (
        "verifyCap",
        "(Ljava/io/File;Ljava/lang/String;Ljava/util/Vector;)V",
    ),
    ("verifyTargetPlatform", "(Ljava/lang/String;)V"),
];

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create jar folder");
    }
    let mut zip = zip::ZipWriter::new(File::create(path).expect("failed to create jar"));
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("failed to start jar entry");
        zip.write_all(data).expect("failed to write jar entry");
    }
    zip.finish().expect("failed to finish jar");
}

fn push_utf8(out: &mut Vec<u8>, s: &str) {
    out.push(1);
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// `com/sun/javacard/offcardverifier/Verifier.class` declaring `methods`.
pub fn verifier_class(methods: &[(&str, &str)]) -> Vec<u8> {
    let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 50];
    let count = 3 + methods.len() * 2;
    out.extend_from_slice(&(count as u16).to_be_bytes());
    push_utf8(&mut out, "com/sun/javacard/offcardverifier/Verifier");
    out.extend_from_slice(&[7, 0, 1]);
    for (name, desc) in methods {
        push_utf8(&mut out, name);
        push_utf8(&mut out, desc);
    }
    out.extend_from_slice(&[0, 0x21, 0, 2, 0, 0]);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&(methods.len() as u16).to_be_bytes());
    for i in 0..methods.len() {
        let name = (3 + i * 2) as u16;
        out.extend_from_slice(&[0, 0x09]);
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&(name + 1).to_be_bytes());
        out.extend_from_slice(&[0, 0]);
    }
    out.extend_from_slice(&[0, 0]);
    out
}

/// A 3.0.5 SDK whose verifier declares `methods`, with two API export files.
pub fn sdk_305(root: &Path, methods: &[(&str, &str)]) {
    write_jar(
        &root.join("lib/tools.jar"),
        &[(
            "com/sun/javacard/offcardverifier/Verifier.class",
            &verifier_class(methods),
        )],
    );
    write_jar(
        &root.join("lib/api_classic.jar"),
        &[
            ("javacardx/framework/string/StringUtil.class", b""),
            ("javacard/framework/SensitiveArrays.class", b""),
        ],
    );
    let exports = root.join("api_export_files");
    for (dir, file) in [
        ("java/lang/javacard", "lang.exp"),
        ("javacard/framework/javacard", "framework.exp"),
    ] {
        fs::create_dir_all(exports.join(dir)).expect("failed to create export folder");
        fs::write(exports.join(dir).join(file), file.as_bytes()).expect("failed to write export");
    }
}

/// Component bytes: tag, u16 size, body.
fn component(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&(body.len() as u16).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// CAP file for package `path` (slash separated, empty for none) importing
/// `imports`.
pub fn cap_bytes(path: &str, aid: &[u8], imports: &[&[u8]]) -> Vec<u8> {
    let mut header = vec![0xDE, 0xCA, 0xFF, 0xED, 2, 2, 0, 0, 1, aid.len() as u8];
    header.extend_from_slice(aid);
    header.push(path.len() as u8);
    header.extend_from_slice(path.as_bytes());

    let mut import = vec![imports.len() as u8];
    for aid in imports {
        import.extend_from_slice(&[0, 1, aid.len() as u8]);
        import.extend_from_slice(aid);
    }

    let dir = if path.is_empty() { "pkg" } else { path };
    let header = component(1, &header);
    let import = component(4, &import);
    let method = component(7, &[0x00, 0x11, 0x22, 0x33]);

    let mut out = std::io::Cursor::new(Vec::new());
    let mut zip = zip::ZipWriter::new(&mut out);
    for (name, data) in [
        ("META-INF/MANIFEST.MF".to_string(), b"Manifest-Version: 1.0\r\n\r\n".to_vec()),
        (format!("{dir}/javacard/Header.cap"), header),
        (format!("{dir}/javacard/Import.cap"), import),
        (format!("{dir}/javacard/Method.cap"), method),
    ] {
        zip.start_file(name, SimpleFileOptions::default())
            .expect("failed to start CAP entry");
        zip.write_all(&data).expect("failed to write CAP entry");
    }
    zip.finish().expect("failed to finish CAP");
    out.into_inner()
}

pub fn write_cap(path: &Path, package: &str, aid: &[u8], imports: &[&[u8]]) {
    fs::write(path, cap_bytes(package, aid, imports)).expect("failed to write CAP");
}

pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .expect("failed to read dir")
        .next()
        .is_none()
}
