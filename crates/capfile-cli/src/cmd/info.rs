//! Info command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use capfile_core::{CapFile, Error, HashAlgorithm, OffCardVerifier, PlatformRegistry};
use crossterm::style::Stylize;

/// Dump each CAP file, optionally verifying it.
///
/// A rejected package does not stop the remaining files from being shown;
/// the command fails at the end if any was rejected.
pub fn info(files: &[PathBuf], verify: bool, sdk: Option<&Path>, aid_list: Option<&Path>) -> Result<()> {
    let registry = super::registry(aid_list)?;
    let sdk = if verify {
        Some(super::require_sdk(sdk)?)
    } else {
        None
    };
    let verifier = sdk
        .as_ref()
        .map(OffCardVerifier::with_sdk)
        .transpose()
        .context("Failed to set up verifier")?;

    let mut failed = 0usize;
    for file in files {
        println!("# {}", file.display());
        let cap = CapFile::from_path(file)
            .with_context(|| format!("Could not read CAP file {}", file.display()))?;
        dump(&cap, &registry);

        if let Some(verifier) = &verifier {
            match verifier.verify_plain(file, &registry) {
                Ok(()) => println!("  {:<12}{}", "verified", "OK".green()),
                Err(e @ (Error::VerificationFailed(_) | Error::UnsupportedImport(_))) => {
                    eprintln!("{}", e.to_string().red());
                    failed += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Could not verify {}", file.display()));
                }
            }
        }
        println!();
    }

    if failed > 0 {
        bail!("{failed} of {} CAP files failed verification", files.len());
    }
    Ok(())
}

fn dump(cap: &CapFile, registry: &PlatformRegistry) {
    let lw = 12;
    let header = cap.header();

    println!(
        "  {} {}",
        cap.package_name().unwrap_or("<unnamed>").bold(),
        format!("v{}.{}", header.package_version.0, header.package_version.1).dark_grey()
    );
    println!("  {:<lw$}{}", "aid", cap.package_aid());
    println!(
        "  {:<lw$}{}.{}",
        "cap format", header.format_version.0, header.format_version.1
    );

    let components: Vec<_> = cap.components().map(|(c, _)| c.file_name()).collect();
    println!("  {:<lw$}{}", "components", components.join(", "));
    println!(
        "  {:<lw$}{}",
        "load size",
        cap.load_file_data().len()
    );

    for (label, algorithm) in [("sha1", HashAlgorithm::Sha1), ("sha256", HashAlgorithm::Sha256)] {
        println!(
            "  {:<lw$}{}",
            label,
            hex::encode_upper(cap.load_file_data_hash(algorithm))
        );
    }

    for import in cap.imports() {
        let name = registry.name(&import.aid).unwrap_or("?");
        println!(
            "  {:<lw$}{} v{}.{} {}",
            "import",
            import.aid,
            import.version.0,
            import.version.1,
            name.dark_grey()
        );
    }

    let daps: Vec<_> = cap
        .entries
        .keys()
        .filter_map(|k| k.strip_prefix("META-INF/dap."))
        .collect();
    if !daps.is_empty() {
        println!("  {:<lw$}{}", "dap", daps.join(", "));
    }
}
