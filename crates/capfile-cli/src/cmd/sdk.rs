//! Sdk command

use std::path::Path;

use anyhow::Result;
use capfile_core::ArtifactKind;
use crossterm::style::Stylize;

/// Print what was detected at `sdk`.
pub fn sdk(sdk: Option<&Path>) -> Result<()> {
    let sdk = super::require_sdk(sdk)?;
    let lw = 12;

    // 3.0.5 update probing can fail on a damaged SDK; still show the rest
    let release = match sdk.release() {
        Ok(release) => release.to_string(),
        Err(e) => format!("{} ({e})", sdk.version()),
    };

    println!("  {} {}", "JavaCard SDK".bold(), release.as_str().green());
    println!("  {:<lw$}{}", "root", sdk.root().display());
    println!("  {:<lw$}{}", "java", sdk.java_version());
    println!(
        "  {:<lw$}{}",
        "verifier",
        if sdk.version().has_verifier() { "yes" } else { "no" }
    );
    println!("  {:<lw$}{}", "exports", sdk.export_dir().display());

    for (label, kind) in [
        ("api", ArtifactKind::Api),
        ("tools", ArtifactKind::Tools),
        ("compiler", ArtifactKind::Compiler),
    ] {
        for jar in sdk.artifacts(kind) {
            println!("  {:<lw$}{}", label, jar.display());
        }
    }
    Ok(())
}
