//! capfile - JavaCard CAP file tool
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Inspects CAP files, verifies them with an installed JavaCard SDK and adds
//! DAP signatures.
//!
//! # Environment
//!
//! ```text
//! JC_HOME           JavaCard SDK used for verification
//! JAVA_HOME         Java used to run the SDK's verifier
//! CAPFILE_TMPDIR    Parent directory for verifier workspaces
//! CAPFILE_AID_LIST  TOML file with extra platform package AIDs
//! RUST_LOG          Log filter, e.g. `capfile_core=debug`
//! ```

pub mod cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "capfile")]
#[command(author, version, about = "capfile - inspect, verify and sign JavaCard CAP files")]
pub struct Cli {
    /// JavaCard SDK to verify with
    #[arg(long, global = true, env = "JC_HOME")]
    pub sdk: Option<PathBuf>,

    /// TOML file with extra platform package AIDs ([aids] table)
    #[arg(long, global = true, env = "CAPFILE_AID_LIST")]
    pub aid_list: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show package, components and imports of CAP files
    Info {
        /// CAP files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Also verify each file against the SDK's own export files
        #[arg(short, long)]
        verify: bool,
    },
    /// Verify a CAP file against export files
    Verify {
        /// CAP file
        cap: PathBuf,
        /// Extra export files, directories or jars
        #[arg(short, long = "exp")]
        exports: Vec<PathBuf>,
        /// SDK whose export files define the target platform (default: --sdk)
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Add DAP signatures to a CAP file
    Sign {
        /// CAP file
        cap: PathBuf,
        /// PEM private key (RSA-1024 or EC P-256)
        #[arg(short, long)]
        key: PathBuf,
        /// Where to write the signed file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the detected JavaCard SDK
    Sdk,
}
