//! capfile - JavaCard CAP file tool

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use capfile_cli::cmd;
use capfile_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let sdk = cli.sdk.as_deref();
    let aid_list = cli.aid_list.as_deref();

    match cli.command {
        Commands::Info { files, verify } => cmd::info::info(&files, verify, sdk, aid_list),
        Commands::Verify {
            cap,
            exports,
            target,
        } => cmd::verify::verify(&cap, &exports, target.as_deref(), sdk),
        Commands::Sign { cap, key, output } => cmd::sign::sign(&cap, &key, output.as_deref()),
        Commands::Sdk => cmd::sdk::sdk(sdk),
    }
}
