// install.rs - recon-install: prepares a Kali host for the recon pipeline
// Purpose: APT packages, Go environment, Go-based tools, nuclei templates,
//          output directories, final verification

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use reconpipe::console;
use reconpipe::executor::SystemRunner;
use reconpipe::host::HostProfile;
use reconpipe::installer::{InstallMode, Installer, InstallerConfig};

/// Automated Recon Pipeline Tool - Installer
#[derive(Parser, Debug)]
#[command(
    name = "recon-install",
    version,
    about = "Install every tool the recon pipeline needs (Kali Linux, root only)",
    after_help = r#"
EXAMPLES:

  sudo recon-install            # Normal installation
  sudo recon-install --force    # Force reinstall all tools
"#
)]
struct Args {
    /// Force reinstall all tools (even if already installed)
    #[arg(long)]
    force: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    console::print_banner(
        "RECON - Installer",
        "Kali Linux toolchain setup for the recon pipeline",
    );

    // Installer failures are printed where they happen.
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run(args: &Args) -> Result<()> {
    let mode = if args.force {
        InstallMode::Force
    } else {
        InstallMode::Normal
    };
    let runner = SystemRunner::new();
    let installer = Installer::new(&runner, HostProfile::detect(), InstallerConfig::from_env(), mode);

    tokio::select! {
        outcome = installer.install() => Ok(outcome?),
        _ = tokio::signal::ctrl_c() => {
            console::warn("Installation interrupted by user");
            anyhow::bail!("interrupted")
        }
    }
}
