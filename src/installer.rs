// installer.rs - Brings a Kali host to the state the recon pipeline needs
// Purpose: OS packages, Go toolchain workspace, Go-based recon tools,
//          nuclei templates, output directories, and a final version check

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use crate::artifacts::OutputLayout;
use crate::console;
use crate::error::{Error, Result};
use crate::executor::{CommandRunner, Invocation, StdoutTarget};
use crate::host::HostProfile;
use crate::tools::{get_tool_version, APT_PACKAGES, AUXILIARY_TOOLS, GO_TOOLS};

type StepResult<T = ()> = std::result::Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Skip anything a presence probe already finds.
    Normal,
    /// Reinstall every package and tool unconditionally.
    Force,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    UpdateSystemPackages,
    InstallAptPackages,
    SetupGoEnvironment,
    InstallGoTools,
    UpdateNucleiTemplates,
    CreateDirectories,
    VerifyInstallations,
}

impl InstallStep {
    pub const SEQUENCE: [InstallStep; 7] = [
        InstallStep::UpdateSystemPackages,
        InstallStep::InstallAptPackages,
        InstallStep::SetupGoEnvironment,
        InstallStep::InstallGoTools,
        InstallStep::UpdateNucleiTemplates,
        InstallStep::CreateDirectories,
        InstallStep::VerifyInstallations,
    ];

    pub fn label(self, mode: InstallMode) -> &'static str {
        match (self, mode) {
            (InstallStep::UpdateSystemPackages, _) => "Update system packages",
            (InstallStep::InstallAptPackages, InstallMode::Normal) => "Install APT packages",
            (InstallStep::InstallAptPackages, InstallMode::Force) => "Force install APT packages",
            (InstallStep::SetupGoEnvironment, _) => "Setup Go environment",
            (InstallStep::InstallGoTools, InstallMode::Normal) => "Install Go tools",
            (InstallStep::InstallGoTools, InstallMode::Force) => "Force install Go tools",
            (InstallStep::UpdateNucleiTemplates, _) => "Update Nuclei templates",
            (InstallStep::CreateDirectories, _) => "Create directories",
            (InstallStep::VerifyInstallations, _) => "Verify installations",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstallerConfig {
    pub home: PathBuf,
    /// Where `output/` and `screenshots/` are created.
    pub workspace_root: PathBuf,
    pub search_path: OsString,
}

impl InstallerConfig {
    pub fn from_env() -> Self {
        Self {
            home: std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/root")),
            workspace_root: PathBuf::new(),
            search_path: std::env::var_os("PATH").unwrap_or_default(),
        }
    }

    pub fn go_path(&self) -> PathBuf {
        self.home.join("go")
    }

    pub fn go_bin(&self) -> PathBuf {
        self.go_path().join("bin")
    }

    pub fn go_bin_on_path(&self) -> bool {
        let go_bin = self.go_bin();
        std::env::split_paths(&self.search_path).any(|dir| dir == go_bin)
    }
}

pub struct Installer<'a> {
    runner: &'a dyn CommandRunner,
    host: HostProfile,
    config: InstallerConfig,
    mode: InstallMode,
}

impl<'a> Installer<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        host: HostProfile,
        config: InstallerConfig,
        mode: InstallMode,
    ) -> Self {
        Self {
            runner,
            host,
            config,
            mode,
        }
    }

    pub async fn install(&self) -> Result<()> {
        console::info("Starting Automated Recon Pipeline Installation...");
        if self.mode == InstallMode::Force {
            console::info("Force installation mode enabled - will reinstall all tools");
        }

        if let Err(e) = self.host.ensure_supported() {
            match e {
                Error::UnsupportedPlatform => {
                    console::error("This tool is designed specifically for Kali Linux");
                    console::error("Please run this program on a Kali Linux system");
                }
                _ => console::error("This program must be run as root (use sudo)"),
            }
            return Err(e);
        }

        for step in InstallStep::SEQUENCE {
            let label = step.label(self.mode);
            console::section(label);
            if let Err(message) = self.run_step(step).await {
                console::error(&message);
                console::error(&format!("Installation failed at: {}", label));
                return Err(Error::InstallStep {
                    step: label.to_string(),
                    message,
                });
            }
        }

        self.print_next_steps();
        Ok(())
    }

    async fn run_step(&self, step: InstallStep) -> StepResult {
        match step {
            InstallStep::UpdateSystemPackages => self.update_system_packages().await,
            InstallStep::InstallAptPackages => match self.mode {
                InstallMode::Normal => self.install_apt_packages().await,
                InstallMode::Force => self.force_install_apt_packages().await,
            },
            InstallStep::SetupGoEnvironment => self.setup_go_environment().await,
            InstallStep::InstallGoTools => self.install_go_tools().await,
            InstallStep::UpdateNucleiTemplates => self.update_nuclei_templates().await,
            InstallStep::CreateDirectories => self.create_directories(),
            InstallStep::VerifyInstallations => self.verify_installations().await,
        }
    }

    /// Run a command, returning stdout on success and the error text otherwise.
    async fn run_checked<I, S>(&self, program: &str, args: I) -> StepResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = Invocation::exec(program, args);
        let result = self
            .runner
            .run(&invocation, &StdoutTarget::Capture)
            .await
            .map_err(|e| e.to_string())?;

        if result.succeeded {
            Ok(result.stdout)
        } else {
            Err(format!("Failed to run: {}: {}", invocation, result.captured_output()))
        }
    }

    async fn update_system_packages(&self) -> StepResult {
        console::action("Updating APT packages...");
        self.run_checked("apt", ["update"]).await?;
        self.run_checked("apt", ["upgrade", "-y"]).await?;
        console::success("System packages updated successfully");
        Ok(())
    }

    async fn is_apt_package_installed(&self, package: &str) -> bool {
        match self
            .runner
            .run(&Invocation::exec("dpkg", ["-l", package]), &StdoutTarget::Capture)
            .await
        {
            Ok(result) => result.succeeded && result.stdout.contains(package),
            Err(_) => false,
        }
    }

    async fn install_apt_packages(&self) -> StepResult {
        console::action("Installing dependencies...");

        let mut missing = Vec::new();
        for package in APT_PACKAGES {
            if self.is_apt_package_installed(package).await {
                console::success(&format!("{} already installed", package));
            } else {
                console::action(&format!("{} not found, will install", package));
                missing.push(package);
            }
        }

        if missing.is_empty() {
            console::success("All APT packages are already installed");
            return Ok(());
        }

        console::action(&format!("Installing missing packages: {}", missing.join(", ")));
        let args = ["install", "-y"].into_iter().chain(missing.iter().copied());
        self.run_checked("apt", args)
            .await
            .map_err(|e| format!("Failed to install APT packages: {}", e))?;

        console::success("APT packages installed successfully");
        Ok(())
    }

    async fn force_install_apt_packages(&self) -> StepResult {
        console::action(&format!("Force installing packages: {}", APT_PACKAGES.join(", ")));

        let args = ["install", "-y", "--reinstall"].into_iter().chain(APT_PACKAGES);
        self.run_checked("apt", args)
            .await
            .map_err(|e| format!("Failed to install APT packages: {}", e))?;

        console::success("APT packages force installed successfully");
        Ok(())
    }

    async fn setup_go_environment(&self) -> StepResult {
        console::action("Setting up Go environment...");

        if self.runner.locate("go").is_none() {
            return Err("Go is not installed. Please install it first.".to_string());
        }

        if let Ok(version) = self.run_checked("go", ["version"]).await {
            console::success(version.trim());
        }

        let go_bin = self.config.go_bin();
        fs::create_dir_all(&go_bin)
            .map_err(|e| format!("Failed to create {}: {}", go_bin.display(), e))?;

        if !self.config.go_bin_on_path() {
            console::warn(&format!("{} is not in PATH. Please add it to your PATH:", go_bin.display()));
            console::warn(&format!("    export PATH=$PATH:{}", go_bin.display()));
            console::warn(&format!(
                "    Or add to ~/.bashrc: echo 'export PATH=$PATH:{}' >> ~/.bashrc",
                go_bin.display()
            ));
        }

        Ok(())
    }

    async fn install_go_tools(&self) -> StepResult {
        match self.mode {
            InstallMode::Normal => console::action("Installing Go-based tools..."),
            InstallMode::Force => console::action("Force installing Go-based tools..."),
        }

        for spec in GO_TOOLS {
            if self.mode == InstallMode::Normal {
                if let Some(version) = get_tool_version(self.runner, spec.binary_name).await {
                    console::success(&format!("{} {} already installed", spec.binary_name, version));
                    continue;
                }
            }

            console::action(&format!("Installing {}...", spec.binary_name));
            self.run_checked("go", ["install", "-v", spec.fetch_locator])
                .await
                .map_err(|e| format!("Failed to install {}: {}", spec.binary_name, e))?;

            match get_tool_version(self.runner, spec.binary_name).await {
                Some(version) => {
                    console::success(&format!("Installed {} {}", spec.binary_name, version))
                }
                None => console::warn(&format!(
                    "{} installed but version check failed",
                    spec.binary_name
                )),
            }
        }

        Ok(())
    }

    async fn update_nuclei_templates(&self) -> StepResult {
        console::action("Updating Nuclei templates...");
        self.run_checked("nuclei", ["-update-templates"])
            .await
            .map_err(|e| format!("Failed to update Nuclei templates: {}", e))?;
        console::success("Nuclei templates updated successfully");
        Ok(())
    }

    fn create_directories(&self) -> StepResult {
        console::action("Creating directories...");
        let layout = OutputLayout::new(self.config.workspace_root.clone());
        layout.create_all().map_err(|e| e.to_string())?;
        for dir in layout.directories() {
            console::success(&format!("Created directory: {}/", dir.display()));
        }
        Ok(())
    }

    async fn verify_installations(&self) -> StepResult {
        console::action("Verifying installations...");

        let mut failed = Vec::new();
        for spec in GO_TOOLS {
            match get_tool_version(self.runner, spec.binary_name).await {
                Some(version) => console::success(&format!("{}: {}", spec.binary_name, version)),
                None => {
                    console::error(&format!(
                        "{}: Not found or version check failed",
                        spec.binary_name
                    ));
                    failed.push(spec.binary_name);
                }
            }
        }

        for tool in AUXILIARY_TOOLS {
            if self.runner.locate(tool).is_none() {
                console::warn(&format!("{}: Not found in PATH", tool));
                continue;
            }
            match get_tool_version(self.runner, tool).await {
                Some(version) => console::success(&format!("{}: {}", tool, version)),
                None => console::success(&format!("{}: Installed", tool)),
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(format!("verification failed for: {}", failed.join(", ")))
        }
    }

    fn print_next_steps(&self) {
        let go_bin = self.config.go_bin();
        console::boxed(
            &[
                "Installation complete!".to_string(),
                "Next steps:".to_string(),
                format!("  1. Add {} to your PATH if not already done", go_bin.display()),
                format!("  2. Run: export PATH=$PATH:{}", go_bin.display()),
                format!(
                    "  3. Or add to ~/.bashrc: echo 'export PATH=$PATH:{}' >> ~/.bashrc",
                    go_bin.display()
                ),
                "  4. Start a run: recon --target example.com".to_string(),
            ],
            true,
        );
    }
}
