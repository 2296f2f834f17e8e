// host.rs - Platform and privilege preconditions for the installer

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const SUPPORTED_DISTRIBUTION: &str = "kali";

#[derive(Debug, Clone)]
pub struct HostProfile {
    /// Checked in order; the first one mentioning the distribution wins.
    pub identity_files: Vec<PathBuf>,
    pub euid: u32,
}

impl HostProfile {
    pub fn detect() -> Self {
        Self {
            identity_files: vec![PathBuf::from("/etc/os-release"), PathBuf::from("/etc/issue")],
            euid: effective_uid(),
        }
    }

    /// Unreadable or absent identity files simply don't match.
    pub fn is_supported_distribution(&self) -> bool {
        self.identity_files.iter().any(|path| {
            fs::read_to_string(path)
                .map(|content| content.to_lowercase().contains(SUPPORTED_DISTRIBUTION))
                .unwrap_or(false)
        })
    }

    pub fn is_privileged(&self) -> bool {
        self.euid == 0
    }

    pub fn ensure_supported(&self) -> Result<()> {
        if !self.is_supported_distribution() {
            return Err(Error::UnsupportedPlatform);
        }
        if !self.is_privileged() {
            return Err(Error::NotPrivileged);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() }
}

#[cfg(not(unix))]
fn effective_uid() -> u32 {
    u32::MAX
}
