// error.rs - Error taxonomy shared by the recon runner and the installer

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid target '{0}': provide a valid domain (e.g., example.com)")]
    InvalidTarget(String),

    #[error("missing required tools: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    #[error("failed to create directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stage {index} ({name}) failed: {message}")]
    StageFailed {
        index: usize,
        name: String,
        message: String,
    },

    #[error("this tool is designed specifically for Kali Linux")]
    UnsupportedPlatform,

    #[error("this program must be run as root (use sudo)")]
    NotPrivileged,

    #[error("installation failed at: {step}: {message}")]
    InstallStep { step: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
