use std::fmt;

use crate::error::{Error, Result};

/// Domain the pipeline runs against.
///
/// Only checks for a `.`; real domain syntax is left to the tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(String);

impl Target {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.contains('.') {
            return Err(Error::InvalidTarget(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `https://<domain>/<path>`
    pub fn https_url(&self, path: &str) -> String {
        format!("https://{}/{}", self.0, path)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
