// tools.rs - Static tool tables and version probing
// Purpose: the single source for which binaries the pipeline needs, which
//          ones the installer fetches, and how an installed tool is asked
//          for its version

use regex::Regex;
use std::sync::OnceLock;

use crate::executor::{CommandRunner, Invocation, StdoutTarget};

/// Binaries that must be on the search path before any stage runs.
pub const REQUIRED_TOOLS: [&str; 11] = [
    "subfinder",
    "amass",
    "dnsx",
    "naabu",
    "httpx",
    "nuclei",
    "gau",
    "unfurl",
    "ffuf",
    "gowitness",
    "curl",
];

/// A tool fetched with `go install`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub binary_name: &'static str,
    pub fetch_locator: &'static str,
}

pub const GO_TOOLS: [ToolSpec; 9] = [
    ToolSpec {
        binary_name: "subfinder",
        fetch_locator: "github.com/projectdiscovery/subfinder/v2/cmd/subfinder@latest",
    },
    ToolSpec {
        binary_name: "amass",
        fetch_locator: "github.com/owasp-amass/amass/v4/...@latest",
    },
    ToolSpec {
        binary_name: "dnsx",
        fetch_locator: "github.com/projectdiscovery/dnsx/cmd/dnsx@latest",
    },
    ToolSpec {
        binary_name: "naabu",
        fetch_locator: "github.com/projectdiscovery/naabu/v2/cmd/naabu@latest",
    },
    ToolSpec {
        binary_name: "httpx",
        fetch_locator: "github.com/projectdiscovery/httpx/cmd/httpx@latest",
    },
    ToolSpec {
        binary_name: "nuclei",
        fetch_locator: "github.com/projectdiscovery/nuclei/v3/cmd/nuclei@latest",
    },
    ToolSpec {
        binary_name: "gau",
        fetch_locator: "github.com/lc/gau/v2/cmd/gau@latest",
    },
    ToolSpec {
        binary_name: "unfurl",
        fetch_locator: "github.com/tomnomnom/unfurl@latest",
    },
    ToolSpec {
        binary_name: "gowitness",
        fetch_locator: "github.com/jaeles-project/gowitness@latest",
    },
];

pub const APT_PACKAGES: [&str; 8] = [
    "golang-go",
    "git",
    "curl",
    "jq",
    "python3-pip",
    "chromium",
    "build-essential",
    "pkg-config",
];

/// Checked during verification; a missing one is only a warning.
pub const AUXILIARY_TOOLS: [&str; 4] = ["ffuf", "curl", "jq", "git"];

pub const VERSION_FLAGS: [&str; 4] = ["--version", "-version", "-v", "version"];

const SUMMARY_LIMIT: usize = 50;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v?\d+\.\d+\.?\d*").expect("version regex is valid"))
}

/// Strip ANSI escape codes from a string
pub fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // ESC [ ... final byte
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Pull a dotted version out of the lines that look like they carry one.
pub fn extract_version(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.to_lowercase().contains("version") || line.contains('v'))
        .find_map(|line| version_regex().find(line).map(|m| m.as_str().to_string()))
}

/// First 50 characters of the output, marked when cut.
pub fn summarize_output(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.chars().count() > SUMMARY_LIMIT {
        let head: String = trimmed.chars().take(SUMMARY_LIMIT).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

/// Ask `binary` for its version, trying each flag in [`VERSION_FLAGS`].
///
/// The first flag producing any output wins, regardless of exit status:
/// plenty of tools print their banner and then exit non-zero on an unknown
/// flag. Returns `None` when the binary cannot be started or stays silent.
pub async fn get_tool_version(runner: &dyn CommandRunner, binary: &str) -> Option<String> {
    for flag in VERSION_FLAGS {
        let invocation = Invocation::exec(binary, [flag]);
        let result = match runner.run(&invocation, &StdoutTarget::Capture).await {
            Ok(result) => result,
            Err(_) => return None,
        };

        let raw = if !result.stdout.trim().is_empty() {
            &result.stdout
        } else {
            &result.stderr
        };
        let clean = strip_ansi_codes(raw);
        if clean.trim().is_empty() {
            continue;
        }

        return Some(extract_version(&clean).unwrap_or_else(|| summarize_output(&clean)));
    }

    None
}
