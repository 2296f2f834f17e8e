// artifacts.rs - Output layout and the files each stage leaves behind
// Purpose: name every artifact once, resolve it against a layout root,
//          and inspect what a stage actually wrote

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════
// OUTPUT LAYOUT
// ═══════════════════════════════════════════════════════════════════════════

/// Directory tree a run writes into.
///
/// With an empty root every path stays relative (`output/01_subfinder.txt`),
/// which is what the external tools see on their command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub js_out_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let output_dir = root.join("output");
        let screenshots_dir = root.join("screenshots");
        let js_out_dir = output_dir.join("js_out");
        Self {
            root,
            output_dir,
            screenshots_dir,
            js_out_dir,
        }
    }

    /// Directories in creation order.
    pub fn directories(&self) -> [&Path; 3] {
        [&self.output_dir, &self.screenshots_dir, &self.js_out_dir]
    }

    /// Create every directory of the layout; existing ones are fine.
    pub fn create_all(&self) -> Result<()> {
        for dir in self.directories() {
            fs::create_dir_all(dir).map_err(|source| Error::Directory {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// The progress journal lives next to `output/`, never inside it.
    pub fn journal_dir(&self) -> PathBuf {
        if self.root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            self.root.clone()
        }
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ARTIFACTS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Subfinder,
    AmassPassive,
    SubsUnique,
    DnsResolved,
    HostsResolved,
    PortsTop1k,
    PortsFull,
    OpenPorts,
    HttpSubs,
    HttpPorts,
    LiveUrls,
    ScreenshotManifest,
    CnameCandidates,
    NucleiWeb,
    NucleiTakeover,
    HistoricalUrls,
    Params,
    FfufDirs,
    FfufParams,
    JsEndpoints,
    Robots,
}

impl Artifact {
    /// The numbered text files written under `output/`.
    pub const NUMBERED: [Artifact; 20] = [
        Artifact::Subfinder,
        Artifact::AmassPassive,
        Artifact::SubsUnique,
        Artifact::DnsResolved,
        Artifact::HostsResolved,
        Artifact::PortsTop1k,
        Artifact::PortsFull,
        Artifact::OpenPorts,
        Artifact::HttpSubs,
        Artifact::HttpPorts,
        Artifact::LiveUrls,
        Artifact::CnameCandidates,
        Artifact::NucleiWeb,
        Artifact::NucleiTakeover,
        Artifact::HistoricalUrls,
        Artifact::Params,
        Artifact::FfufDirs,
        Artifact::FfufParams,
        Artifact::JsEndpoints,
        Artifact::Robots,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Subfinder => "01_subfinder.txt",
            Artifact::AmassPassive => "02_amass_passive.txt",
            Artifact::SubsUnique => "03_subs_uniq.txt",
            Artifact::DnsResolved => "04_dnsx_resolved.txt",
            Artifact::HostsResolved => "05_hosts_resolved.txt",
            Artifact::PortsTop1k => "06_naabu_top1k.txt",
            Artifact::PortsFull => "07_naabu_full.txt",
            Artifact::OpenPorts => "08_open_ports.txt",
            Artifact::HttpSubs => "09_httpx_subs.txt",
            Artifact::HttpPorts => "10_httpx_ports.txt",
            Artifact::LiveUrls => "11_live_urls.txt",
            Artifact::ScreenshotManifest => "gowitness.json",
            Artifact::CnameCandidates => "12_cname_candidates.txt",
            Artifact::NucleiWeb => "13_nuclei_web.txt",
            Artifact::NucleiTakeover => "14_nuclei_takeover.txt",
            Artifact::HistoricalUrls => "15_gau.txt",
            Artifact::Params => "16_params.txt",
            Artifact::FfufDirs => "17_ffuf_dirs.txt",
            Artifact::FfufParams => "18_ffuf_params.txt",
            Artifact::JsEndpoints => "19_js_endpoints.txt",
            Artifact::Robots => "20_robots.txt",
        }
    }

    /// Short human label used in the run summary.
    pub fn label(self) -> &'static str {
        match self {
            Artifact::Subfinder => "subfinder subdomains",
            Artifact::AmassPassive => "amass subdomains",
            Artifact::SubsUnique => "unique subdomains",
            Artifact::DnsResolved => "DNS records",
            Artifact::HostsResolved => "resolved hosts",
            Artifact::PortsTop1k => "top-1000 port hits",
            Artifact::PortsFull => "full sweep port hits",
            Artifact::OpenPorts => "open ports",
            Artifact::HttpSubs => "HTTP services (subdomains)",
            Artifact::HttpPorts => "HTTP services (ports)",
            Artifact::LiveUrls => "live URLs",
            Artifact::ScreenshotManifest => "screenshot manifest",
            Artifact::CnameCandidates => "CNAME takeover candidates",
            Artifact::NucleiWeb => "nuclei web findings",
            Artifact::NucleiTakeover => "nuclei takeover findings",
            Artifact::HistoricalUrls => "historical URLs",
            Artifact::Params => "parameter names",
            Artifact::FfufDirs => "ffuf directory lines",
            Artifact::FfufParams => "ffuf parameter lines",
            Artifact::JsEndpoints => "JS endpoints",
            Artifact::Robots => "robots.txt lines",
        }
    }

    pub fn path(self, layout: &OutputLayout) -> PathBuf {
        match self {
            Artifact::ScreenshotManifest => layout.screenshots_dir.join(self.file_name()),
            _ => layout.output_dir.join(self.file_name()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECTION
// ═══════════════════════════════════════════════════════════════════════════

/// What a stage left on disk. Content is never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Ready { bytes: u64 },
    Empty,
    Missing,
}

impl ArtifactStatus {
    pub fn is_ready(self) -> bool {
        matches!(self, ArtifactStatus::Ready { .. })
    }
}

pub fn inspect_artifact(path: &Path) -> ArtifactStatus {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => ArtifactStatus::Ready { bytes: meta.len() },
        Ok(_) => ArtifactStatus::Empty,
        Err(_) => ArtifactStatus::Missing,
    }
}

pub fn count_lines(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = BufReader::new(file);
    Ok(reader.lines().map_while(std::result::Result::ok).count())
}
