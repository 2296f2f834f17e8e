// stages.rs - The fixed recon stage table
// Purpose: one immutable descriptor per stage, consumed in order by the
//          pipeline driver; no stage is hand-written as its own block

use std::path::{Path, PathBuf};

use crate::artifacts::{Artifact, OutputLayout};
use crate::executor::{Invocation, StdoutTarget};
use crate::target::Target;

pub const TOTAL_STAGES: usize = 21;

const DIRB_COMMON_WORDLIST: &str = "/usr/share/wordlists/dirb/common.txt";
const FFUF_DIR_MATCH_CODES: &str = "200,204,301,302,307,401,403";
const JS_ASSET_REGEX: &str = r"\.js($|\?)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    /// 1-based position in the run.
    pub index: usize,
    pub name: &'static str,
    /// Prefix of the failure message, e.g. "Subfinder failed: ...".
    pub tool_label: &'static str,
    pub invocation: Invocation,
    pub stdout: StdoutTarget,
    /// Checked (advisory only) after the stage succeeds.
    pub produces: Artifact,
    pub consumes: &'static [Artifact],
}

impl PipelineStage {
    pub fn is_shell_composite(&self) -> bool {
        self.invocation.is_shell_composite()
    }

    pub fn output_path(&self, layout: &OutputLayout) -> PathBuf {
        self.produces.path(layout)
    }
}

/// Quote a path for a bash composite.
fn sh(path: &Path) -> String {
    let raw = path.to_string_lossy();
    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];
    if !raw.is_empty() && !raw.contains(SHELL_META) {
        return raw.into_owned();
    }
    format!("'{}'", raw.replace('\'', "'\\''"))
}

fn arg(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

/// Build the 21 stages for `target`, in execution order.
pub fn recon_stages(target: &Target, layout: &OutputLayout) -> Vec<PipelineStage> {
    use Artifact::*;

    let p = |a: Artifact| a.path(layout);
    let to_file = |a: Artifact| StdoutTarget::File(a.path(layout));
    let domain = target.as_str();

    let mut stages = Vec::with_capacity(TOTAL_STAGES);
    let mut push = |name: &'static str,
                    tool_label: &'static str,
                    invocation: Invocation,
                    stdout: StdoutTarget,
                    produces: Artifact,
                    consumes: &'static [Artifact]| {
        stages.push(PipelineStage {
            index: stages.len() + 1,
            name,
            tool_label,
            invocation,
            stdout,
            produces,
            consumes,
        });
    };

    push(
        "subfinder",
        "Subfinder",
        Invocation::exec("subfinder", ["-d", domain, "-all", "-silent"]),
        to_file(Subfinder),
        Subfinder,
        &[],
    );
    push(
        "amass passive",
        "Amass passive",
        Invocation::exec("amass", ["enum", "-passive", "-d", domain]),
        to_file(AmassPassive),
        AmassPassive,
        &[],
    );
    push(
        "merge and de-duplicate subdomains",
        "Merge",
        Invocation::shell(format!("cat {} {} | sort -u", sh(&p(Subfinder)), sh(&p(AmassPassive)))),
        to_file(SubsUnique),
        SubsUnique,
        &[Subfinder, AmassPassive],
    );
    push(
        "DNS resolution",
        "DNSx",
        Invocation::exec(
            "dnsx",
            vec![
                "-l".to_string(),
                arg(p(SubsUnique)),
                "-a".into(),
                "-aaaa".into(),
                "-cname".into(),
                "-ns".into(),
                "-resp".into(),
            ],
        ),
        to_file(DnsResolved),
        DnsResolved,
        &[SubsUnique],
    );
    push(
        "extract resolved hosts",
        "Host extraction",
        Invocation::shell(format!("awk '{{print $1}}' {} | sort -u", sh(&p(DnsResolved)))),
        to_file(HostsResolved),
        HostsResolved,
        &[DnsResolved],
    );
    push(
        "naabu top 1000 ports scan",
        "Naabu top 1000",
        Invocation::exec(
            "naabu",
            vec![
                "-list".to_string(),
                arg(p(HostsResolved)),
                "-p".into(),
                "top-1000".into(),
                "-rate".into(),
                "2000".into(),
            ],
        ),
        to_file(PortsTop1k),
        PortsTop1k,
        &[HostsResolved],
    );
    push(
        "naabu full TCP sweep",
        "Naabu full sweep",
        Invocation::exec(
            "naabu",
            vec![
                "-list".to_string(),
                arg(p(HostsResolved)),
                "-p".into(),
                "-".into(),
                "-rate".into(),
                "500".into(),
            ],
        ),
        to_file(PortsFull),
        PortsFull,
        &[HostsResolved],
    );
    push(
        "merge open ports",
        "Port merge",
        Invocation::shell(format!("cat {} {} | sort -u", sh(&p(PortsTop1k)), sh(&p(PortsFull)))),
        to_file(OpenPorts),
        OpenPorts,
        &[PortsTop1k, PortsFull],
    );
    push(
        "httpx from subdomains",
        "HTTPx subdomains",
        httpx_probe(p(SubsUnique)),
        to_file(HttpSubs),
        HttpSubs,
        &[SubsUnique],
    );
    push(
        "httpx from open ports",
        "HTTPx ports",
        httpx_probe(p(OpenPorts)),
        to_file(HttpPorts),
        HttpPorts,
        &[OpenPorts],
    );
    push(
        "merge live URLs",
        "URL merge",
        Invocation::shell(format!(
            "cat {} {} | awk '{{print $1}}' | sort -u",
            sh(&p(HttpSubs)),
            sh(&p(HttpPorts))
        )),
        to_file(LiveUrls),
        LiveUrls,
        &[HttpSubs, HttpPorts],
    );
    push(
        "gowitness screenshots",
        "Gowitness",
        Invocation::exec(
            "gowitness",
            vec![
                "file".to_string(),
                "-f".into(),
                arg(p(LiveUrls)),
                "-t".into(),
                "5".into(),
                "--timeout".into(),
                "10".into(),
                "--log-level".into(),
                "warn".into(),
                "--destination".into(),
                arg(layout.screenshots_dir.clone()),
                "--json".into(),
                arg(p(ScreenshotManifest)),
            ],
        ),
        StdoutTarget::Capture,
        ScreenshotManifest,
        &[LiveUrls],
    );
    push(
        "CNAME takeover candidates",
        "CNAME extraction",
        Invocation::shell(format!("awk '/CNAME/ {{print $1,$5}}' {}", sh(&p(DnsResolved)))),
        to_file(CnameCandidates),
        CnameCandidates,
        &[DnsResolved],
    );
    push(
        "nuclei high-severity web scan",
        "Nuclei web scan",
        Invocation::exec(
            "nuclei",
            vec![
                "-l".to_string(),
                arg(p(LiveUrls)),
                "-severity".into(),
                "critical,high,medium".into(),
                "-rl".into(),
                "50".into(),
                "-c".into(),
                "50".into(),
            ],
        ),
        to_file(NucleiWeb),
        NucleiWeb,
        &[LiveUrls],
    );
    push(
        "nuclei takeover scan",
        "Nuclei takeover scan",
        Invocation::exec(
            "nuclei",
            vec![
                "-t".to_string(),
                "http/takeovers/".into(),
                "-l".into(),
                arg(p(SubsUnique)),
                "-rl".into(),
                "30".into(),
                "-c".into(),
                "30".into(),
            ],
        ),
        to_file(NucleiTakeover),
        NucleiTakeover,
        &[SubsUnique],
    );
    push(
        "GAU historical endpoints",
        "GAU",
        Invocation::exec("gau", ["--providers", "wayback,otx,urlscan", domain]),
        to_file(HistoricalUrls),
        HistoricalUrls,
        &[],
    );
    push(
        "extract parameters",
        "Parameter extraction",
        Invocation::shell(format!("cat {} | unfurl --unique keys", sh(&p(HistoricalUrls)))),
        to_file(Params),
        Params,
        &[HistoricalUrls],
    );
    push(
        "ffuf directory fuzzing",
        "FFUF directory fuzzing",
        Invocation::exec(
            "ffuf",
            vec![
                "-u".to_string(),
                target.https_url("FUZZ"),
                "-w".into(),
                DIRB_COMMON_WORDLIST.into(),
                "-mc".into(),
                FFUF_DIR_MATCH_CODES.into(),
                "-o".into(),
                arg(p(FfufDirs)),
                "-of".into(),
                "txt".into(),
            ],
        ),
        StdoutTarget::Capture,
        FfufDirs,
        &[],
    );
    push(
        "ffuf parameter fuzzing",
        "FFUF parameter fuzzing",
        Invocation::exec(
            "ffuf",
            vec![
                "-u".to_string(),
                target.https_url("search?FUZZ=test"),
                "-w".into(),
                arg(p(Params)),
                "-mc".into(),
                "all".into(),
                "-o".into(),
                arg(p(FfufParams)),
                "-of".into(),
                "txt".into(),
            ],
        ),
        StdoutTarget::Capture,
        FfufParams,
        &[Params],
    );
    push(
        "httpx JS scraping",
        "HTTPx JS scraping",
        Invocation::exec(
            "httpx",
            vec![
                "-l".to_string(),
                arg(p(LiveUrls)),
                "-path".into(),
                "discovery".into(),
                "-store-response-dir".into(),
                arg(layout.js_out_dir.clone()),
                "-match-regex".into(),
                JS_ASSET_REGEX.into(),
            ],
        ),
        to_file(JsEndpoints),
        JsEndpoints,
        &[LiveUrls],
    );
    push(
        "robots.txt check",
        "Robots.txt check",
        Invocation::exec("curl", vec!["-s".to_string(), target.https_url("robots.txt")]),
        to_file(Robots),
        Robots,
        &[],
    );

    stages
}

fn httpx_probe(list: PathBuf) -> Invocation {
    Invocation::exec(
        "httpx",
        vec![
            "-l".to_string(),
            arg(list),
            "-status-code".into(),
            "-title".into(),
            "-tech-detect".into(),
            "-follow-redirects".into(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn stages() -> Vec<PipelineStage> {
        let target = Target::parse("example.com").unwrap();
        recon_stages(&target, &OutputLayout::default())
    }

    #[test]
    fn test_indices_are_contiguous() {
        let stages = stages();
        assert_eq!(stages.len(), TOTAL_STAGES);
        for (i, stage) in stages.iter().enumerate() {
            assert_eq!(stage.index, i + 1);
        }
    }

    #[test]
    fn test_dependencies_point_backwards() {
        let mut produced = HashSet::new();
        for stage in stages() {
            for needed in stage.consumes {
                assert!(
                    produced.contains(needed),
                    "stage {} consumes {:?} before it is produced",
                    stage.index,
                    needed
                );
            }
            assert!(produced.insert(stage.produces), "{:?} produced twice", stage.produces);
        }
        for artifact in Artifact::NUMBERED {
            assert!(produced.contains(&artifact));
        }
        assert!(produced.contains(&Artifact::ScreenshotManifest));
    }

    #[test]
    fn test_shell_composites() {
        let composite: Vec<usize> = stages()
            .iter()
            .filter(|s| s.is_shell_composite())
            .map(|s| s.index)
            .collect();
        assert_eq!(composite, vec![3, 5, 8, 11, 13, 17]);
    }

    #[test]
    fn test_command_lines() {
        let stages = stages();
        assert_eq!(
            stages[0].invocation.to_string(),
            "subfinder -d example.com -all -silent"
        );
        assert_eq!(
            stages[2].invocation.to_string(),
            "bash -c cat output/01_subfinder.txt output/02_amass_passive.txt | sort -u"
        );
        assert_eq!(
            stages[10].invocation.to_string(),
            "bash -c cat output/09_httpx_subs.txt output/10_httpx_ports.txt | awk '{print $1}' | sort -u"
        );
        assert_eq!(
            stages[12].invocation.to_string(),
            "bash -c awk '/CNAME/ {print $1,$5}' output/04_dnsx_resolved.txt"
        );
        assert_eq!(
            stages[20].invocation.to_string(),
            "curl -s https://example.com/robots.txt"
        );
        assert_eq!(
            stages[11].invocation.flag_value("--json"),
            Some("screenshots/gowitness.json")
        );
        assert_eq!(
            stages[19].invocation.flag_value("-store-response-dir"),
            Some("output/js_out")
        );
    }

    #[test]
    fn test_tool_written_outputs_are_not_redirected() {
        for stage in stages() {
            match stage.index {
                12 | 18 | 19 => assert_eq!(stage.stdout, StdoutTarget::Capture),
                _ => assert_eq!(
                    stage.stdout,
                    StdoutTarget::File(stage.output_path(&OutputLayout::default()))
                ),
            }
        }
    }

    #[test]
    fn test_paths_with_spaces_are_quoted() {
        let target = Target::parse("example.com").unwrap();
        let layout = OutputLayout::new("/tmp/my scans");
        let stages = recon_stages(&target, &layout);
        assert_eq!(
            stages[4].invocation,
            Invocation::shell("awk '{print $1}' '/tmp/my scans/output/04_dnsx_resolved.txt' | sort -u")
        );
    }
}
