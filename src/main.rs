// main.rs - recon: sequential reconnaissance pipeline
// Purpose: validate the target, check the toolchain, then drive the 21
//          recon stages in order, stopping at the first failure

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use reconpipe::artifacts::OutputLayout;
use reconpipe::console;
use reconpipe::executor::SystemRunner;
use reconpipe::pipeline::ReconPipeline;
use reconpipe::progress::ProgressTracker;
use reconpipe::target::Target;

/// Automated Recon Pipeline Tool
#[derive(Parser, Debug)]
#[command(
    name = "recon",
    version,
    about = "Automated recon pipeline: subdomains, probing, crawling, scanning",
    long_about = r#"
Runs 21 recon stages against a single domain, strictly in order. Each stage
writes one artifact under ./output (JavaScript URLs under ./output/js_out,
the screenshot manifest under ./screenshots). The first failing stage stops
the run; artifacts already written are kept.

OUTPUT FILES:

  output/
  ├── 01_subfinder.txt ... 20_robots.txt
  └── js_out/
  screenshots/
  └── gowitness.json
  progress.jsonl              # Run journal (one JSON event per line)
  current_status.json         # Last recorded event
"#,
    after_help = r#"
EXAMPLES:

  recon --target example.com
  recon --target subdomain.example.com

REQUIRED TOOLS:

  subfinder, amass, dnsx, naabu, httpx, nuclei, gau, unfurl, ffuf,
  gowitness, curl

  Install with: sudo recon-install
"#
)]
struct Args {
    /// Target domain to scan (e.g., example.com)
    #[arg(short, long, value_name = "DOMAIN")]
    target: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    console::print_banner(
        "RECON - Automated Recon Pipeline",
        "Subdomains → DNS → Ports → HTTP → Crawling → Vulnerabilities",
    );

    // The library reports its own failures; only the exit status is left.
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run(args: &Args) -> Result<()> {
    let target = Target::parse(&args.target).inspect_err(|e| console::error(&e.to_string()))?;
    let layout = OutputLayout::default();
    let scan_id = uuid::Uuid::new_v4().to_string();
    let progress = ProgressTracker::new(scan_id, target.to_string(), layout.journal_dir());
    let runner = SystemRunner::new();
    let pipeline = ReconPipeline::new(target, layout, &runner, progress);
    console::info(&format!("Scan ID: {}", pipeline.progress().scan_id()));

    // ═══════════════════════════════════════════════════════════════════════════
    // RUN: race the pipeline against Ctrl-C; the in-flight child is killed on drop
    // ═══════════════════════════════════════════════════════════════════════════
    tokio::select! {
        outcome = pipeline.run() => {
            let summary = outcome?;
            summary.print_summary(pipeline.layout());
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            console::warn("Reconnaissance interrupted by user");
            pipeline.progress().scan_failed("interrupted by user");
            anyhow::bail!("interrupted")
        }
    }
}
