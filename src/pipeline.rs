// pipeline.rs - Sequential, fail-fast recon stage runner
// Purpose: preflight (tools + directories), then fold over the stage table,
//          stopping at the first stage whose process exits non-zero

use colored::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::artifacts::{count_lines, inspect_artifact, Artifact, ArtifactStatus, OutputLayout};
use crate::console;
use crate::error::{Error, Result};
use crate::executor::CommandRunner;
use crate::progress::ProgressTracker;
use crate::stages::{recon_stages, PipelineStage};
use crate::target::Target;
use crate::tools::REQUIRED_TOOLS;

/// Outcome of one successful stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub index: usize,
    pub name: &'static str,
    pub artifact: Artifact,
    pub path: PathBuf,
    pub status: ArtifactStatus,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: Target,
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Stages that succeeded but left nothing usable behind.
    pub fn warnings(&self) -> impl Iterator<Item = &StageReport> {
        self.stages.iter().filter(|s| !s.status.is_ready())
    }

    pub fn print_summary(&self, layout: &OutputLayout) {
        println!("\n{}", "═══════════════════════════════════════════════════════════════".green().bold());
        println!("{}", format!("  RECON COMPLETED: {}", self.target).green().bold());
        println!("{}", "═══════════════════════════════════════════════════════════════".green().bold());

        for report in &self.stages {
            let line = match report.status {
                ArtifactStatus::Ready { .. } => {
                    let lines = count_lines(&report.path).unwrap_or(0);
                    format!("  {:<28} {:>6}  {}", report.artifact.label(), lines, report.path.display())
                        .cyan()
                }
                ArtifactStatus::Empty | ArtifactStatus::Missing => {
                    format!("  {:<28} {:>6}  {}", report.artifact.label(), "-", report.path.display())
                        .yellow()
                }
            };
            println!("{}", line);
        }

        let warnings = self.warnings().count();
        if warnings > 0 {
            println!("{}", format!("  {} stage(s) produced no output", warnings).yellow());
        }
        println!("{}", format!("  Duration: {:.2}s", self.elapsed.as_secs_f64()).cyan());
        println!(
            "{}",
            format!(
                "  Results: {}/ and {}/",
                layout.output_dir.display(),
                layout.screenshots_dir.display()
            )
            .green()
        );
        println!("{}", "═══════════════════════════════════════════════════════════════".green().bold());
    }
}

pub struct ReconPipeline<'a> {
    target: Target,
    layout: OutputLayout,
    stages: Vec<PipelineStage>,
    runner: &'a dyn CommandRunner,
    progress: ProgressTracker,
}

impl<'a> ReconPipeline<'a> {
    pub fn new(
        target: Target,
        layout: OutputLayout,
        runner: &'a dyn CommandRunner,
        progress: ProgressTracker,
    ) -> Self {
        let stages = recon_stages(&target, &layout);
        Self {
            target,
            layout,
            stages,
            runner,
            progress,
        }
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn check_tools(&self) -> Result<()> {
        console::action("Checking required tools...");

        let mut missing = Vec::new();
        for tool in REQUIRED_TOOLS {
            match self.runner.locate(tool) {
                Some(_) => console::success(&format!("{} found", tool)),
                None => missing.push(tool.to_string()),
            }
        }

        if !missing.is_empty() {
            console::error(&format!("Missing required tools: {}", missing.join(", ")));
            console::error("Please run recon-install first to install all required tools.");
            self.progress.tools_missing(&missing);
            return Err(Error::MissingTools(missing));
        }

        console::success("All required tools are available");
        Ok(())
    }

    pub fn create_directories(&self) -> Result<()> {
        console::action("Creating directories...");
        if let Err(e) = self.layout.create_all() {
            console::error(&e.to_string());
            return Err(e);
        }
        for dir in self.layout.directories() {
            console::success(&format!("Created directory: {}/", dir.display()));
        }
        Ok(())
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        console::info(&format!("Starting reconnaissance on: {}", self.target));
        self.progress.scan_started();

        if let Err(e) = self.check_tools().and_then(|_| self.create_directories()) {
            self.progress.scan_failed(&e.to_string());
            return Err(e);
        }

        console::info(&format!("Output directory: {}", self.layout.output_dir.display()));
        console::info(&format!(
            "Screenshots directory: {}",
            self.layout.screenshots_dir.display()
        ));

        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            match self.run_stage(stage).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    self.progress.scan_failed(&e.to_string());
                    return Err(e);
                }
            }
        }

        self.progress.scan_completed();
        console::success(&format!(
            "Recon complete! Results in {}/ and {}/",
            self.layout.output_dir.display(),
            self.layout.screenshots_dir.display()
        ));

        Ok(RunSummary {
            target: self.target.clone(),
            stages: reports,
            elapsed: started.elapsed(),
        })
    }

    fn percent(&self, completed: usize) -> f32 {
        completed as f32 * 100.0 / self.stages.len() as f32
    }

    async fn run_stage(&self, stage: &PipelineStage) -> Result<StageReport> {
        let total = self.stages.len();
        console::step(stage.index, total, stage.name);
        self.progress
            .stage_started(stage.index, stage.name, self.percent(stage.index - 1));

        let spinner = console::stage_spinner(&format!("[{}/{}] {}", stage.index, total, stage.name));
        let outcome = self.runner.run(&stage.invocation, &stage.stdout).await;
        spinner.finish_and_clear();

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                self.progress
                    .stage_failed(stage.index, stage.name, &e.to_string(), self.percent(stage.index - 1));
                console::error(&format!("{} failed: {}", stage.tool_label, e));
                return Err(e);
            }
        };

        if !result.succeeded {
            let message = result.captured_output();
            self.progress
                .stage_failed(stage.index, stage.name, &message, self.percent(stage.index - 1));
            console::error(&format!("{} failed: {}", stage.tool_label, message));
            return Err(Error::StageFailed {
                index: stage.index,
                name: stage.name.to_string(),
                message,
            });
        }

        let path = stage.output_path(&self.layout);
        let status = inspect_artifact(&path);
        let progress = self.percent(stage.index);
        match status {
            ArtifactStatus::Ready { .. } => {
                console::success(&format!("{} created successfully", path.display()));
            }
            ArtifactStatus::Empty | ArtifactStatus::Missing => {
                console::warn(&format!("{} is empty or not created", path.display()));
                self.progress.artifact_warning(stage.index, &path, progress);
            }
        }
        self.progress.stage_completed(stage.index, stage.name, progress);

        Ok(StageReport {
            index: stage.index,
            name: stage.name,
            artifact: stage.produces,
            path,
            status,
        })
    }
}
