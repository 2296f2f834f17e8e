// executor.rs - Process boundary to the external recon tools
// Purpose: every external program (or bash pipeline) goes through the
//          CommandRunner trait so the pipeline and installer can be driven
//          against a scripted runner in tests

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// What to execute: one program with argv, or a shell composite of
/// standard text utilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Exec { program: String, args: Vec<String> },
    Shell { script: String },
}

impl Invocation {
    pub fn exec<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::Exec {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shell(script: impl Into<String>) -> Self {
        Invocation::Shell {
            script: script.into(),
        }
    }

    pub fn is_shell_composite(&self) -> bool {
        matches!(self, Invocation::Shell { .. })
    }

    /// The program actually spawned.
    pub fn program(&self) -> &str {
        match self {
            Invocation::Exec { program, .. } => program,
            Invocation::Shell { .. } => "bash",
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            Invocation::Exec { args, .. } => args,
            Invocation::Shell { .. } => &[],
        }
    }

    /// Value following `flag` in the argument list, if any.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let args = self.args();
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Exec { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            Invocation::Shell { script } => write!(f, "bash -c {}", script),
        }
    }
}

/// Where the child's stdout goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutTarget {
    Capture,
    /// Created or truncated before the child starts.
    File(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub succeeded: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn from_output(output: &Output) -> Self {
        Self {
            succeeded: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Stdout on success; on failure the error text, preferring stderr.
    pub fn captured_output(&self) -> String {
        if self.succeeded {
            return self.stdout.trim().to_string();
        }
        if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else if !self.stdout.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            match self.exit_code {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            }
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Resolve `binary` to an executable on the search path.
    fn locate(&self, binary: &str) -> Option<PathBuf>;

    /// Run to completion. `Err` only when the process could not be started
    /// or its stdout file could not be opened; a non-zero exit is
    /// `Ok` with `succeeded == false`.
    async fn run(&self, invocation: &Invocation, stdout: &StdoutTarget) -> Result<CommandResult>;
}

// ═══════════════════════════════════════════════════════════════════════════
// SYSTEM RUNNER
// ═══════════════════════════════════════════════════════════════════════════

/// Spawns real processes with tokio.
///
/// By default children inherit `PATH`; [`with_search_path`](Self::with_search_path)
/// replaces it both for [`locate`](CommandRunner::locate) and for the
/// children themselves, so `bash -c` composites resolve tools the same way.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    search_path: Option<OsString>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    fn search_path(&self) -> Option<OsString> {
        self.search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
    }

    fn command_for(&self, invocation: &Invocation) -> Command {
        let mut cmd = match invocation {
            Invocation::Exec { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Invocation::Shell { script } => {
                let mut cmd = Command::new("bash");
                cmd.arg("-c").arg(script);
                cmd
            }
        };
        if let Some(search_path) = &self.search_path {
            cmd.env("PATH", search_path);
        }
        cmd
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    fn locate(&self, binary: &str) -> Option<PathBuf> {
        let search_path = self.search_path()?;
        find_in_path(binary, &search_path)
    }

    async fn run(&self, invocation: &Invocation, stdout: &StdoutTarget) -> Result<CommandResult> {
        let mut cmd = self.command_for(invocation);
        cmd.stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match stdout {
            StdoutTarget::Capture => {
                cmd.stdout(Stdio::piped());
            }
            StdoutTarget::File(path) => {
                let file = File::create(path).map_err(|e| Error::io(path, e))?;
                cmd.stdout(Stdio::from(file));
            }
        }

        // `Command::output` would force stdout back to a pipe; waiting on the
        // spawned child keeps the file redirect in place.
        let spawn_error = |source| Error::Spawn {
            program: invocation.program().to_string(),
            source,
        };
        let child = cmd.spawn().map_err(spawn_error)?;
        let output = child.wait_with_output().await.map_err(spawn_error)?;

        Ok(CommandResult::from_output(&output))
    }
}

/// Search each directory of a `PATH`-style list for an executable file.
pub fn find_in_path(binary: &str, search_path: &std::ffi::OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(candidate: &Path) -> bool {
    if !candidate.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(candidate)
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::exec("subfinder", ["-d", "example.com", "-all", "-silent"]);
        assert_eq!(inv.to_string(), "subfinder -d example.com -all -silent");
        assert!(!inv.is_shell_composite());

        let sh = Invocation::shell("cat a b | sort -u");
        assert_eq!(sh.to_string(), "bash -c cat a b | sort -u");
        assert_eq!(sh.program(), "bash");
        assert!(sh.is_shell_composite());
    }

    #[test]
    fn test_flag_value() {
        let inv = Invocation::exec("ffuf", ["-u", "https://x.io/FUZZ", "-o", "out.txt", "-of"]);
        assert_eq!(inv.flag_value("-o"), Some("out.txt"));
        assert_eq!(inv.flag_value("-of"), None);
        assert_eq!(inv.flag_value("-w"), None);
    }

    #[test]
    fn test_captured_output_prefers_stderr_on_failure() {
        let failed = CommandResult {
            succeeded: false,
            exit_code: Some(2),
            stdout: "partial".into(),
            stderr: "boom\n".into(),
        };
        assert_eq!(failed.captured_output(), "boom");

        let quiet = CommandResult {
            succeeded: false,
            exit_code: Some(3),
            ..Default::default()
        };
        assert_eq!(quiet.captured_output(), "exit status 3");

        let ok = CommandResult {
            succeeded: true,
            exit_code: Some(0),
            stdout: " v1.2.3 \n".into(),
            stderr: "noise".into(),
        };
        assert_eq!(ok.captured_output(), "v1.2.3");
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_path_requires_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let tool = dir.path().join("dnsx");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();

        let path = OsString::from(dir.path());
        assert_eq!(find_in_path("dnsx", &path), None);

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_in_path("dnsx", &path), Some(tool));
        assert_eq!(find_in_path("naabu", &path), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_redirects_stdout() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let runner = SystemRunner::new();

        let result = runner
            .run(
                &Invocation::shell("printf 'b\\na\\nb\\n' | sort -u"),
                &StdoutTarget::File(out.clone()),
            )
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.stdout, "");
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a\nb\n");

        let result = runner
            .run(
                &Invocation::exec("echo", ["a.example.com"]),
                &StdoutTarget::File(out.clone()),
            )
            .await
            .unwrap();
        assert!(result.succeeded);
        assert_eq!(
            crate::artifacts::inspect_artifact(&out),
            crate::artifacts::ArtifactStatus::Ready { bytes: 14 }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_path_override_reaches_children() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let tool = dir.path().join("subfinder");
        std::fs::write(&tool, "#!/bin/sh\necho sub.example.com\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut dirs = vec![dir.path().to_path_buf()];
        dirs.extend(std::env::split_paths(&std::env::var_os("PATH").unwrap_or_default()));
        let runner = SystemRunner::with_search_path(std::env::join_paths(dirs).unwrap());

        assert_eq!(runner.locate("subfinder"), Some(tool));
        let result = runner
            .run(&Invocation::shell("subfinder | sort -u"), &StdoutTarget::Capture)
            .await
            .unwrap();
        assert_eq!(result.captured_output(), "sub.example.com");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_reports_failure_and_spawn_errors() {
        let runner = SystemRunner::new();
        let failed = runner
            .run(&Invocation::shell("echo nope >&2; exit 3"), &StdoutTarget::Capture)
            .await
            .unwrap();
        assert!(!failed.succeeded);
        assert_eq!(failed.exit_code, Some(3));
        assert_eq!(failed.captured_output(), "nope");

        let missing = runner
            .run(
                &Invocation::exec("definitely-not-a-recon-tool", Vec::<String>::new()),
                &StdoutTarget::Capture,
            )
            .await;
        assert!(matches!(missing, Err(Error::Spawn { .. })));
    }
}
