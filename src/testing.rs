//! Scripted [`CommandRunner`] for unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::executor::{CommandResult, CommandRunner, Invocation, StdoutTarget};

/// What a scripted invocation returns.
#[derive(Debug, Clone)]
pub struct Reply {
    pub stdout: String,
    pub stderr: String,
    pub succeeded: bool,
}

type Handler = Box<dyn Fn(&Invocation, &StdoutTarget) -> Reply + Send + Sync>;

/// Records every invocation and answers from a handler.
///
/// - `Exec` of a program not registered with [`with_tools`](Self::with_tools)
///   fails to spawn, like a binary missing from `PATH`; `Shell` always runs.
/// - Reply stdout is written to the redirect file, if any.
/// - On success, a value after `-o` or `--json` is treated as a file the
///   tool writes itself and receives the same content.
pub struct ScriptedRunner {
    tools: HashSet<String>,
    handler: Option<Handler>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            tools: HashSet::new(),
            handler: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn on_run<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation, &StdoutTarget) -> Reply + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn reply(stdout: &str, stderr: &str, succeeded: bool) -> Reply {
        Reply {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            succeeded,
        }
    }

    /// Rendered command lines, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, program: &str) -> Vec<String> {
        let prefix = format!("{} ", program);
        self.calls()
            .into_iter()
            .filter(|c| c == program || c.starts_with(&prefix))
            .collect()
    }

    fn default_reply(invocation: &Invocation) -> Reply {
        Self::reply(&format!("{}\n", invocation.program()), "", true)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    fn locate(&self, binary: &str) -> Option<PathBuf> {
        self.tools
            .contains(binary)
            .then(|| PathBuf::from("/usr/bin").join(binary))
    }

    async fn run(&self, invocation: &Invocation, stdout: &StdoutTarget) -> Result<CommandResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.to_string());
        }

        if let Invocation::Exec { program, .. } = invocation {
            if !self.tools.contains(program) {
                return Err(Error::Spawn {
                    program: program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
        }

        let reply = match &self.handler {
            Some(handler) => handler(invocation, stdout),
            None => Self::default_reply(invocation),
        };

        let captured = match stdout {
            StdoutTarget::Capture => reply.stdout.clone(),
            StdoutTarget::File(path) => {
                std::fs::write(path, &reply.stdout).map_err(|e| Error::io(path, e))?;
                String::new()
            }
        };

        if reply.succeeded {
            for flag in ["-o", "--json"] {
                if let Some(path) = invocation.flag_value(flag) {
                    std::fs::write(path, &reply.stdout).map_err(|e| Error::io(path, e))?;
                }
            }
        }

        Ok(CommandResult {
            succeeded: reply.succeeded,
            exit_code: Some(if reply.succeeded { 0 } else { 1 }),
            stdout: captured,
            stderr: reply.stderr,
        })
    }
}
