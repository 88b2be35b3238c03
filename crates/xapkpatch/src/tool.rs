//! Shell-free invocation of external tools.

use crate::error::{PipelineError, Result};
use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// A program plus its argument vector. Never joined into a shell string
/// except for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Full argument vector, program first.
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.as_os_str().to_os_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// The argument vector rendered as strings (lossy), mostly for tests.
    pub fn argv_lossy(&self) -> Vec<String> {
        self.argv()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl Display for ToolCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.argv_lossy().join(" "))
    }
}

/// Runs one external command to completion.
pub trait ToolRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<()>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &mut R {
    fn run(&mut self, command: &ToolCommand) -> Result<()> {
        (**self).run(command)
    }
}

/// Spawns real child processes, blocking until each exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<()> {
        debug!("Running {}", command);

        let output = Command::new(command.program())
            .args(command.get_args())
            .output()
            .map_err(|err| {
                warn!("Failed to start {}: {}", command.program().display(), err);
                PipelineError::ExternalToolFailure {
                    command: command.to_string(),
                    status: None,
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!("  {}", line);
        }

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!("  {}", line);
        }

        Err(PipelineError::ExternalToolFailure {
            command: command.to_string(),
            status: output.status.code(),
        })
    }
}
