//! The single point where a run suspends for hand edits to the decoded tree.

use crate::error::{PipelineError, Result};
use anyhow::Context;
use inquire::{Confirm, InquireError};
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// Blocks until the caller may continue to recompilation.
pub trait ResumeSignal {
    fn wait(&mut self, workspace: &Path) -> Result<()>;
}

impl<R: ResumeSignal + ?Sized> ResumeSignal for &mut R {
    fn wait(&mut self, workspace: &Path) -> Result<()> {
        (**self).wait(workspace)
    }
}

/// Asks on the terminal, falling back to a plain line read when stdin is
/// not interactive.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptResume;

impl ResumeSignal for PromptResume {
    fn wait(&mut self, workspace: &Path) -> Result<()> {
        info!(" Temporary folder path: {}", workspace.display());

        let answer = Confirm::new("Patches have been applied. Continue with rebuilding?")
            .with_default(true)
            .with_help_message("Edit the decoded files now, then confirm")
            .prompt();

        match answer {
            Ok(true) => Ok(()),
            Ok(false)
            | Err(InquireError::OperationCanceled)
            | Err(InquireError::OperationInterrupted) => Err(PipelineError::Interrupted),
            Err(InquireError::NotTTY) => wait_for_line(),
            Err(err) => Err(anyhow::Error::new(err)
                .context("Failed to read the resume prompt")
                .into()),
        }
    }
}

fn wait_for_line() -> Result<()> {
    info!(" Press enter to continue...");

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    // EOF means nobody will ever resume us.
    if read == 0 {
        return Err(PipelineError::Interrupted);
    }

    Ok(())
}

/// Resumes immediately. Used when no pause was requested and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Continue;

impl ResumeSignal for Continue {
    fn wait(&mut self, _workspace: &Path) -> Result<()> {
        Ok(())
    }
}
