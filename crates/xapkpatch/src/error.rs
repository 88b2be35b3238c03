//! Error kinds surfaced by a repackaging run.
//!
//! Every variant of [`PipelineError`] is terminal: the pipeline releases its
//! workspace and the binary exits non-zero. [`DescriptorError`] never escapes
//! the bundle module; it is collapsed into [`PipelineError::BaseApkNotFound`].

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Error: required tool `{tool}` is not available: {reason}")]
    PrerequisiteMissing { tool: String, reason: String },

    #[error("Error: Base APK not found")]
    BaseApkNotFound,

    #[error("Error: running command: {command}")]
    ExternalToolFailure {
        command: String,
        status: Option<i32>,
    },

    #[error("Error: manual edit pause was aborted")]
    Interrupted,

    #[error("Error: {0:#}")]
    UnexpectedInternal(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn prerequisite(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PrerequisiteMissing {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Why the bundle descriptor could not name a base package.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("descriptor file is missing")]
    Missing,

    #[error("descriptor file could not be read: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("descriptor file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("descriptor lists no split with id \"base\"")]
    NoBaseEntry,

    #[error("base split file {0} does not exist in the bundle")]
    BaseFileMissing(PathBuf),

    #[error("base split path {0} escapes the bundle root")]
    UnsafePath(String),
}
