//! Repackages split-APK bundles (XAPK): decode the base APK, patch its
//! manifest, rebuild, align, sign and zip everything back up.

pub mod prelude {
    pub use crate::apk::Toolchain;
    pub use crate::cli::{Cli, program};
    pub use crate::error::{PipelineError, Result};
    pub use crate::patch::{PatchKind, PatchSet};
    pub use crate::pipeline::{Outcome, Pipeline, PipelineOptions, Stage};
    pub use crate::tool::{ProcessRunner, ToolCommand, ToolRunner};
    pub use crate::tui::pause::{Continue, PromptResume, ResumeSignal};
    pub use crate::tui::progress;
    pub use crate::utils::writer::MultiProgressWriter;
    pub use crate::workspace::Workspace;
}

pub mod apk;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod patch;
pub mod pipeline;
pub mod tool;
pub mod tui;
pub mod utils;
pub mod workspace;
