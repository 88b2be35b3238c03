//! External Android tooling: apktool, zipalign, the APK signer and adb.
//!
//! [`Toolchain::resolve`] checks every tool up front so a missing
//! prerequisite fails the run before anything touches the filesystem.

use crate::config::ToolsConfig;
use crate::error::{PipelineError, Result};
use crate::tool::ToolCommand;
use crate::utils::java;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod adb;
pub mod apktool;
pub mod signer;
pub mod zipalign;

/// Extension of a package file inside a bundle.
pub const APK_EXTENSION: &str = "apk";

/// Fully resolved locations of every external tool a run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub java: PathBuf,
    pub apktool_jar: PathBuf,
    pub signer_jar: PathBuf,
    pub zipalign: PathBuf,
    pub adb: Option<PathBuf>,
}

impl Toolchain {
    /// Resolves the configured tools. `adb` is only required when `need_adb`.
    pub fn resolve(config: &ToolsConfig, need_adb: bool) -> Result<Self> {
        let java = match &config.java {
            Some(java) => resolve_program("java", java)?,
            None => java::locate_java()?,
        };

        let apktool_jar = require_file("apktool", &config.apktool_jar)?;
        let signer_jar = require_file("apk signer", &config.signer_jar)?;
        let zipalign = resolve_program("zipalign", &config.zipalign)?;

        let adb = if need_adb {
            Some(resolve_program("adb", &config.adb)?)
        } else {
            None
        };

        let toolchain = Self {
            java,
            apktool_jar,
            signer_jar,
            zipalign,
            adb,
        };
        debug!("Resolved toolchain: {:?}", toolchain);

        Ok(toolchain)
    }

    /// `java -jar <jar>` with no further arguments.
    pub(crate) fn java_jar(&self, jar: &Path) -> ToolCommand {
        ToolCommand::new(&self.java).arg("-jar").arg(jar)
    }
}

/// Resolves a program either as a path (must exist) or a bare name on `PATH`.
pub fn resolve_program(tool: &str, program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return if program.is_file() {
            Ok(program.to_path_buf())
        } else {
            Err(PipelineError::prerequisite(
                tool,
                format!("{} does not exist", program.display()),
            ))
        };
    }

    which::which(program).map_err(|err| {
        PipelineError::prerequisite(tool, format!("`{}` not found on PATH: {}", program.display(), err))
    })
}

fn require_file(tool: &str, path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(PipelineError::prerequisite(
            tool,
            format!("{} does not exist", path.display()),
        ))
    }
}

/// Package files directly inside `dir`, sorted by file name.
pub fn package_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    files_with_extension(dir, APK_EXTENSION)
}

pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    use anyhow::Context;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
