use super::{Toolchain, files_with_extension};
use crate::tool::ToolCommand;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Detached v4 signature files written next to each signed APK.
pub const SIGNATURE_ARTIFACT_EXTENSION: &str = "idsig";

/// `java -jar signer.jar --apks <dir> --overwrite --skipZipAlign [--allowResign]`
pub fn sign(toolchain: &Toolchain, apks_dir: &Path, allow_resign: bool) -> ToolCommand {
    let cmd = toolchain
        .java_jar(&toolchain.signer_jar)
        .arg("--apks")
        .arg(apks_dir)
        .args(["--overwrite", "--skipZipAlign"]);

    if allow_resign {
        cmd.arg("--allowResign")
    } else {
        cmd
    }
}

/// Deletes the signer's side artifacts from `dir` so they never reach the
/// output archive. Returns what was removed.
pub fn remove_signature_artifacts(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let artifacts = files_with_extension(dir, SIGNATURE_ARTIFACT_EXTENSION)?;

    for artifact in &artifacts {
        std::fs::remove_file(artifact)
            .with_context(|| format!("Failed to remove {}", artifact.display()))?;
        debug!("Removed signature artifact {}", artifact.display());
    }

    Ok(artifacts)
}
