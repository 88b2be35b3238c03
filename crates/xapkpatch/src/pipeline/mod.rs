//! The staged repackaging run.
//!
//! `Init → Extracted → BaseLocated → Decompiled → Patched →
//! [PausedForManualEdit] → Recompiled → Aligned → Signed → Repackaged →
//! [Installed] → Done`, or `Failed` from anywhere. The workspace is released
//! on every exit path before [`Pipeline::run`] returns.

use crate::apk::zipalign::ZipAlign;
use crate::apk::{self, Toolchain, adb, apktool, signer};
use crate::bundle;
use crate::error::{PipelineError, Result};
use crate::patch::{self, AppliedPatch, NetworkConfigSource, PatchKind, PatchSet};
use crate::tool::ToolRunner;
use crate::tui::pause::ResumeSignal;
use crate::tui::progress::create_spinner;
use crate::workspace::{InterruptCleanup, Workspace};
use anyhow::{Context, anyhow};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xapkpatch_derive::EnumLabel;

/// Directory name the base package is decoded into, inside the workspace.
pub const DECODED_DIR: &str = "base";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumLabel)]
pub enum Stage {
    Init,
    Extracted,
    BaseLocated,
    Decompiled,
    Patched,
    PausedForManualEdit,
    Recompiled,
    Aligned,
    Signed,
    Repackaged,
    Installed,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub patches: PatchSet,
    pub network_config: NetworkConfigSource,
    pub pause: bool,
    pub install: bool,
    pub allow_resign: bool,
    /// Parent directory for the workspace; the system temp dir when unset.
    pub workspace_base: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            patches: PatchSet::new(),
            network_config: NetworkConfigSource::Builtin,
            pause: false,
            install: false,
            allow_resign: true,
            workspace_base: None,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: PathBuf,
    pub applied: Vec<AppliedPatch>,
    pub installed: bool,
}

pub struct Pipeline<R, P> {
    toolchain: Toolchain,
    options: PipelineOptions,
    runner: R,
    resume: P,
    interrupt: Option<InterruptCleanup>,
    history: Vec<Stage>,
}

impl<R: ToolRunner, P: ResumeSignal> Pipeline<R, P> {
    pub fn new(toolchain: Toolchain, options: PipelineOptions, runner: R, resume: P) -> Self {
        Self {
            toolchain,
            options,
            runner,
            resume,
            interrupt: None,
            history: vec![Stage::Init],
        }
    }

    pub fn with_interrupt_cleanup(mut self, cleanup: InterruptCleanup) -> Self {
        self.interrupt = Some(cleanup);
        self
    }

    pub fn stage(&self) -> Stage {
        self.history.last().copied().unwrap_or(Stage::Init)
    }

    /// Every stage entered so far, in order.
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    /// Runs the whole pipeline over `bundle`.
    pub fn run(&mut self, bundle: &Path) -> Result<Outcome> {
        self.history = vec![Stage::Init];

        if !bundle.is_file() {
            self.enter(Stage::Failed);
            return Err(anyhow!("Input bundle {} does not exist", bundle.display()).into());
        }

        let acquired = match self.options.workspace_base.clone() {
            Some(base) => Workspace::acquire_in(base),
            None => Workspace::acquire(),
        };
        let mut workspace = match acquired {
            Ok(workspace) => workspace,
            Err(err) => {
                self.enter(Stage::Failed);
                return Err(err.into());
            }
        };

        if let Some(interrupt) = &self.interrupt {
            interrupt.arm(workspace.path());
        }

        let result = self.run_stages(bundle, &workspace);
        let released = workspace.release();

        if let Some(interrupt) = &self.interrupt {
            interrupt.disarm();
        }

        match (result, released) {
            (Ok(outcome), Ok(())) => {
                self.enter(Stage::Done);
                Ok(outcome)
            }
            (Ok(outcome), Err(err)) => {
                discard_output(&outcome.output);
                self.enter(Stage::Failed);
                Err(err.into())
            }
            (Err(err), released) => {
                if let Err(release_err) = released {
                    warn!("{:#}", release_err);
                }
                debug!("Run failed after stage {}", self.stage());
                self.enter(Stage::Failed);
                Err(err)
            }
        }
    }

    fn run_stages(&mut self, bundle: &Path, workspace: &Workspace) -> Result<Outcome> {
        let root = workspace.path();

        self.step(1, format!("Extracting {}", bundle.display()), |_| {
            bundle::extract_archive(bundle, root)
        })?;
        self.enter(Stage::Extracted);

        let base_apk = self.step(2, "Identifying Base APK using manifest", |_| {
            let (descriptor, base) = bundle::locate_base(root)?;
            if let Some(package) = &descriptor.package_name {
                debug!(
                    "Bundle {} {}",
                    package,
                    descriptor.version_name.as_deref().unwrap_or_default()
                );
            }
            Ok(base)
        })?;
        info!(" Found base apk: {}", display_name(&base_apk));
        self.enter(Stage::BaseLocated);

        let decoded_dir = unused_dir(root, DECODED_DIR);
        self.step(3, "Decompiling Base APK", |this| {
            let cmd = apktool::decode(&this.toolchain, &base_apk, &decoded_dir);
            this.runner.run(&cmd)
        })?;
        self.enter(Stage::Decompiled);

        let applied = self.step(4, "Patching manifest", |this| this.patch(&decoded_dir))?;
        for patch in &applied {
            info!(" Patch: {}", patch.description());
        }
        self.enter(Stage::Patched);

        if self.options.pause {
            self.enter(Stage::PausedForManualEdit);
            self.resume.wait(root)?;
        }

        self.step(5, "Recompiling Base APK", |this| {
            if !decoded_dir.is_dir() {
                return Err(anyhow!("Decoded tree {} disappeared", decoded_dir.display()).into());
            }

            let cmd = apktool::build(&this.toolchain, &decoded_dir, &base_apk);
            this.runner.run(&cmd)?;

            if !base_apk.is_file() {
                return Err(anyhow!("apktool did not produce {}", base_apk.display()).into());
            }

            std::fs::remove_dir_all(&decoded_dir)
                .with_context(|| format!("Failed to remove {}", decoded_dir.display()))?;
            Ok(())
        })?;
        self.enter(Stage::Recompiled);

        self.step(6, "Aligning", |this| this.align_all(root))?;
        self.enter(Stage::Aligned);

        self.step(7, "Signing", |this| {
            let cmd = signer::sign(&this.toolchain, root, this.options.allow_resign);
            this.runner.run(&cmd)?;
            signer::remove_signature_artifacts(root)?;
            Ok(())
        })?;
        self.enter(Stage::Signed);

        let output = bundle::patched_output_path(bundle);
        if let Some(interrupt) = &self.interrupt {
            interrupt.arm_output(&output);
        }
        self.step(8, format!("Packaging into {}", output.display()), |_| {
            let count = bundle::write_archive(root, &output)?;
            debug!("Packed {} entries", count);
            Ok(())
        })?;
        self.enter(Stage::Repackaged);
        info!("Success! Output file at: {}", output.display());

        let installed = if self.options.install {
            match self.install(root) {
                Ok(installed) => installed,
                Err(err) => {
                    discard_output(&output);
                    return Err(err);
                }
            }
        } else {
            false
        };

        Ok(Outcome {
            output,
            applied,
            installed,
        })
    }

    fn patch(&mut self, decoded_dir: &Path) -> Result<Vec<AppliedPatch>> {
        let manifest_path = apktool::manifest_path(decoded_dir);
        if !manifest_path.is_file() {
            return Err(anyhow!(
                "Decoded tree has no {}",
                apktool::MANIFEST_FILE
            )
            .into());
        }

        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;

        let (patched, applied) = patch::apply_patches(&content, &self.options.patches);

        if self.options.patches.contains(PatchKind::NetworkSecurityConfig) {
            let resource = self.options.network_config.install(decoded_dir)?;
            debug!("Installed {}", resource.display());
        }

        std::fs::write(&manifest_path, patched)
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        Ok(applied)
    }

    fn align_all(&mut self, root: &Path) -> Result<()> {
        for apk_path in apk::package_files(root)? {
            let align = ZipAlign::new(&apk_path);
            self.runner.run(&align.command(&self.toolchain))?;
            align.replace_original()?;

            match align.verify() {
                Ok(true) => {}
                Ok(false) => warn!("{} is not aligned after zipalign", display_name(&apk_path)),
                Err(err) => debug!("Could not verify alignment: {:#}", err),
            }
        }

        Ok(())
    }

    fn install(&mut self, root: &Path) -> Result<bool> {
        let apks = apk::package_files(root)?;
        if apks.is_empty() {
            info!(" No APKs to install");
            return Ok(false);
        }

        let adb_path = self
            .toolchain
            .adb
            .clone()
            .ok_or_else(|| PipelineError::prerequisite("adb", "adb was not resolved"))?;

        self.step(9, "Installing patched APKs", |this| {
            this.runner.run(&adb::install_multiple(&adb_path, &apks))
        })?;
        self.enter(Stage::Installed);
        info!(" Installation complete.");

        Ok(true)
    }

    fn step<T>(
        &mut self,
        number: usize,
        title: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let title = title.into();
        info!("--- {}. {} ---", number, title);

        let pb = create_spinner(title.clone());
        let result = f(self);

        match &result {
            Ok(_) => pb.finish_and_clear(),
            Err(_) => pb.abandon_with_message(format!("{title} failed")),
        }

        result
    }

    fn enter(&mut self, stage: Stage) {
        let current = self.stage();
        debug_assert!(
            stage == Stage::Failed || stage > current,
            "stage {stage} cannot follow {current}"
        );

        debug!("Stage: {} -> {}", current, stage);
        self.history.push(stage);
    }
}

/// A failed run never leaves an archive behind.
fn discard_output(output: &Path) {
    if let Err(err) = std::fs::remove_file(output) {
        warn!("Failed to remove {}: {}", output.display(), err);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `root/name`, or `root/name_1`, `root/name_2`... if the bundle already
/// contains something by that name.
fn unused_dir(root: &Path, name: &str) -> PathBuf {
    let candidate = root.join(name);
    if !candidate.exists() {
        return candidate;
    }

    (1..)
        .map(|n| root.join(format!("{name}_{n}")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stages_are_strictly_ordered() {
        let order = Stage::VARIANTS;

        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(order.first(), Some(&Stage::Init));
        assert_eq!(order.last(), Some(&Stage::Failed));
    }

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::BaseLocated.to_string(), "Base Located");
        assert_eq!(Stage::PausedForManualEdit.label(), "Paused For Manual Edit");
    }

    #[test]
    fn unused_dir_avoids_existing_entries() {
        let dir = TempDir::new().unwrap();
        assert_eq!(unused_dir(dir.path(), "base"), dir.path().join("base"));

        std::fs::write(dir.path().join("base"), "").unwrap();
        std::fs::create_dir(dir.path().join("base_1")).unwrap();
        assert_eq!(unused_dir(dir.path(), "base"), dir.path().join("base_2"));
    }
}
