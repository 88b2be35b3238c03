//! The disposable directory that holds every intermediate file of one run.

use anyhow::Context;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Exclusively owned temporary directory. Released exactly once, either
/// explicitly through [`Workspace::release`] or on drop.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Creates a fresh, uniquely named, empty directory.
    pub fn acquire() -> anyhow::Result<Self> {
        Self::acquire_in(temp_dir_base())
    }

    pub fn acquire_in(base: impl AsRef<Path>) -> anyhow::Result<Self> {
        let base = base.as_ref();
        let dir = tempfile::Builder::new()
            .prefix("xapkpatch-")
            .tempdir_in(base)
            .with_context(|| format!("Failed to create workspace under {}", base.display()))?;
        let path = dir.path().to_path_buf();

        debug!("Acquired workspace {}", path.display());

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.path.join(rel)
    }

    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }

    /// Recursively deletes the directory. Calling it again is a no-op.
    pub fn release(&mut self) -> anyhow::Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };

        dir.close()
            .with_context(|| format!("Failed to remove workspace {}", self.path.display()))?;
        debug!("Released workspace {}", self.path.display());

        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("{:#}", err);
        }
    }
}

/// Returns a directory suitable for creating temporary directories.
/// Never relative, so a workspace never lands under the current directory
/// when `TMPDIR` is set to something like `./tmp`.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// Paths an interrupt must remove.
#[derive(Debug, Default)]
struct Armed {
    workspace: Option<PathBuf>,
    output: Option<PathBuf>,
}

/// Removes the live workspace, and any output archive being written, when
/// the process is interrupted.
///
/// Installed once per process; the pipeline arms it with the workspace path
/// after acquiring, arms the output right before packaging and disarms both
/// once the run is over.
#[derive(Debug, Clone, Default)]
pub struct InterruptCleanup {
    armed: Arc<Mutex<Armed>>,
}

impl InterruptCleanup {
    /// Registers the SIGINT/SIGTERM handler. Exits with status 130.
    pub fn install() -> anyhow::Result<Self> {
        let cleanup = Self::default();
        let handler = cleanup.clone();

        ctrlc::set_handler(move || {
            handler.clean_up();
            eprintln!("Error: interrupted");
            std::process::exit(130);
        })
        .context("Failed to install interrupt handler")?;

        Ok(cleanup)
    }

    pub fn arm(&self, path: &Path) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.workspace = Some(path.to_path_buf());
        }
    }

    /// Marks `output` as unfinished until [`disarm`](Self::disarm).
    pub fn arm_output(&self, output: &Path) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.output = Some(output.to_path_buf());
        }
    }

    pub fn disarm(&self) {
        if let Ok(mut armed) = self.armed.lock() {
            *armed = Armed::default();
        }
    }

    pub fn armed_path(&self) -> Option<PathBuf> {
        self.armed.lock().ok().and_then(|armed| armed.workspace.clone())
    }

    pub fn armed_output(&self) -> Option<PathBuf> {
        self.armed.lock().ok().and_then(|armed| armed.output.clone())
    }

    /// Removes whatever is armed, then disarms. What the handler runs.
    pub fn clean_up(&self) {
        let Ok(mut armed) = self.armed.lock() else {
            return;
        };
        let Armed { workspace, output } = std::mem::take(&mut *armed);

        if let Some(output) = output.filter(|o| o.exists()) {
            if let Err(err) = std::fs::remove_file(&output) {
                eprintln!("Failed to remove {}: {}", output.display(), err);
            }
        }
        if let Some(path) = workspace.filter(|p| p.exists()) {
            if let Err(err) = std::fs::remove_dir_all(&path) {
                eprintln!("Failed to remove workspace {}: {}", path.display(), err);
            }
        }
    }
}
