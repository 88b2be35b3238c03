use super::Toolchain;
use crate::tool::ToolCommand;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;
use zip::{CompressionMethod, ZipArchive};

/// Byte boundary stored entries are aligned to.
pub const DEFAULT_ALIGNMENT: u64 = 4;

const ALIGNED_SUFFIX: &str = ".aligned";

#[derive(Debug, Clone)]
pub struct ZipAlign {
    apk_path: PathBuf,
    alignment: u64,
}

impl ZipAlign {
    pub fn new(apk_path: impl Into<PathBuf>) -> Self {
        Self {
            apk_path: apk_path.into(),
            alignment: DEFAULT_ALIGNMENT,
        }
    }

    /// The `.aligned` sibling zipalign writes to.
    pub fn aligned_path(&self) -> PathBuf {
        let mut name = self.apk_path.as_os_str().to_os_string();
        name.push(ALIGNED_SUFFIX);
        PathBuf::from(name)
    }

    /// `zipalign -p -f <alignment> <apk> <apk>.aligned`
    pub fn command(&self, toolchain: &Toolchain) -> ToolCommand {
        ToolCommand::new(&toolchain.zipalign)
            .args(["-p", "-f"])
            .arg(self.alignment.to_string())
            .arg(&self.apk_path)
            .arg(self.aligned_path())
    }

    /// Moves the aligned copy over the original in a single rename.
    pub fn replace_original(&self) -> Result<()> {
        let aligned = self.aligned_path();
        std::fs::rename(&aligned, &self.apk_path).with_context(|| {
            format!(
                "Failed to replace {} with {}",
                self.apk_path.display(),
                aligned.display()
            )
        })
    }

    /// Checks that every stored entry starts on the alignment boundary.
    pub fn verify(&self) -> Result<bool> {
        let file = File::open(&self.apk_path)
            .with_context(|| format!("Failed to open {}", self.apk_path.display()))?;
        let mut zip = ZipArchive::new(file)
            .with_context(|| format!("{} is not a zip archive", self.apk_path.display()))?;
        let mut found_bad = false;

        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            let data_start = entry.data_start();

            if entry.compression() == CompressionMethod::Stored
                && data_start % self.alignment != 0
            {
                debug!(
                    "{:8} {} (BAD - mod {} = {})",
                    data_start,
                    entry.name(),
                    self.alignment,
                    data_start % self.alignment
                );
                found_bad = true;
            }
        }

        Ok(!found_bad)
    }
}
