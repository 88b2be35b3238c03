use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PATCHED_SUFFIX: &str = "_patched";

/// `dir/app.xapk` becomes `dir/app_patched.xapk`.
pub fn patched_output_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().map(OsString::from).unwrap_or_default();
    name.push(PATCHED_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    input.with_file_name(name)
}

/// Compresses every file under `root` into a fresh archive at `output`.
///
/// Entries are sorted and named relative to `root` with `/` separators. If
/// anything fails the partially written archive is removed.
pub fn write_archive(root: &Path, output: &Path) -> Result<usize> {
    let result = write_entries(root, output);

    if result.is_err() && output.exists() {
        if let Err(err) = std::fs::remove_file(output) {
            warn!("Failed to remove partial archive {}: {}", output.display(), err);
        }
    }

    result
}

fn write_entries(root: &Path, output: &Path) -> Result<usize> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let mut count = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry_name(root, entry.path())?;
        let size = entry.metadata()?.len();
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(size >= u64::from(u32::MAX));

        zip.start_file(name.as_str(), options)
            .with_context(|| format!("Failed to add {name}"))?;
        let mut source = File::open(entry.path())
            .with_context(|| format!("Failed to open {}", entry.path().display()))?;
        std::io::copy(&mut source, &mut zip).with_context(|| format!("Failed to compress {name}"))?;

        debug!("Packed {}", name);
        count += 1;
    }

    zip.finish()
        .with_context(|| format!("Failed to finish {}", output.display()))?;

    Ok(count)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;

    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
