//! Reading an XAPK into the workspace and writing the patched one back out.

use crate::error::{PipelineError, Result};
use anyhow::Context;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod archive;
pub mod descriptor;

pub use archive::{patched_output_path, write_archive};
pub use descriptor::{BundleDescriptor, DESCRIPTOR_FILE};

/// Unpacks every entry of `bundle` into `root`, keeping relative paths.
pub fn extract_archive(bundle: &Path, root: &Path) -> Result<()> {
    let file = File::open(bundle)
        .with_context(|| format!("Failed to open bundle {}", bundle.display()))?;

    zip_extract::extract(BufReader::new(file), root, false)
        .with_context(|| format!("Failed to extract {}", bundle.display()))?;

    Ok(())
}

/// Resolves the base package from the descriptor at `root`.
///
/// Any descriptor problem (missing, unreadable, malformed, no base entry,
/// base file absent) is deliberately reported as
/// [`PipelineError::BaseApkNotFound`]; the precise reason is only logged.
pub fn locate_base(root: &Path) -> Result<(BundleDescriptor, PathBuf)> {
    BundleDescriptor::read(root)
        .and_then(|descriptor| {
            let base = descriptor.base_path(root)?;
            Ok((descriptor, base))
        })
        .map_err(|reason| {
            debug!("Bundle descriptor rejected: {}", reason);
            PipelineError::BaseApkNotFound
        })
}

/// `extract(bundlePath, workspace) -> baseApkPath`.
pub fn extract(bundle: &Path, root: &Path) -> Result<PathBuf> {
    extract_archive(bundle, root)?;
    locate_base(root).map(|(_, base)| base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_bundle(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_and_finds_base() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("app.xapk");
        let root = dir.path().join("ws");
        std::fs::create_dir(&root).unwrap();

        write_bundle(
            &bundle,
            &[
                (
                    "manifest.json",
                    br#"{"split_apks": [{"id": "base", "file": "base.apk"}]}"#.as_slice(),
                ),
                ("base.apk", b"PK".as_slice()),
                ("Android/obb/com.example/main.obb", b"obb".as_slice()),
            ],
        );

        let base = extract(&bundle, &root).unwrap();

        assert_eq!(base, root.join("base.apk"));
        assert!(root.join("Android/obb/com.example/main.obb").is_file());
    }

    #[test]
    fn every_descriptor_problem_is_base_not_found() {
        let dir = TempDir::new().unwrap();

        // Missing descriptor.
        assert!(matches!(locate_base(dir.path()), Err(PipelineError::BaseApkNotFound)));

        // Malformed descriptor.
        std::fs::write(dir.path().join(DESCRIPTOR_FILE), "{{{").unwrap();
        assert!(matches!(locate_base(dir.path()), Err(PipelineError::BaseApkNotFound)));

        // No base entry.
        std::fs::write(
            dir.path().join(DESCRIPTOR_FILE),
            r#"{"split_apks": [{"id": "config.en", "file": "config.en.apk"}]}"#,
        )
        .unwrap();
        assert!(matches!(locate_base(dir.path()), Err(PipelineError::BaseApkNotFound)));

        // Base listed but not extracted.
        std::fs::write(
            dir.path().join(DESCRIPTOR_FILE),
            r#"{"split_apks": [{"id": "base", "file": "base.apk"}]}"#,
        )
        .unwrap();
        assert!(matches!(locate_base(dir.path()), Err(PipelineError::BaseApkNotFound)));
    }

    #[test]
    fn lenient_descriptor_still_finds_base() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("base.apk"), "PK").unwrap();

        for descriptor in [
            r#"{"version_name": 1042, "split_apks": [{"id": "base", "file": "base.apk"}]}"#,
            r#"{"split_apks": [{"id": 7, "file": "x.apk"}, {"id": "base", "file": "base.apk"}]}"#,
        ] {
            std::fs::write(dir.path().join(DESCRIPTOR_FILE), descriptor).unwrap();

            let (_, base) = locate_base(dir.path()).unwrap();
            assert_eq!(base, dir.path().join("base.apk"), "{descriptor}");
        }
    }

    #[test]
    fn non_zip_input_is_an_internal_error() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("app.xapk");
        std::fs::write(&bundle, "definitely not a zip").unwrap();

        assert!(matches!(
            extract_archive(&bundle, dir.path()),
            Err(PipelineError::UnexpectedInternal(_))
        ));
    }
}
