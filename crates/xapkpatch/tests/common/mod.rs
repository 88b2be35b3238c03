#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xapkpatch::apk::Toolchain;
use xapkpatch::error::{PipelineError, Result};
use xapkpatch::tool::{ToolCommand, ToolRunner};
use xapkpatch::tui::pause::ResumeSignal;
use xapkpatch::workspace::InterruptCleanup;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DECODED_MANIFEST: &str = concat!(
    r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>"#,
    r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">"#,
    r#"<application android:label="@string/app_name" android:extractNativeLibs="false">"#,
    r#"<activity android:name=".Main"/>"#,
    r#"</application></manifest>"#,
);

pub const DESCRIPTOR: &str = r#"{
    "xapk_version": 2,
    "package_name": "com.example.app",
    "version_name": "1.0.0",
    "split_apks": [
        {"file": "base.apk", "id": "base"},
        {"file": "config.en.apk", "id": "config.en"}
    ]
}"#;

/// Which fake tool an argv belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Decode,
    Build,
    Align,
    Sign,
    Install,
}

pub fn toolchain() -> Toolchain {
    Toolchain {
        java: "fake-java".into(),
        apktool_jar: "apktool.jar".into(),
        signer_jar: "signer.jar".into(),
        zipalign: "fake-zipalign".into(),
        adb: Some("fake-adb".into()),
    }
}

/// Stands in for apktool, zipalign, the signer and adb by doing just enough
/// filesystem work for the next stage to proceed.
#[derive(Debug, Default)]
pub struct FakeRunner {
    pub calls: Vec<ToolCommand>,
    pub fail_on: Option<Tool>,
    /// When set, decoding produces a tree without a manifest.
    pub decode_without_manifest: bool,
    /// Decoded manifest text, [`DECODED_MANIFEST`] when unset.
    pub decoded_manifest: Option<&'static str>,
    /// When set, installing deletes the workspace out from under the run.
    pub remove_workspace_on_install: bool,
    /// Snapshot of the interrupt handler's armed paths at every call.
    pub observe: Option<InterruptCleanup>,
    pub observed: Vec<(Option<PathBuf>, Option<PathBuf>)>,
}

impl FakeRunner {
    pub fn failing_on(tool: Tool) -> Self {
        Self {
            fail_on: Some(tool),
            ..Self::default()
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.calls.iter().map(classify).collect()
    }

    pub fn calls_to(&self, tool: Tool) -> Vec<&ToolCommand> {
        self.calls.iter().filter(|c| classify(c) == tool).collect()
    }
}

pub fn classify(cmd: &ToolCommand) -> Tool {
    let argv = cmd.argv_lossy();
    match argv[0].as_str() {
        "fake-zipalign" => Tool::Align,
        "fake-adb" => Tool::Install,
        _ if argv[2] == "signer.jar" => Tool::Sign,
        _ if argv[3] == "d" => Tool::Decode,
        _ => Tool::Build,
    }
}

impl ToolRunner for FakeRunner {
    fn run(&mut self, cmd: &ToolCommand) -> Result<()> {
        self.calls.push(cmd.clone());
        let tool = classify(cmd);

        if let Some(cleanup) = &self.observe {
            self.observed
                .push((cleanup.armed_path(), cleanup.armed_output()));
        }

        if self.fail_on == Some(tool) {
            return Err(PipelineError::ExternalToolFailure {
                command: cmd.to_string(),
                status: Some(1),
            });
        }

        let argv: Vec<PathBuf> = cmd.argv().into_iter().map(PathBuf::from).collect();
        match tool {
            // java -jar apktool.jar d <apk> -o <out> -f
            Tool::Decode => {
                let out = &argv[6];
                std::fs::create_dir_all(out.join("res/values")).unwrap();
                std::fs::write(out.join("res/values/strings.xml"), "<resources/>").unwrap();
                if !self.decode_without_manifest {
                    let manifest = self.decoded_manifest.unwrap_or(DECODED_MANIFEST);
                    std::fs::write(out.join("AndroidManifest.xml"), manifest).unwrap();
                }
            }
            // java -jar apktool.jar b <dir> -o <apk>
            Tool::Build => zip_dir(&argv[4], &argv[6]),
            // zipalign -p -f 4 <apk> <apk>.aligned
            Tool::Align => {
                std::fs::copy(&argv[4], &argv[5]).unwrap();
            }
            // java -jar signer.jar --apks <dir> ...
            Tool::Sign => {
                for entry in std::fs::read_dir(&argv[4]).unwrap() {
                    let path = entry.unwrap().path();
                    if path.extension().is_some_and(|e| e == "apk") {
                        let mut sig = path.into_os_string();
                        sig.push(".idsig");
                        std::fs::write(sig, "sig").unwrap();
                    }
                }
            }
            // adb install-multiple <apk>...
            Tool::Install => {
                if self.remove_workspace_on_install {
                    std::fs::remove_dir_all(argv[2].parent().unwrap()).unwrap();
                }
            }
        }

        Ok(())
    }
}

/// Counts how often the run paused, optionally editing the manifest or
/// refusing to resume.
#[derive(Debug, Default)]
pub struct RecordingResume {
    pub waits: usize,
    pub workspaces: Vec<PathBuf>,
    pub refuse: bool,
    pub append_to_manifest: Option<&'static str>,
}

impl ResumeSignal for RecordingResume {
    fn wait(&mut self, workspace: &Path) -> Result<()> {
        self.waits += 1;
        self.workspaces.push(workspace.to_path_buf());

        if self.refuse {
            return Err(PipelineError::Interrupted);
        }

        if let Some(extra) = self.append_to_manifest {
            let manifest = workspace.join("base").join("AndroidManifest.xml");
            let mut text = std::fs::read_to_string(&manifest).unwrap();
            text.push_str(extra);
            std::fs::write(&manifest, text).unwrap();
        }

        Ok(())
    }
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn zip_dir(dir: &Path, output: &Path) {
    let mut zip = ZipWriter::new(File::create(output).unwrap());
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(dir)
            .unwrap()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(
            name,
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        )
        .unwrap();
        zip.write_all(&std::fs::read(entry.path()).unwrap()).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a typical bundle: descriptor, base, one config split and an OBB.
pub fn write_bundle(path: &Path) {
    let mut base = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut base));
        zip.start_file("AndroidManifest.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"binary manifest").unwrap();
        zip.finish().unwrap();
    }

    write_zip(
        path,
        &[
            ("manifest.json", DESCRIPTOR.as_bytes()),
            ("base.apk", base.as_slice()),
            ("config.en.apk", b"split".as_slice()),
            ("icon.png", b"png".as_slice()),
            ("Android/obb/com.example.app/main.1.com.example.app.obb", b"obb".as_slice()),
        ],
    );
}

pub fn entry_names(archive: &Path) -> Vec<String> {
    let zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}

pub fn read_entry(archive: &Path, name: &str) -> Vec<u8> {
    let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    data
}

/// Whether `dir` has no entries left.
pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
