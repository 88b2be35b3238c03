use super::Toolchain;
use crate::tool::ToolCommand;
use std::path::{Path, PathBuf};

/// Name of the decoded manifest at the root of an apktool tree.
pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

/// `java -jar apktool.jar d <apk> -o <out_dir> -f`
pub fn decode(toolchain: &Toolchain, apk: &Path, out_dir: &Path) -> ToolCommand {
    toolchain
        .java_jar(&toolchain.apktool_jar)
        .arg("d")
        .arg(apk)
        .arg("-o")
        .arg(out_dir)
        .arg("-f")
}

/// `java -jar apktool.jar b <decoded_dir> -o <apk>`
pub fn build(toolchain: &Toolchain, decoded_dir: &Path, apk: &Path) -> ToolCommand {
    toolchain
        .java_jar(&toolchain.apktool_jar)
        .arg("b")
        .arg(decoded_dir)
        .arg("-o")
        .arg(apk)
}

pub fn manifest_path(decoded_dir: &Path) -> PathBuf {
    decoded_dir.join(MANIFEST_FILE)
}

/// `res/xml` inside a decoded tree, where XML resources such as the network
/// security config live.
pub fn res_xml_dir(decoded_dir: &Path) -> PathBuf {
    decoded_dir.join("res").join("xml")
}
