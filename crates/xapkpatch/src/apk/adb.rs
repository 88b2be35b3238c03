use crate::tool::ToolCommand;
use std::path::{Path, PathBuf};

/// `adb install-multiple <apk>...`, installing every split as one package.
pub fn install_multiple(adb: &Path, apks: &[PathBuf]) -> ToolCommand {
    ToolCommand::new(adb).arg("install-multiple").args(apks)
}
