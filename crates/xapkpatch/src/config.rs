//! Optional `xapkpatch.toml` configuration.
//!
//! Every key has a default, so an absent file behaves like an empty one.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read from the current directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "xapkpatch.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub tools: ToolsConfig,
    pub patches: PatchesConfig,
    pub signing: SigningConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Java runtime. When unset, `JAVA_HOME` and then `PATH` are searched.
    pub java: Option<PathBuf>,
    pub apktool_jar: PathBuf,
    pub signer_jar: PathBuf,
    pub zipalign: PathBuf,
    pub adb: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            java: None,
            apktool_jar: PathBuf::from("./dependencies/apktool.jar"),
            signer_jar: PathBuf::from("./dependencies/uber-apk-signer.jar"),
            zipalign: PathBuf::from("zipalign"),
            adb: PathBuf::from("adb"),
        }
    }
}

/// Patches switched on here are applied on every run, CLI flags or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchesConfig {
    pub network_fix: bool,
    pub extract_native_libs: bool,
    /// Replacement for the built-in network security config resource.
    pub network_security_config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigningConfig {
    pub allow_resign: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self { allow_resign: true }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        Self::from_toml_str(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Loads `explicit` (which must exist), else [`DEFAULT_CONFIG_FILE`] if
    /// present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            debug!("Using {}", default.display());
            return Self::from_file(default);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.signing.allow_resign);
        assert!(!config.patches.network_fix);
        assert_eq!(config.tools.zipalign, PathBuf::from("zipalign"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [tools]
            java = "/opt/jdk/bin/java"
            zipalign = "./sdk/build-tools/36.1.0-rc1/zipalign"

            [patches]
            network_fix = true

            [signing]
            allow_resign = false
            "#,
        )
        .unwrap();

        assert_eq!(config.tools.java, Some(PathBuf::from("/opt/jdk/bin/java")));
        assert_eq!(config.tools.adb, PathBuf::from("adb"));
        assert!(config.patches.network_fix);
        assert!(!config.patches.extract_native_libs);
        assert!(!config.signing.allow_resign);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml_str("[tools]\napktool = \"x\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();

        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[patches]\nextract_native_libs = true\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.patches.extract_native_libs);
    }
}
