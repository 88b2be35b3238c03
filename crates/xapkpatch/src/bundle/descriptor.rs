use crate::error::DescriptorError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// The descriptor every XAPK carries at its root.
pub const DESCRIPTOR_FILE: &str = "manifest.json";

/// Split id of the primary installable package.
pub const BASE_SPLIT_ID: &str = "base";

/// Only `split_apks[].id` and `split_apks[].file` matter. Every other field
/// is informational, and a value of an unexpected type reads as absent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BundleDescriptor {
    #[serde(default, deserialize_with = "string_or_none")]
    pub package_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub version_name: Option<String>,
    #[serde(default)]
    pub split_apks: Vec<SplitApk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub struct SplitApk {
    pub id: Option<String>,
    pub file: Option<String>,
}

impl From<Value> for SplitApk {
    fn from(value: Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            id: field("id"),
            file: field("file"),
        }
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

impl BundleDescriptor {
    pub fn read(root: &Path) -> Result<Self, DescriptorError> {
        let path = root.join(DESCRIPTOR_FILE);
        if !path.is_file() {
            return Err(DescriptorError::Missing);
        }

        let text = std::fs::read_to_string(&path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        Ok(serde_json::from_str(text)?)
    }

    /// File name of the first split whose id is `"base"`.
    pub fn base_file(&self) -> Result<&str, DescriptorError> {
        self.split_apks
            .iter()
            .find(|split| split.id.as_deref() == Some(BASE_SPLIT_ID))
            .and_then(|split| split.file.as_deref())
            .filter(|file| !file.is_empty())
            .ok_or(DescriptorError::NoBaseEntry)
    }

    /// Resolves the base split inside `root`, refusing paths that would
    /// leave it and files that were never extracted.
    pub fn base_path(&self, root: &Path) -> Result<PathBuf, DescriptorError> {
        let file = self.base_file()?;
        let rel = Path::new(file);

        if !rel
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(DescriptorError::UnsafePath(file.to_string()));
        }

        let path = root.join(rel);
        if path.is_file() {
            Ok(path)
        } else {
            Err(DescriptorError::BaseFileMissing(path))
        }
    }
}
