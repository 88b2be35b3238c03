//! Declarative, independently toggleable manifest patches.

use crate::apk::apktool;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;
use xapkpatch_derive::EnumLabel;

pub mod manifest;

pub use manifest::Edit;

/// File name of the network security config resource under `res/xml`.
pub const NETWORK_SECURITY_CONFIG_FILE: &str = "network_security_config.xml";

const BUILTIN_NETWORK_SECURITY_CONFIG: &str =
    include_str!("../../assets/network_security_config.xml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumLabel)]
pub enum PatchKind {
    #[label = "network security config"]
    NetworkSecurityConfig,
    #[label = "extractNativeLibs"]
    ExtractNativeLibs,
}

impl PatchKind {
    /// Pure `content -> content` transform for this patch.
    pub fn apply(self, content: &str) -> (String, Edit) {
        match self {
            Self::NetworkSecurityConfig => manifest::network_security_config(content),
            Self::ExtractNativeLibs => manifest::extract_native_libs(content),
        }
    }
}

/// A patch that changed the manifest text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedPatch {
    pub kind: PatchKind,
    pub edit: Edit,
}

impl AppliedPatch {
    pub fn description(&self) -> &'static str {
        match (self.kind, self.edit) {
            (PatchKind::NetworkSecurityConfig, _) => "Added Network Security Config to manifest",
            (PatchKind::ExtractNativeLibs, Edit::Rewritten) => "Patched extractNativeLibs to true",
            (PatchKind::ExtractNativeLibs, _) => "Added extractNativeLibs to manifest",
        }
    }
}

/// Ordered, duplicate-free selection of patches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    patches: Vec<PatchKind>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known patch, in declaration order.
    pub fn all() -> Self {
        PatchKind::VARIANTS
            .iter()
            .fold(Self::new(), |set, &kind| set.with(kind))
    }

    pub fn from_flags(network_fix: bool, extract_native_libs: bool) -> Self {
        let mut set = Self::new();
        if network_fix {
            set = set.with(PatchKind::NetworkSecurityConfig);
        }
        if extract_native_libs {
            set = set.with(PatchKind::ExtractNativeLibs);
        }
        set
    }

    pub fn with(mut self, kind: PatchKind) -> Self {
        if !self.patches.contains(&kind) {
            self.patches.push(kind);
        }
        self
    }

    pub fn contains(&self, kind: PatchKind) -> bool {
        self.patches.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PatchKind> + '_ {
        self.patches.iter().copied()
    }
}

/// Applies every enabled patch left to right, each against the output of
/// the previous one. Patches that found nothing to do are not reported.
pub fn apply_patches(content: &str, patches: &PatchSet) -> (String, Vec<AppliedPatch>) {
    let mut current = content.to_string();
    let mut applied = Vec::new();

    for kind in patches.iter() {
        let (patched, edit) = kind.apply(&current);

        if edit == Edit::Unchanged {
            debug!("Patch {} already satisfied", kind);
        } else {
            applied.push(AppliedPatch { kind, edit });
        }

        current = patched;
    }

    (current, applied)
}

/// Where the network security config resource comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NetworkConfigSource {
    #[default]
    Builtin,
    File(PathBuf),
}

impl NetworkConfigSource {
    /// Writes the resource into `res/xml` of a decoded tree, creating the
    /// directory if needed.
    pub fn install(&self, decoded_dir: &Path) -> anyhow::Result<PathBuf> {
        let res_xml = apktool::res_xml_dir(decoded_dir);
        std::fs::create_dir_all(&res_xml)
            .with_context(|| format!("Failed to create {}", res_xml.display()))?;

        let target = res_xml.join(NETWORK_SECURITY_CONFIG_FILE);
        match self {
            Self::Builtin => std::fs::write(&target, BUILTIN_NETWORK_SECURITY_CONFIG)
                .with_context(|| format!("Failed to write {}", target.display()))?,
            Self::File(source) => {
                std::fs::copy(source, &target).with_context(|| {
                    format!(
                        "Failed to copy {} to {}",
                        source.display(),
                        target.display()
                    )
                })?;
            }
        }

        Ok(target)
    }
}
