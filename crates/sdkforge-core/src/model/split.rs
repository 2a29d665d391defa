//! Module splits: the unit the mutation pipeline edits and the serializer
//! turns into an installable artifact.

use serde::{Deserialize, Serialize};

use super::manifest::AndroidManifest;
use super::module::ModuleEntry;

/// Kind of artifact a split becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    /// Per-module split of a split-APK install.
    Split,
    /// Self-contained artifact holding the whole module.
    Standalone,
}

/// Device targeting of a split or variant. Empty means "any device".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Targeting {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub abis: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screen_densities: Vec<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub texture_compression_formats: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_sdk_version: Option<i32>,
}

impl Targeting {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A generated split of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSplit {
    pub module_name: String,
    pub split_type: SplitType,
    pub is_master_split: bool,
    pub apk_targeting: Targeting,
    pub variant_targeting: Targeting,
    pub manifest: AndroidManifest,
    pub entries: Vec<ModuleEntry>,
}

impl ModuleSplit {
    /// Mark this split as the one standalone variant: no device targeting,
    /// split type [`SplitType::Standalone`]. The manifest is left alone.
    pub fn set_standalone_variant(&mut self) {
        self.variant_targeting = Targeting::default();
        self.apk_targeting = Targeting::default();
        self.split_type = SplitType::Standalone;
    }
}
