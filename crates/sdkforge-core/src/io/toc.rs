//! Table of contents (`toc.json`) of an artifact set.

use serde::{Deserialize, Serialize};

use crate::model::{ModuleSplit, SdkBundle, SplitType, Targeting, ToolInfo};

pub const TOC_FILE: &str = "toc.json";

/// Description of everything a build produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSdkApksResult {
    pub variants: Vec<Variant>,
    pub package_name: String,
    pub bundletool: ToolInfo,
    pub version: SdkVersionInformation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub variant_number: u32,
    pub targeting: Targeting,
    pub apk_set: Vec<ApkSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApkSet {
    pub module_name: String,
    pub apk_description: Vec<ApkDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApkDescription {
    /// Path of the artifact inside the set.
    pub path: String,
    pub split_type: SplitType,
    pub targeting: Targeting,
}

/// The four version fields, each stored on its own so none has to be
/// recovered from the composite manifest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkVersionInformation {
    pub version_code: i32,
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
}

impl SdkVersionInformation {
    pub fn of(bundle: &SdkBundle) -> Self {
        Self {
            version_code: bundle.version_code(),
            major: bundle.major_version(),
            minor: bundle.minor_version(),
            patch: bundle.patch_version(),
        }
    }
}

impl BuildSdkApksResult {
    /// One variant holding every `(path, split)` pair.
    pub fn new<'a>(
        bundle: &SdkBundle,
        apks: impl IntoIterator<Item = (&'a str, &'a ModuleSplit)>,
    ) -> Self {
        let apk_set = apks
            .into_iter()
            .map(|(path, split)| ApkSet {
                module_name: split.module_name.clone(),
                apk_description: vec![ApkDescription {
                    path: path.to_string(),
                    split_type: split.split_type,
                    targeting: split.apk_targeting.clone(),
                }],
            })
            .collect();

        Self {
            variants: vec![Variant {
                variant_number: 0,
                targeting: Targeting::default(),
                apk_set,
            }],
            package_name: bundle.package_name().to_string(),
            bundletool: bundle.modules_config().bundletool.clone(),
            version: SdkVersionInformation::of(bundle),
        }
    }

    /// All artifact descriptions across variants.
    pub fn apk_descriptions(&self) -> impl Iterator<Item = &ApkDescription> {
        self.variants
            .iter()
            .flat_map(|v| &v.apk_set)
            .flat_map(|set| &set.apk_description)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AndroidManifest, BundleMetadata, BundleModule, SdkModulesConfig};

    #[test]
    fn records_version_fields_separately() {
        let bundle = SdkBundle::new(
            BundleModule::new("base", AndroidManifest::new("com.ads.foo")),
            SdkModulesConfig::new("1.9.1", "com.ads.foo", 15, 0, 5),
            BundleMetadata::new(),
            1253,
        )
        .unwrap();
        let split = ModuleSplit {
            module_name: "base".into(),
            split_type: SplitType::Standalone,
            is_master_split: true,
            apk_targeting: Targeting::default(),
            variant_targeting: Targeting::default(),
            manifest: AndroidManifest::new("com.ads.foo"),
            entries: vec![],
        };

        let toc = BuildSdkApksResult::new(&bundle, [("standalones/standalone.apk", &split)]);
        assert_eq!(toc.package_name, "com.ads.foo");
        assert_eq!(toc.bundletool.version, "1.9.1");
        assert_eq!(
            toc.version,
            SdkVersionInformation {
                version_code: 1253,
                major: 15,
                minor: 0,
                patch: 5
            }
        );
        let paths: Vec<_> = toc.apk_descriptions().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["standalones/standalone.apk"]);

        let json = toc.to_json().unwrap();
        assert_eq!(BuildSdkApksResult::from_json(&json).unwrap(), toc);
    }
}
