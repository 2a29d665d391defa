//! SDK bundle descriptor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::module::BundleModule;
use crate::validation::{self, ValidationError};
use crate::version::{
    decode_sdk_major_and_minor_version, encode_sdk_major_and_minor_version, ToolVersion,
};

/// Producing tool recorded in the modules config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolInfo {
    pub version: String,
}

/// SDK version triple as declared by the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkVersion {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
}

impl SdkVersion {
    /// Recover major and minor from a manifest `versionMajor` value. The
    /// composite does not carry the patch, which comes from the
    /// patch-version property instead.
    pub fn from_composite(composite: i32, patch: i32) -> Option<Self> {
        let (major, minor) = decode_sdk_major_and_minor_version(composite)?;
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

/// Contents of `SdkModulesConfig.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkModulesConfig {
    pub bundletool: ToolInfo,
    pub sdk_package_name: String,
    pub sdk_version: SdkVersion,
}

impl SdkModulesConfig {
    pub fn new(tool_version: &str, sdk_package_name: &str, major: i32, minor: i32, patch: i32) -> Self {
        Self {
            bundletool: ToolInfo {
                version: tool_version.to_string(),
            },
            sdk_package_name: sdk_package_name.to_string(),
            sdk_version: SdkVersion {
                major,
                minor,
                patch,
            },
        }
    }
}

/// Opaque `BUNDLE-METADATA/` files, keyed by `<namespace>/<name>`.
pub type BundleMetadata = BTreeMap<String, Vec<u8>>;

/// A validated SDK bundle, ready to be built.
///
/// Constructed only through [`SdkBundle::new`], which validates the modules
/// config; the version fields cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkBundle {
    module: BundleModule,
    modules_config: SdkModulesConfig,
    tool_version: ToolVersion,
    bundle_metadata: BundleMetadata,
    version_code: i32,
}

impl SdkBundle {
    pub fn new(
        module: BundleModule,
        modules_config: SdkModulesConfig,
        bundle_metadata: BundleMetadata,
        version_code: i32,
    ) -> Result<Self, ValidationError> {
        let tool_version = validation::validate_sdk_modules_config(&modules_config)?;
        if version_code < 0 {
            return Err(ValidationError::NegativeVersionCode { value: version_code });
        }
        Ok(Self {
            module,
            modules_config,
            tool_version,
            bundle_metadata,
            version_code,
        })
    }

    pub fn module(&self) -> &BundleModule {
        &self.module
    }

    pub fn modules_config(&self) -> &SdkModulesConfig {
        &self.modules_config
    }

    pub fn bundle_metadata(&self) -> &BundleMetadata {
        &self.bundle_metadata
    }

    pub fn tool_version(&self) -> &ToolVersion {
        &self.tool_version
    }

    /// Build identifier written to `android:versionCode`; unrelated to the
    /// major/minor/patch triple.
    pub fn version_code(&self) -> i32 {
        self.version_code
    }

    /// The SDK's logical package name.
    ///
    /// The installable artifact uses [`manifest_package_name`](Self::manifest_package_name) instead.
    pub fn package_name(&self) -> &str {
        &self.modules_config.sdk_package_name
    }

    pub fn major_version(&self) -> i32 {
        self.modules_config.sdk_version.major
    }

    pub fn minor_version(&self) -> i32 {
        self.modules_config.sdk_version.minor
    }

    pub fn patch_version(&self) -> i32 {
        self.modules_config.sdk_version.patch
    }

    /// `android:versionMajor` of the `<sdk-library>` tag: the composite of
    /// major and minor. Version 2.3.4 gives 20003.
    pub fn sdk_android_version_major(&self) -> i32 {
        encode_sdk_major_and_minor_version(self.major_version(), self.minor_version())
    }

    pub fn version_name(&self) -> String {
        format!(
            "{}.{}.{}",
            self.major_version(),
            self.minor_version(),
            self.patch_version()
        )
    }

    /// Package name concatenated with the composite version, e.g.
    /// `com.foo.bar_20003` for `com.foo.bar` 2.3.4.
    pub fn manifest_package_name(&self) -> String {
        format!("{}_{}", self.package_name(), self.sdk_android_version_major())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::manifest::AndroidManifest;

    fn bundle(package_name: &str, major: i32, minor: i32, patch: i32) -> SdkBundle {
        SdkBundle::new(
            BundleModule::new("base", AndroidManifest::new(package_name)),
            SdkModulesConfig::new("1.9.1", package_name, major, minor, patch),
            BundleMetadata::new(),
            1,
        )
        .unwrap()
    }

    #[test]
    fn manifest_package_name_embeds_composite_version() {
        assert_eq!(
            bundle("com.foo.bar", 2, 3, 4).manifest_package_name(),
            "com.foo.bar_20003"
        );
    }

    #[test]
    fn patch_does_not_change_package_identity() {
        assert_eq!(
            bundle("com.foo.bar", 2, 3, 4).manifest_package_name(),
            bundle("com.foo.bar", 2, 3, 9).manifest_package_name()
        );
    }

    #[test]
    fn version_name_is_dotted_triple() {
        assert_eq!(bundle("com.foo.bar", 15, 0, 5).version_name(), "15.0.5");
    }

    #[test]
    fn rejects_invalid_config() {
        let err = SdkBundle::new(
            BundleModule::new("base", AndroidManifest::new("p")),
            SdkModulesConfig::new("1.9.1", "p", 1, 2, -3),
            BundleMetadata::new(),
            1,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "SDK patch version must be a non-negative integer");
    }

    #[test]
    fn rejects_negative_version_code() {
        let err = SdkBundle::new(
            BundleModule::new("base", AndroidManifest::new("p")),
            SdkModulesConfig::new("1.9.1", "p", 1, 2, 3),
            BundleMetadata::new(),
            -1,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NegativeVersionCode { value: -1 }));
    }

    #[test]
    fn composite_decodes_back_to_version() {
        let sdk = bundle("com.foo.bar", 2, 3, 4);
        let decoded = SdkVersion::from_composite(sdk.sdk_android_version_major(), 4).unwrap();
        assert_eq!(decoded, sdk.modules_config().sdk_version);
        assert_eq!(SdkVersion::from_composite(-1, 0), None);
    }
}
