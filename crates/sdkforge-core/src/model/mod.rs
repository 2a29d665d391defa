//! Domain model: SDK bundles, modules, manifests and splits.

pub mod bundle;
pub mod manifest;
pub mod module;
pub mod split;

pub use bundle::{BundleMetadata, SdkBundle, SdkModulesConfig, SdkVersion, ToolInfo};
pub use manifest::{AndroidManifest, AttributeValue, ManifestError, XmlElement};
pub use module::{
    BundleModule, ModuleEntry, RuntimeEnabledSdk, RuntimeEnabledSdkConfig, BASE_MODULE_NAME,
};
pub use split::{ModuleSplit, SplitType, Targeting};
