//! Bundle modules and their runtime-enabled SDK dependency declarations.

use serde::{Deserialize, Serialize};

use super::manifest::AndroidManifest;

/// Name of the single module an SDK bundle carries.
pub const BASE_MODULE_NAME: &str = "base";

/// A file inside a module, addressed by its module-relative POSIX path
/// (e.g. `dex/classes.dex`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub path: String,
    pub content: Vec<u8>,
}

impl ModuleEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Dependency of a host module on one runtime-enabled SDK.
///
/// Fields missing from the serialized form default to empty/zero, so an
/// absent package name or certificate digest is indistinguishable from an
/// empty one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeEnabledSdk {
    pub package_name: String,
    pub version_major: i32,
    pub version_minor: i32,
    /// SHA-256 fingerprint of the SDK signing certificate
    /// (`XX:XX:…:XX`, 32 uppercase hex groups).
    pub certificate_digest: String,
}

impl RuntimeEnabledSdk {
    pub fn new(
        package_name: impl Into<String>,
        version_major: i32,
        version_minor: i32,
        certificate_digest: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            version_major,
            version_minor,
            certificate_digest: certificate_digest.into(),
        }
    }
}

/// All SDK dependencies declared by one host module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeEnabledSdkConfig {
    pub runtime_enabled_sdk: Vec<RuntimeEnabledSdk>,
}

impl RuntimeEnabledSdkConfig {
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// One module of a bundle: its manifest, content files and, for host
/// application modules, the SDKs it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleModule {
    pub name: String,
    pub manifest: AndroidManifest,
    pub entries: Vec<ModuleEntry>,
    pub runtime_enabled_sdk_config: Option<RuntimeEnabledSdkConfig>,
}

impl BundleModule {
    pub fn new(name: impl Into<String>, manifest: AndroidManifest) -> Self {
        Self {
            name: name.into(),
            manifest,
            entries: Vec::new(),
            runtime_enabled_sdk_config: None,
        }
    }

    pub fn with_entry(mut self, entry: ModuleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn with_runtime_enabled_sdk_config(mut self, config: RuntimeEnabledSdkConfig) -> Self {
        self.runtime_enabled_sdk_config = Some(config);
        self
    }

    /// Declared SDK dependencies, empty when the module declares none.
    pub fn runtime_enabled_sdks(&self) -> &[RuntimeEnabledSdk] {
        self.runtime_enabled_sdk_config
            .as_ref()
            .map(|c| c.runtime_enabled_sdk.as_slice())
            .unwrap_or(&[])
    }
}
