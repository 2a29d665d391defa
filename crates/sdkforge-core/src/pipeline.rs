//! Manifest mutations turning a generated split into an SDK artifact.
//!
//! The steps run in the fixed order of [`MutationStep::ALL`]. Order matters:
//! the `<sdk-library>` element carries the composite version also used by the
//! package rewrite, and the min-SDK clamp must see the value baked into the
//! split at generation time.
//!
//! Splits reaching the pipeline come from a validated [`SdkBundle`]; a
//! manifest lacking an expected element is reported as a
//! [`ManifestError`], never repaired.

use tracing::debug;

use crate::model::manifest::{SDK_PATCH_VERSION_PROPERTY_NAME, SDK_SANDBOX_MIN_VERSION};
use crate::model::{AndroidManifest, ManifestError, ModuleSplit, SdkBundle};

/// One named manifest edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStep {
    /// Post: split type is standalone, no variant or APK targeting. The
    /// manifest is not touched.
    SetStandaloneVariant,
    /// Post: `android:versionName` is `major.minor.patch`.
    WriteVersionName,
    /// Post: `android:versionCode` is the bundle's version code, verbatim.
    WriteVersionCode,
    /// Post: `package` is `<sdk package>_<composite version>`.
    WriteManifestPackage,
    /// Pre: `<application>` exists. Post: exactly one `<sdk-library>` naming
    /// the undecorated SDK package and the composite version.
    WriteSdkLibraryElement,
    /// Post: min SDK version is at least [`SDK_SANDBOX_MIN_VERSION`]; a higher
    /// declared value is kept.
    OverrideMinSdkVersionForSdkSandbox,
    /// Pre: `<application>` exists. Post: the patch-version property holds
    /// the patch version.
    WritePatchVersion,
}

impl MutationStep {
    pub const ALL: [MutationStep; 7] = [
        MutationStep::SetStandaloneVariant,
        MutationStep::WriteVersionName,
        MutationStep::WriteVersionCode,
        MutationStep::WriteManifestPackage,
        MutationStep::WriteSdkLibraryElement,
        MutationStep::OverrideMinSdkVersionForSdkSandbox,
        MutationStep::WritePatchVersion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SetStandaloneVariant => "set-standalone-variant",
            Self::WriteVersionName => "write-version-name",
            Self::WriteVersionCode => "write-version-code",
            Self::WriteManifestPackage => "write-manifest-package",
            Self::WriteSdkLibraryElement => "write-sdk-library-element",
            Self::OverrideMinSdkVersionForSdkSandbox => "override-min-sdk-version",
            Self::WritePatchVersion => "write-patch-version",
        }
    }

    pub fn apply(self, split: &mut ModuleSplit, bundle: &SdkBundle) -> Result<(), ManifestError> {
        if self == Self::SetStandaloneVariant {
            split.set_standalone_variant();
            return Ok(());
        }
        let manifest = &mut split.manifest;
        match self {
            Self::SetStandaloneVariant => {}
            Self::WriteVersionName => manifest.set_version_name(&bundle.version_name()),
            Self::WriteVersionCode => manifest.set_version_code(bundle.version_code()),
            Self::WriteManifestPackage => {
                manifest.set_package_name(&bundle.manifest_package_name())
            }
            Self::WriteSdkLibraryElement => manifest
                .set_sdk_library_element(bundle.package_name(), bundle.sdk_android_version_major())?,
            Self::OverrideMinSdkVersionForSdkSandbox => {
                override_min_sdk_version_for_sdk_sandbox(manifest)?
            }
            Self::WritePatchVersion => {
                manifest.set_property(SDK_PATCH_VERSION_PROPERTY_NAME, bundle.patch_version())?
            }
        }
        Ok(())
    }
}

/// Raise the manifest's min SDK version to the sandbox minimum. Never lowers it.
pub fn override_min_sdk_version_for_sdk_sandbox(
    manifest: &mut AndroidManifest,
) -> Result<(), ManifestError> {
    if manifest.effective_min_sdk_version()? < SDK_SANDBOX_MIN_VERSION {
        manifest.set_min_sdk_version(SDK_SANDBOX_MIN_VERSION);
    }
    Ok(())
}

/// Applies [`MutationStep::ALL`] to splits of one SDK bundle.
#[derive(Debug, Clone, Copy)]
pub struct ManifestMutationPipeline<'a> {
    bundle: &'a SdkBundle,
}

impl<'a> ManifestMutationPipeline<'a> {
    pub fn new(bundle: &'a SdkBundle) -> Self {
        Self { bundle }
    }

    pub fn steps(&self) -> &'static [MutationStep] {
        &MutationStep::ALL
    }

    pub fn apply(&self, mut split: ModuleSplit) -> Result<ModuleSplit, ManifestError> {
        for step in self.steps() {
            step.apply(&mut split, self.bundle)?;
            debug!(
                step = step.name(),
                module = %split.module_name,
                "applied manifest mutation"
            );
        }
        Ok(split)
    }
}
