//! Validation of the runtime-enabled SDK dependencies a host bundle declares.
//!
//! Each declaration is checked on its own first. Only once every
//! declaration of every module passes is the bundle-wide uniqueness of
//! package names checked: the sandbox resolves SDK dependencies across the
//! whole bundle, so two modules depending on the same SDK are as ambiguous as
//! one module listing it twice.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::ValidationError;
use crate::model::{BundleModule, RuntimeEnabledSdk, RuntimeEnabledSdkConfig};
use crate::version::{VERSION_MAJOR_MAX_VALUE, VERSION_MINOR_MAX_VALUE};

lazy_static! {
    // SHA-256 fingerprint: 32 colon-separated uppercase hex bytes.
    static ref CERTIFICATE_DIGEST: Regex = Regex::new(r"^[0-9A-F]{2}(?::[0-9A-F]{2}){31}$").unwrap();
}

/// Validate the SDK dependencies declared across all modules of one bundle.
pub fn validate_all_modules(modules: &[BundleModule]) -> Result<(), ValidationError> {
    validate_declarations(modules.iter().flat_map(|m| m.runtime_enabled_sdks()))
}

/// Same as [`validate_all_modules`] for bare configs, one per module.
pub fn validate_runtime_enabled_sdk_configs(
    configs: &[RuntimeEnabledSdkConfig],
) -> Result<(), ValidationError> {
    validate_declarations(configs.iter().flat_map(|c| c.runtime_enabled_sdk.iter()))
}

fn validate_declarations<'a>(
    sdks: impl Iterator<Item = &'a RuntimeEnabledSdk> + Clone,
) -> Result<(), ValidationError> {
    let result = sdks
        .clone()
        .try_for_each(validate_runtime_enabled_sdk)
        .and_then(|()| check_unique_package_names(sdks));
    if let Err(err) = &result {
        debug!(error = %err, "rejected runtime-enabled SDK dependencies");
    }
    result
}

/// Check a single declaration in isolation.
pub fn validate_runtime_enabled_sdk(sdk: &RuntimeEnabledSdk) -> Result<(), ValidationError> {
    if sdk.package_name.is_empty() {
        return Err(ValidationError::DependencyEmptyPackageName);
    }
    let package_name = || sdk.package_name.clone();

    if sdk.version_major < 0 {
        return Err(ValidationError::DependencyNegativeMajor {
            package_name: package_name(),
        });
    }
    if sdk.version_major > VERSION_MAJOR_MAX_VALUE {
        return Err(ValidationError::DependencyMajorTooBig {
            package_name: package_name(),
            value: sdk.version_major,
            max: VERSION_MAJOR_MAX_VALUE,
        });
    }
    if sdk.version_minor < 0 {
        return Err(ValidationError::DependencyNegativeMinor {
            package_name: package_name(),
        });
    }
    if sdk.version_minor > VERSION_MINOR_MAX_VALUE {
        return Err(ValidationError::DependencyMinorTooBig {
            package_name: package_name(),
            value: sdk.version_minor,
            max: VERSION_MINOR_MAX_VALUE,
        });
    }
    if !is_valid_certificate_digest(&sdk.certificate_digest) {
        return Err(ValidationError::DependencyCertificateDigest {
            package_name: package_name(),
        });
    }
    Ok(())
}

pub fn is_valid_certificate_digest(digest: &str) -> bool {
    CERTIFICATE_DIGEST.is_match(digest)
}

fn check_unique_package_names<'a>(
    sdks: impl Iterator<Item = &'a RuntimeEnabledSdk>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for sdk in sdks {
        if !seen.insert(sdk.package_name.as_str()) {
            return Err(ValidationError::DuplicateDependency {
                package_name: sdk.package_name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AndroidManifest;

    const VALID_CERT_FINGERPRINT: &str = "96:C7:EC:89:3E:69:2A:25:BA:4D:EE:C1:84:E8:33:3F:34:7D:6D:12:26:A1:C1:AA:70:A2:8A:DB:75:3E:02:0A";

    fn sdk(package_name: &str, major: i32, minor: i32, digest: &str) -> RuntimeEnabledSdk {
        RuntimeEnabledSdk::new(package_name, major, minor, digest)
    }

    fn module_with(sdks: Vec<RuntimeEnabledSdk>) -> BundleModule {
        BundleModule::new("module", AndroidManifest::new("com.test.app")).with_runtime_enabled_sdk_config(
            RuntimeEnabledSdkConfig {
                runtime_enabled_sdk: sdks,
            },
        )
    }

    /// The invalid declaration comes first, next to a valid one.
    fn assert_rejected(invalid: RuntimeEnabledSdk, expected: &str) {
        let module = module_with(vec![
            invalid,
            sdk("package.name.2", 1234, 0, VALID_CERT_FINGERPRINT),
        ]);
        let err = validate_all_modules(&[module]).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in '{err}'"
        );
    }

    #[test]
    fn no_config_succeeds() {
        let module = BundleModule::new("module", AndroidManifest::new("com.test.app"));
        validate_all_modules(&[module]).unwrap();
    }

    #[test]
    fn empty_config_succeeds() {
        validate_all_modules(&[module_with(vec![])]).unwrap();
    }

    #[test]
    fn valid_config_succeeds() {
        let module = module_with(vec![
            sdk("package.name.1", 1234, 0, VALID_CERT_FINGERPRINT),
            sdk("package.name.2", 1234, 0, VALID_CERT_FINGERPRINT),
        ]);
        validate_all_modules(&[module]).unwrap();
    }

    #[test]
    fn boundary_versions_succeed() {
        let module = module_with(vec![sdk(
            "package.name.1",
            VERSION_MAJOR_MAX_VALUE,
            VERSION_MINOR_MAX_VALUE,
            VALID_CERT_FINGERPRINT,
        )]);
        validate_all_modules(&[module]).unwrap();
    }

    #[test]
    fn missing_package_name() {
        let missing = RuntimeEnabledSdk {
            version_major: 1234,
            certificate_digest: VALID_CERT_FINGERPRINT.into(),
            ..Default::default()
        };
        assert_rejected(
            missing,
            "Found dependency on runtime-enabled SDK with an empty package name.",
        );
    }

    #[test]
    fn empty_package_name() {
        assert_rejected(
            sdk("", 1234, 0, VALID_CERT_FINGERPRINT),
            "Found dependency on runtime-enabled SDK with an empty package name.",
        );
    }

    #[test]
    fn negative_major() {
        assert_rejected(
            sdk("package.name.1", -1, 0, VALID_CERT_FINGERPRINT),
            "Found dependency on runtime-enabled SDK 'package.name.1' with a negative major version.",
        );
    }

    #[test]
    fn major_too_big() {
        assert_rejected(
            sdk("package.name.1", VERSION_MAJOR_MAX_VALUE + 1, 0, VALID_CERT_FINGERPRINT),
            &format!(
                "Found dependency on runtime-enabled SDK 'package.name.1' with illegal major version. \
                 Major version must be <= {VERSION_MAJOR_MAX_VALUE}"
            ),
        );
    }

    #[test]
    fn negative_minor() {
        assert_rejected(
            sdk("package.name.1", 0, -1, VALID_CERT_FINGERPRINT),
            "Found dependency on runtime-enabled SDK 'package.name.1' with a negative minor version.",
        );
    }

    #[test]
    fn minor_too_big() {
        assert_rejected(
            sdk("package.name.1", 0, VERSION_MINOR_MAX_VALUE + 1, VALID_CERT_FINGERPRINT),
            &format!(
                "Found dependency on runtime-enabled SDK 'package.name.1' with illegal minor version. \
                 Minor version must be <= {VERSION_MINOR_MAX_VALUE}"
            ),
        );
    }

    #[test]
    fn missing_certificate_digest() {
        assert_rejected(
            sdk("package.name.1", 1234, 0, ""),
            "Found dependency on runtime-enabled SDK 'package.name.1' with a signing certificate \
             digest of unexpected format.",
        );
    }

    #[test]
    fn malformed_certificate_digest() {
        assert_rejected(
            sdk("package.name.1", 1234, 0, "abcd"),
            "Found dependency on runtime-enabled SDK 'package.name.1' with a signing certificate \
             digest of unexpected format.",
        );
    }

    #[test]
    fn certificate_digest_shape() {
        assert!(is_valid_certificate_digest(VALID_CERT_FINGERPRINT));
        assert!(!is_valid_certificate_digest(&VALID_CERT_FINGERPRINT.to_lowercase()));
        // 31 groups
        assert!(!is_valid_certificate_digest(&VALID_CERT_FINGERPRINT[3..]));
        // wrong separator
        assert!(!is_valid_certificate_digest(&VALID_CERT_FINGERPRINT.replace(':', "-")));
        // trailing separator
        assert!(!is_valid_certificate_digest(&format!("{VALID_CERT_FINGERPRINT}:")));
        assert_eq!(VALID_CERT_FINGERPRINT.len(), 95);
    }

    #[test]
    fn duplicate_across_modules() {
        let declaration = sdk("package.name.1", 1234, 0, VALID_CERT_FINGERPRINT);
        let module1 = module_with(vec![declaration.clone()]);
        let module2 = module_with(vec![declaration]);
        let err = validate_all_modules(&[module1, module2]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Found multiple dependencies on the same runtime-enabled SDK 'package.name.1'."
        );
    }

    #[test]
    fn duplicate_within_module() {
        let module = module_with(vec![
            sdk("package.name.1", 1, 0, VALID_CERT_FINGERPRINT),
            sdk("package.name.1", 2, 0, VALID_CERT_FINGERPRINT),
        ]);
        let err = validate_all_modules(&[module]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateDependency {
                package_name: "package.name.1".into()
            }
        );
    }

    /// Fail-fast is deliberate: only the first violation is reported, and a
    /// duplicate is not reported while any declaration is malformed.
    #[test]
    fn reports_only_first_violation() {
        let module1 = module_with(vec![
            sdk("package.name.1", 1, 0, VALID_CERT_FINGERPRINT),
            sdk("package.name.1", 1, 0, VALID_CERT_FINGERPRINT),
        ]);
        let module2 = module_with(vec![
            sdk("package.name.2", -1, 0, VALID_CERT_FINGERPRINT),
            sdk("", 1, 0, VALID_CERT_FINGERPRINT),
        ]);
        let err = validate_all_modules(&[module1, module2]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DependencyNegativeMajor {
                package_name: "package.name.2".into()
            }
        );
    }

    #[test]
    fn configs_are_validated_bundle_wide() {
        let config = RuntimeEnabledSdkConfig {
            runtime_enabled_sdk: vec![sdk("package.name.1", 1, 0, VALID_CERT_FINGERPRINT)],
        };
        let err = validate_runtime_enabled_sdk_configs(&[config.clone(), config]).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateDependency { .. }));
    }
}
