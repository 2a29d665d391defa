//! Validation gate run before any build step.
//!
//! - [`sdk_modules_config`]: the SDK bundle's own version triple and tool version.
//! - [`runtime_enabled_sdk_config`]: SDK dependencies declared by a host bundle.
//! - [`mandatory_files`]: archive-level shape of an SDK bundle.
//!
//! All validators fail fast: the first violated rule is returned and nothing
//! after it is evaluated.

pub mod mandatory_files;
pub mod runtime_enabled_sdk_config;
pub mod sdk_modules_config;

pub use mandatory_files::validate_sdk_bundle_files;
pub use runtime_enabled_sdk_config::{validate_all_modules, validate_runtime_enabled_sdk_configs};
pub use sdk_modules_config::validate_sdk_modules_config;

/// A bundle or dependency declaration rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid tool version in the SdkModulesConfig file: '{version}'")]
    InvalidToolVersion { version: String },

    #[error("SDK major version must be an integer between 0 and {max}")]
    MajorVersionOutOfRange { value: i32, max: i32 },

    #[error("SDK minor version must be an integer between 0 and {max}")]
    MinorVersionOutOfRange { value: i32, max: i32 },

    #[error("SDK patch version must be a non-negative integer")]
    NegativePatchVersion { value: i32 },

    #[error("Version code must be a non-negative integer, got {value}")]
    NegativeVersionCode { value: i32 },

    #[error("The archive doesn't seem to be an SDK Bundle, it is missing required file '{file}'.")]
    MissingRequiredFile { file: String },

    #[error("SDK bundles must contain exactly one module, found {count}.")]
    ModuleCount { count: usize },

    #[error("File '{file}' of the SDK Bundle is malformed: {reason}")]
    MalformedFile { file: String, reason: String },

    #[error("Found dependency on runtime-enabled SDK with an empty package name.")]
    DependencyEmptyPackageName,

    #[error("Found dependency on runtime-enabled SDK '{package_name}' with a negative major version.")]
    DependencyNegativeMajor { package_name: String },

    #[error(
        "Found dependency on runtime-enabled SDK '{package_name}' with illegal major version. \
         Major version must be <= {max}"
    )]
    DependencyMajorTooBig {
        package_name: String,
        value: i32,
        max: i32,
    },

    #[error("Found dependency on runtime-enabled SDK '{package_name}' with a negative minor version.")]
    DependencyNegativeMinor { package_name: String },

    #[error(
        "Found dependency on runtime-enabled SDK '{package_name}' with illegal minor version. \
         Minor version must be <= {max}"
    )]
    DependencyMinorTooBig {
        package_name: String,
        value: i32,
        max: i32,
    },

    #[error(
        "Found dependency on runtime-enabled SDK '{package_name}' with a signing certificate \
         digest of unexpected format."
    )]
    DependencyCertificateDigest { package_name: String },

    #[error("Found multiple dependencies on the same runtime-enabled SDK '{package_name}'.")]
    DuplicateDependency { package_name: String },
}
