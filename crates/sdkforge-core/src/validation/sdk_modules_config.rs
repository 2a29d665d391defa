use tracing::debug;

use super::ValidationError;
use crate::model::SdkModulesConfig;
use crate::version::{
    is_valid_major, is_valid_minor, ToolVersion, VERSION_MAJOR_MAX_VALUE, VERSION_MINOR_MAX_VALUE,
};

/// Validate an SDK bundle's own modules config.
///
/// Checks run in order (tool version, major, minor, patch) and the first
/// violation is returned. On success the parsed tool version is returned so
/// callers don't parse it twice.
pub fn validate_sdk_modules_config(
    config: &SdkModulesConfig,
) -> Result<ToolVersion, ValidationError> {
    let result = check(config);
    if let Err(err) = &result {
        debug!(
            package_name = %config.sdk_package_name,
            error = %err,
            "rejected SDK modules config"
        );
    }
    result
}

fn check(config: &SdkModulesConfig) -> Result<ToolVersion, ValidationError> {
    let tool_version = config
        .bundletool
        .version
        .parse::<ToolVersion>()
        .map_err(|_| ValidationError::InvalidToolVersion {
            version: config.bundletool.version.clone(),
        })?;

    let version = &config.sdk_version;
    if !is_valid_major(version.major) {
        return Err(ValidationError::MajorVersionOutOfRange {
            value: version.major,
            max: VERSION_MAJOR_MAX_VALUE,
        });
    }
    if !is_valid_minor(version.minor) {
        return Err(ValidationError::MinorVersionOutOfRange {
            value: version.minor,
            max: VERSION_MINOR_MAX_VALUE,
        });
    }
    if version.patch < 0 {
        return Err(ValidationError::NegativePatchVersion {
            value: version.patch,
        });
    }

    Ok(tool_version)
}
