use super::ValidationError;
use crate::io::sdk_bundle::paths;

/// Check that an SDK bundle archive carries the files every SDK bundle needs.
///
/// `entries` are the archive's entry paths.
pub fn validate_sdk_bundle_files<'a>(
    entries: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    if entries.into_iter().any(|path| path == paths::MODULES_FILE) {
        return Ok(());
    }
    Err(ValidationError::MissingRequiredFile {
        file: paths::MODULES_FILE.to_string(),
    })
}
