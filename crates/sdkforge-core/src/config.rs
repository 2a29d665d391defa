//! Optional YAML build configuration.
//!
//! ```yaml
//! version: 1
//! output_format: directory
//! version_code: 1253
//! overwrite: true
//! signing:
//!   key_path: keys/private_key.pem
//! ```
//!
//! Every field is optional; command-line flags take precedence.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{SdkForgeError, SdkForgeResult};
use crate::io::OutputFormat;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub version: u32,
    pub output_format: Option<OutputFormat>,
    pub version_code: Option<i32>,
    pub overwrite: Option<bool>,
    pub signing: Option<SigningSection>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            output_format: None,
            version_code: None,
            overwrite: None,
            signing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningSection {
    /// PKCS#8 PEM private key. Relative paths resolve against the config
    /// file's directory.
    pub key_path: PathBuf,
}

impl BuildConfig {
    pub fn from_yaml(raw: &str) -> SdkForgeResult<Self> {
        let config: BuildConfig = serde_yaml::from_str(raw).map_err(|e| {
            SdkForgeError::invalid_command(format!("failed to parse build config: {e}"))
        })?;
        if config.version != SUPPORTED_CONFIG_VERSION {
            return Err(SdkForgeError::invalid_command(format!(
                "unsupported config version {} (supported: {})",
                config.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        Ok(config)
    }

    pub fn signing_key_path(&self) -> Option<&Path> {
        self.signing.as_ref().map(|s| s.key_path.as_path())
    }
}

pub fn load_config(path: &Path) -> SdkForgeResult<BuildConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SdkForgeError::invalid_command(format!(
            "failed to read config {}: {e}",
            path.display()
        ))
    })?;
    let mut config = BuildConfig::from_yaml(&raw)?;
    if let (Some(signing), Some(dir)) = (config.signing.as_mut(), path.parent()) {
        if signing.key_path.is_relative() {
            signing.key_path = dir.join(&signing.key_path);
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(BuildConfig::from_yaml("{}").unwrap(), BuildConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let config = BuildConfig::from_yaml(
            "output_format: directory\nversion_code: 1253\noverwrite: true\nsigning:\n  key_path: k.pem\n",
        )
        .unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Directory));
        assert_eq!(config.version_code, Some(1253));
        assert_eq!(config.overwrite, Some(true));
        assert_eq!(config.signing_key_path(), Some(Path::new("k.pem")));
    }

    #[test]
    fn unknown_output_format_is_rejected() {
        let err = BuildConfig::from_yaml("output_format: zip\n").unwrap_err();
        assert!(err.to_string().contains("Unsupported output format 'zip'."));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = BuildConfig::from_yaml("output_fromat: directory\n").unwrap_err();
        assert!(err.to_string().contains("output_fromat"));
    }

    #[test]
    fn unsupported_version() {
        let err = BuildConfig::from_yaml("version: 2\n").unwrap_err();
        assert!(err.to_string().contains("unsupported config version 2"));
    }

    #[test]
    fn relative_key_path_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sdkforge.yaml");
        std::fs::write(&path, "signing:\n  key_path: keys/private_key.pem\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(
            config.signing_key_path(),
            Some(dir.path().join("keys/private_key.pem").as_path())
        );
    }
}
