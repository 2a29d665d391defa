use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use sdkforge_core::model::RuntimeEnabledSdkConfig;
use sdkforge_core::validation::runtime_enabled_sdk_config::validate_runtime_enabled_sdk_configs;
use sdkforge_core::{SdkForgeError, SdkForgeResult, ValidationError};

use super::super::args::ValidateDepsArgs;
use crate::exit_codes;

pub fn run(args: ValidateDepsArgs) -> anyhow::Result<i32> {
    let configs = load_configs(&args.configs)?;
    validate_runtime_enabled_sdk_configs(&configs).map_err(SdkForgeError::from)?;

    let count: usize = configs.iter().map(|c| c.runtime_enabled_sdk.len()).sum();
    println!("{count} runtime-enabled SDK dependencies OK");
    Ok(exit_codes::EXIT_SUCCESS)
}

fn load_configs(paths: &[PathBuf]) -> SdkForgeResult<Vec<RuntimeEnabledSdkConfig>> {
    paths
        .iter()
        .map(|path| {
            let raw = fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))
                .map_err(SdkForgeError::Io)?;
            RuntimeEnabledSdkConfig::from_json(&raw).map_err(|e| {
                SdkForgeError::from(ValidationError::MalformedFile {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                })
            })
        })
        .collect()
}
