use std::path::PathBuf;

use sdkforge_core::build::{BuildSdkApksCommand, DEFAULT_VERSION_CODE};
use sdkforge_core::config::{self, BuildConfig};
use sdkforge_core::io::{OutputFormat, SigningConfig};
use sdkforge_core::{SdkForgeError, SdkForgeResult};

use super::super::args::BuildSdkApksArgs;
use crate::exit_codes;

pub fn run(args: BuildSdkApksArgs) -> anyhow::Result<i32> {
    let command = resolve(args)?;
    let toc = command.execute()?;
    println!(
        "Built {} {}.{}.{} (version code {}) -> {}",
        toc.package_name,
        toc.version.major,
        toc.version.minor,
        toc.version.patch,
        toc.version.version_code,
        command.output_path.display()
    );
    Ok(exit_codes::EXIT_SUCCESS)
}

/// Merge flags over the optional config file into a build command.
pub fn resolve(args: BuildSdkApksArgs) -> SdkForgeResult<BuildSdkApksCommand> {
    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => BuildConfig::default(),
    };

    let output_format = match args.output_format.as_deref() {
        Some(raw) => raw.parse::<OutputFormat>()?,
        None => config.output_format.unwrap_or_default(),
    };
    let version_code = args
        .version_code
        .or(config.version_code)
        .unwrap_or(DEFAULT_VERSION_CODE);
    let overwrite = args.overwrite || config.overwrite.unwrap_or(false);
    let signing_key: Option<PathBuf> = args
        .signing_key
        .or_else(|| config.signing_key_path().map(PathBuf::from));

    let mut command = BuildSdkApksCommand::new(args.sdk_bundle, args.output)
        .with_output_format(output_format)
        .with_version_code(version_code)
        .with_overwrite(overwrite);
    if let Some(path) = signing_key {
        let signing = SigningConfig::from_pem_file(&path).map_err(SdkForgeError::Signing)?;
        command = command.with_signing_config(signing);
    }
    Ok(command)
}
