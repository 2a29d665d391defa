use sdkforge_core::build::DEFAULT_VERSION_CODE;
use sdkforge_core::io::read_sdk_bundle;

use super::super::args::ValidateArgs;
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let bundle = read_sdk_bundle(&args.sdk_bundle, DEFAULT_VERSION_CODE)?;
    println!(
        "{}: OK ({} {})",
        args.sdk_bundle.display(),
        bundle.package_name(),
        bundle.version_name()
    );
    Ok(exit_codes::EXIT_SUCCESS)
}
