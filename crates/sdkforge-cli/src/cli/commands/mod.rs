use super::args::*;

pub mod build_sdk_apks;
pub mod dump_toc;
pub mod keygen;
pub mod validate;
pub mod validate_deps;

use crate::exit_codes::{EXIT_INVALID_INPUT, EXIT_IO_ERROR};
use sdkforge_core::{SdkForgeError, ValidationError};

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::BuildSdkApks(args) => build_sdk_apks::run(args),
        Command::Validate(args) => validate::run(args),
        Command::ValidateDeps(args) => validate_deps::run(args),
        Command::DumpToc(args) => dump_toc::run(args),
        Command::Keygen(args) => keygen::run(args),
    }
}

/// Exit code for an error returned by [`dispatch`]. Errors not raised by
/// sdkforge-core come from file handling.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<SdkForgeError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<ValidationError>().is_some() {
        return EXIT_INVALID_INPUT;
    }
    EXIT_IO_ERROR
}
