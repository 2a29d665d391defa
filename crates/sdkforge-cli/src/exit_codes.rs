//! Process exit codes. Defined next to `SdkForgeError::exit_code` so the
//! mapping and the constants cannot drift.

pub use sdkforge_core::error::exit_codes::*;
