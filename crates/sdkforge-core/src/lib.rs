//! Builds signed standalone artifact sets from runtime-enabled SDK bundles.
//!
//! A build reads an SDK bundle (`.asb`), validates its modules config,
//! generates the single standalone split, rewrites its manifest so the
//! artifact is installable as an SDK library, and writes the result as an
//! artifact set (archive file or directory).
//!
//! # Quick Start
//!
//! ```no_run
//! use sdkforge_core::build::BuildSdkApksCommand;
//! use sdkforge_core::io::OutputFormat;
//!
//! # fn example() -> anyhow::Result<()> {
//! let toc = BuildSdkApksCommand::new("sdk.asb", "out")
//!     .with_output_format(OutputFormat::Directory)
//!     .with_version_code(1253)
//!     .execute()?;
//! println!("built {} {}", toc.package_name, toc.version.version_code);
//! # Ok(())
//! # }
//! ```
//!
//! Host bundles declaring SDK dependencies are checked with
//! [`validation::validate_all_modules`].

pub mod build;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod splitter;
pub mod validation;
pub mod version;

pub use build::{BuildSdkApksCommand, BuildSdkApksManager};
pub use error::{SdkForgeError, SdkForgeResult};
pub use model::SdkBundle;
pub use pipeline::{ManifestMutationPipeline, MutationStep};
pub use validation::ValidationError;
