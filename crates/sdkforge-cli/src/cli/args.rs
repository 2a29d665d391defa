use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sdkforge",
    version,
    about = "Build signed standalone artifacts from runtime-enabled SDK bundles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the standalone artifact set of an SDK bundle
    BuildSdkApks(BuildSdkApksArgs),
    /// Check an SDK bundle without building it
    Validate(ValidateArgs),
    /// Check the runtime-enabled SDK dependencies of a host bundle
    ValidateDeps(ValidateDepsArgs),
    /// Print the table of contents of a built artifact set
    DumpToc(DumpTocArgs),
    /// Generate an ed25519 keypair for signing artifacts
    Keygen(KeygenArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildSdkApksArgs {
    /// SDK bundle (.asb) to build
    #[arg(long)]
    pub sdk_bundle: PathBuf,

    /// Output archive file or directory
    #[arg(long)]
    pub output: PathBuf,

    /// Output layout: apk_set or directory
    #[arg(long, env = "SDKFORGE_OUTPUT_FORMAT")]
    pub output_format: Option<String>,

    /// PKCS#8 PEM private key used to sign the artifacts
    #[arg(long, env = "SDKFORGE_SIGNING_KEY")]
    pub signing_key: Option<PathBuf>,

    /// Version code written to the artifact manifest
    #[arg(long)]
    pub version_code: Option<i32>,

    /// YAML build config; flags take precedence over it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replace an existing output
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub sdk_bundle: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateDepsArgs {
    /// runtime_enabled_sdk_config.json files, one per host module
    #[arg(required = true)]
    pub configs: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DumpTocArgs {
    /// Artifact set written by build-sdk-apks (archive file or directory)
    #[arg(long)]
    pub artifacts: PathBuf,

    /// Also verify every artifact signature
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug, Clone)]
pub struct KeygenArgs {
    /// Output directory for keypair files
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Force overwrite existing files
    #[arg(long, short)]
    pub force: bool,
}
