//! On-disk formats: SDK bundle archives in, signed artifact sets out.

pub mod apk_set;
pub mod archive;
pub mod sdk_bundle;
pub mod signing;
pub mod toc;

pub use apk_set::{
    read_artifact_set, ApkSetWriter, ArtifactSet, ArtifactSetContents, NamedSplit, OutputFormat,
    STANDALONE_APK_PATH,
};
pub use sdk_bundle::{parse_sdk_bundle, read_sdk_bundle, SdkBundleSerializer};
pub use signing::{verify_artifact, SigningConfig, VerifyError};
pub use toc::{BuildSdkApksResult, SdkVersionInformation};
