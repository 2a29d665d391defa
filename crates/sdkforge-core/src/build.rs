//! Building standalone artifact sets from SDK bundles.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{SdkForgeError, SdkForgeResult};
use crate::io::{
    self, ApkSetWriter, ArtifactSet, BuildSdkApksResult, NamedSplit, OutputFormat, SigningConfig,
    STANDALONE_APK_PATH,
};
use crate::io::signing::SigningFailed;
use crate::model::SdkBundle;
use crate::pipeline::ManifestMutationPipeline;
use crate::splitter::{BuildDimensions, SplitError, SplitGenerator, StandaloneSplitter};

pub const DEFAULT_VERSION_CODE: i32 = 1;

/// A fully resolved `build-sdk-apks` request.
#[derive(Debug, Clone)]
pub struct BuildSdkApksCommand {
    pub sdk_bundle_path: PathBuf,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
    pub signing_config: Option<SigningConfig>,
    pub version_code: i32,
    pub overwrite: bool,
}

impl BuildSdkApksCommand {
    pub fn new(sdk_bundle_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            sdk_bundle_path: sdk_bundle_path.into(),
            output_path: output_path.into(),
            output_format: OutputFormat::default(),
            signing_config: None,
            version_code: DEFAULT_VERSION_CODE,
            overwrite: false,
        }
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn with_signing_config(mut self, signing_config: SigningConfig) -> Self {
        self.signing_config = Some(signing_config);
        self
    }

    pub fn with_version_code(mut self, version_code: i32) -> Self {
        self.version_code = version_code;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Checks that need no bundle parsing: input present, output free.
    pub fn validate(&self) -> SdkForgeResult<()> {
        if !self.sdk_bundle_path.is_file() {
            return Err(SdkForgeError::invalid_command(format!(
                "File '{}' was not found.",
                self.sdk_bundle_path.display()
            )));
        }
        if self.overwrite || !self.output_path.exists() {
            return Ok(());
        }
        let occupied = match self.output_format {
            OutputFormat::ApkSet => true,
            OutputFormat::Directory => !is_empty_dir(&self.output_path),
        };
        if occupied {
            return Err(SdkForgeError::invalid_command(format!(
                "File '{}' already exists.",
                self.output_path.display()
            )));
        }
        Ok(())
    }

    pub fn execute(&self) -> SdkForgeResult<BuildSdkApksResult> {
        self.validate()?;
        let bundle = io::read_sdk_bundle(&self.sdk_bundle_path, self.version_code)?;
        let writer = ApkSetWriter::new(
            self.output_format,
            self.signing_config.clone(),
            self.overwrite,
        );
        BuildSdkApksManager::new(writer).execute(&bundle, &self.output_path)
    }
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Runs one build: split generation, manifest mutation, packaging, writing.
///
/// Holds no state between runs; executing twice with the same bundle gives
/// identical manifests.
pub struct BuildSdkApksManager<G = StandaloneSplitter> {
    splitter: G,
    writer: ApkSetWriter,
}

impl BuildSdkApksManager {
    pub fn new(writer: ApkSetWriter) -> Self {
        Self::with_splitter(StandaloneSplitter, writer)
    }
}

impl<G: SplitGenerator> BuildSdkApksManager<G> {
    pub fn with_splitter(splitter: G, writer: ApkSetWriter) -> Self {
        Self { splitter, writer }
    }

    /// Generate and mutate every split, then name them and build the TOC.
    /// Either every split is mutated or an error is returned.
    pub fn build_artifact_set(&self, bundle: &SdkBundle) -> SdkForgeResult<ArtifactSet> {
        let module = bundle.module();
        let splits = self
            .splitter
            .generate_splits(module, &BuildDimensions::standalone())?;
        if splits.is_empty() {
            return Err(SplitError::NoSplits {
                module: module.name.clone(),
            }
            .into());
        }

        let pipeline = ManifestMutationPipeline::new(bundle);
        let count = splits.len();
        let apks = splits
            .into_iter()
            .enumerate()
            .map(|(index, split)| -> SdkForgeResult<NamedSplit> {
                Ok(NamedSplit {
                    path: standalone_path(index, count),
                    split: pipeline.apply(split)?,
                })
            })
            .collect::<SdkForgeResult<Vec<_>>>()?;

        let toc = BuildSdkApksResult::new(
            bundle,
            apks.iter().map(|apk| (apk.path.as_str(), &apk.split)),
        );
        Ok(ArtifactSet { toc, apks })
    }

    pub fn execute(&self, bundle: &SdkBundle, output: &Path) -> SdkForgeResult<BuildSdkApksResult> {
        info!(
            package_name = bundle.package_name(),
            version = %bundle.version_name(),
            version_code = bundle.version_code(),
            "building SDK artifacts"
        );
        let set = self.build_artifact_set(bundle)?;
        self.writer.write(&set, output).map_err(classify_write_error)?;
        info!(
            package_name = bundle.package_name(),
            output = %output.display(),
            "built SDK artifacts"
        );
        Ok(set.toc)
    }
}

fn standalone_path(index: usize, count: usize) -> String {
    if count == 1 {
        STANDALONE_APK_PATH.to_string()
    } else {
        format!("standalones/standalone-{index}.apk")
    }
}

fn classify_write_error(err: anyhow::Error) -> SdkForgeError {
    if err.downcast_ref::<SigningFailed>().is_some() {
        SdkForgeError::Signing(err)
    } else {
        SdkForgeError::Io(err)
    }
}
