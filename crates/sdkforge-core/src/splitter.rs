//! Split generation.
//!
//! A [`SplitGenerator`] turns a bundle module into the splits to package for
//! a set of device dimensions. SDK builds always ask for the empty set, which
//! yields one standalone split.

use std::collections::BTreeSet;

use crate::model::{BundleModule, ManifestError, ModuleSplit, SplitType, Targeting};

/// Device dimension a build may split on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SplitDimension {
    Abi,
    ScreenDensity,
    TextureCompressionFormat,
    Language,
}

/// Dimensions requested for one build. Empty means no device targeting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildDimensions(BTreeSet<SplitDimension>);

impl BuildDimensions {
    pub fn standalone() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SplitDimension> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("no split generated for module '{module}'")]
    NoSplits { module: String },

    #[error("split dimensions {dimensions:?} are not supported for module '{module}'")]
    UnsupportedDimensions {
        module: String,
        dimensions: Vec<SplitDimension>,
    },

    #[error("module '{module}': {source}")]
    Manifest {
        module: String,
        #[source]
        source: ManifestError,
    },
}

pub trait SplitGenerator {
    fn generate_splits(
        &self,
        module: &BundleModule,
        dimensions: &BuildDimensions,
    ) -> Result<Vec<ModuleSplit>, SplitError>;
}

/// Produces the single master split holding the whole module.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandaloneSplitter;

impl SplitGenerator for StandaloneSplitter {
    fn generate_splits(
        &self,
        module: &BundleModule,
        dimensions: &BuildDimensions,
    ) -> Result<Vec<ModuleSplit>, SplitError> {
        if !dimensions.is_empty() {
            return Err(SplitError::UnsupportedDimensions {
                module: module.name.clone(),
                dimensions: dimensions.iter().collect(),
            });
        }
        let min_sdk_version = module
            .manifest
            .effective_min_sdk_version()
            .map_err(|source| SplitError::Manifest {
                module: module.name.clone(),
                source,
            })?;

        Ok(vec![ModuleSplit {
            module_name: module.name.clone(),
            split_type: SplitType::Split,
            is_master_split: true,
            apk_targeting: Targeting::default(),
            variant_targeting: Targeting {
                min_sdk_version: Some(min_sdk_version),
                ..Default::default()
            },
            manifest: module.manifest.clone(),
            entries: module.entries.clone(),
        }])
    }
}
