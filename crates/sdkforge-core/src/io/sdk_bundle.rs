//! SDK bundle (`.asb`) archives.
//!
//! ```text
//! bundle.asb (gzip tar)
//! ├── modules.resm (gzip tar)
//! │   ├── SdkModulesConfig.json
//! │   └── base/
//! │       ├── manifest/AndroidManifest.json
//! │       └── ... module content
//! └── BUNDLE-METADATA/<namespace>/<name>
//! ```

use anyhow::Context;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use super::archive::{self, ArchiveEntries};
use crate::error::{SdkForgeError, SdkForgeResult};
use crate::model::{
    AndroidManifest, BundleMetadata, BundleModule, ModuleEntry, SdkBundle, SdkModulesConfig,
};
use crate::validation::{self, ValidationError};

/// Archive paths.
pub mod paths {
    pub const MODULES_FILE: &str = "modules.resm";
    pub const MODULES_CONFIG_FILE: &str = "SdkModulesConfig.json";
    pub const METADATA_PREFIX: &str = "BUNDLE-METADATA/";
    /// Relative to the module directory.
    pub const MODULE_MANIFEST_FILE: &str = "manifest/AndroidManifest.json";
}

/// Read and validate an SDK bundle file.
pub fn read_sdk_bundle(path: &Path, version_code: i32) -> SdkForgeResult<SdkBundle> {
    let file = File::open(path)
        .with_context(|| format!("failed to open SDK bundle {}", path.display()))
        .map_err(SdkForgeError::Io)?;
    let bundle = parse_sdk_bundle(BufReader::new(file), version_code)?;
    info!(
        path = %path.display(),
        package_name = bundle.package_name(),
        version = %bundle.version_name(),
        "loaded SDK bundle"
    );
    Ok(bundle)
}

/// Parse an SDK bundle from any reader.
///
/// The mandatory files are checked before anything is parsed, and the
/// modules config is validated before the bundle is constructed.
pub fn parse_sdk_bundle<R: Read>(reader: R, version_code: i32) -> SdkForgeResult<SdkBundle> {
    let outer = archive::read_entries(reader)
        .context("failed to read SDK bundle archive")
        .map_err(SdkForgeError::Io)?;
    validation::validate_sdk_bundle_files(outer.keys().map(String::as_str))?;

    let modules = archive::read_entries(Cursor::new(&outer[paths::MODULES_FILE]))
        .with_context(|| format!("failed to read {}", paths::MODULES_FILE))
        .map_err(SdkForgeError::Io)?;

    let config_bytes = modules
        .get(paths::MODULES_CONFIG_FILE)
        .ok_or_else(|| ValidationError::MissingRequiredFile {
            file: paths::MODULES_CONFIG_FILE.to_string(),
        })?;
    let modules_config: SdkModulesConfig =
        serde_json::from_slice(config_bytes).map_err(|e| ValidationError::MalformedFile {
            file: paths::MODULES_CONFIG_FILE.to_string(),
            reason: e.to_string(),
        })?;

    let module = read_single_module(&modules)?;
    let bundle_metadata = read_bundle_metadata(&outer);
    debug!(
        module = %module.name,
        entries = module.entries.len(),
        metadata_files = bundle_metadata.len(),
        "parsed SDK bundle"
    );

    Ok(SdkBundle::new(
        module,
        modules_config,
        bundle_metadata,
        version_code,
    )?)
}

fn read_single_module(modules: &ArchiveEntries) -> Result<BundleModule, ValidationError> {
    let names: BTreeSet<&str> = modules
        .keys()
        .filter_map(|path| path.split_once('/').map(|(module, _)| module))
        .collect();
    let name = match names.iter().next() {
        Some(name) if names.len() == 1 => *name,
        _ => return Err(ValidationError::ModuleCount { count: names.len() }),
    };

    let prefix = format!("{name}/");
    let manifest_path = format!("{prefix}{}", paths::MODULE_MANIFEST_FILE);
    let manifest_bytes =
        modules
            .get(&manifest_path)
            .ok_or_else(|| ValidationError::MissingRequiredFile {
                file: manifest_path.clone(),
            })?;
    let manifest =
        AndroidManifest::from_json(manifest_bytes).map_err(|e| ValidationError::MalformedFile {
            file: manifest_path.clone(),
            reason: e.to_string(),
        })?;

    let mut module = BundleModule::new(name, manifest);
    for (path, content) in modules {
        if *path == manifest_path {
            continue;
        }
        if let Some(relative) = path.strip_prefix(&prefix) {
            module = module.with_entry(ModuleEntry::new(relative, content.clone()));
        }
    }
    Ok(module)
}

fn read_bundle_metadata(outer: &ArchiveEntries) -> BundleMetadata {
    outer
        .iter()
        .filter_map(|(path, content)| {
            path.strip_prefix(paths::METADATA_PREFIX)
                .map(|key| (key.to_string(), content.clone()))
        })
        .collect()
}

/// Writes [`SdkBundle`]s in the `.asb` layout.
pub struct SdkBundleSerializer;

impl SdkBundleSerializer {
    /// Serialize to bytes. Output is deterministic.
    pub fn to_bytes(bundle: &SdkBundle) -> anyhow::Result<Vec<u8>> {
        let module = bundle.module();
        let config_json = serde_json::to_vec_pretty(bundle.modules_config())?;
        let manifest_json = module.manifest.to_json()?;

        let mut modules: Vec<(String, &[u8])> = vec![
            (paths::MODULES_CONFIG_FILE.to_string(), config_json.as_slice()),
            (
                format!("{}/{}", module.name, paths::MODULE_MANIFEST_FILE),
                manifest_json.as_slice(),
            ),
        ];
        for entry in &module.entries {
            modules.push((format!("{}/{}", module.name, entry.path), entry.content.as_slice()));
        }
        let modules_resm = archive::pack(modules.iter().map(|(p, d)| (p.as_str(), *d)))
            .context("failed to pack modules.resm")?;

        let mut outer: Vec<(String, &[u8])> =
            vec![(paths::MODULES_FILE.to_string(), modules_resm.as_slice())];
        for (key, content) in bundle.bundle_metadata() {
            outer.push((format!("{}{key}", paths::METADATA_PREFIX), content.as_slice()));
        }
        archive::pack(outer.iter().map(|(p, d)| (p.as_str(), *d)))
    }

    /// Write to `path` atomically.
    pub fn write_to_disk(bundle: &SdkBundle, path: &Path) -> anyhow::Result<()> {
        let bytes = Self::to_bytes(bundle)?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(&bytes)?;
        tmp.persist(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote SDK bundle");
        Ok(())
    }
}
