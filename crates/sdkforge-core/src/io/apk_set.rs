//! Artifact sets: serialization of the built splits plus their TOC, either
//! as one archive file or as a directory tree.
//!
//! Both layouts hold the same files:
//!
//! ```text
//! toc.json
//! standalones/standalone.apk
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::archive::{self, ArchiveEntries};
use super::signing::{self, SigningConfig, SIGNATURE_FILE};
use super::toc::{BuildSdkApksResult, TOC_FILE};
use crate::error::SdkForgeError;
use crate::model::{AndroidManifest, ModuleSplit};

pub const STANDALONE_APK_PATH: &str = "standalones/standalone.apk";

/// Manifest location inside an artifact.
pub const APK_MANIFEST_FILE: &str = "AndroidManifest.json";

/// How the artifact set is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum OutputFormat {
    /// Single archive file.
    #[default]
    ApkSet,
    /// Directory tree.
    Directory,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApkSet => "apk_set",
            Self::Directory => "directory",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = SdkForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apk_set" => Ok(Self::ApkSet),
            "directory" => Ok(Self::Directory),
            other => Err(SdkForgeError::invalid_command(format!(
                "Unsupported output format '{other}'."
            ))),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = SdkForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An artifact to be written at `path` inside the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSplit {
    pub path: String,
    pub split: ModuleSplit,
}

/// Fully mutated splits plus their TOC; everything a writer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub toc: BuildSdkApksResult,
    pub apks: Vec<NamedSplit>,
}

/// Serialize one split into an artifact, signed when `signing` is set.
pub fn serialize_split(split: &ModuleSplit, signing: Option<&SigningConfig>) -> Result<Vec<u8>> {
    let mut entries = ArchiveEntries::new();
    entries.insert(APK_MANIFEST_FILE.to_string(), split.manifest.to_json()?);
    for entry in &split.entries {
        if entries
            .insert(entry.path.clone(), entry.content.clone())
            .is_some()
        {
            bail!("split '{}' has duplicate entry '{}'", split.module_name, entry.path);
        }
    }
    if entries.contains_key(SIGNATURE_FILE) {
        bail!("split '{}' already contains {SIGNATURE_FILE}", split.module_name);
    }

    if let Some(config) = signing {
        let signature = signing::sign_entries(&entries, config).context(signing::SigningFailed)?;
        entries.insert(SIGNATURE_FILE.to_string(), serde_json::to_vec_pretty(&signature)?);
    }

    archive::pack(entries.iter().map(|(p, c)| (p.as_str(), c.as_slice())))
}

/// Writes an [`ArtifactSet`] in one [`OutputFormat`].
#[derive(Debug, Clone)]
pub struct ApkSetWriter {
    format: OutputFormat,
    signing: Option<SigningConfig>,
    overwrite: bool,
}

impl ApkSetWriter {
    pub fn new(format: OutputFormat, signing: Option<SigningConfig>, overwrite: bool) -> Self {
        Self {
            format,
            signing,
            overwrite,
        }
    }

    /// Serialize every artifact, then write the set. Nothing is written if
    /// any artifact fails to serialize.
    pub fn write(&self, set: &ArtifactSet, output: &Path) -> Result<()> {
        if self.signing.is_none() {
            warn!("no signing key configured, artifacts will be unsigned");
        }

        let mut files: Vec<(String, Vec<u8>)> = Vec::with_capacity(set.apks.len() + 1);
        files.push((TOC_FILE.to_string(), set.toc.to_json()?));
        for apk in &set.apks {
            let bytes = serialize_split(&apk.split, self.signing.as_ref())
                .with_context(|| format!("failed to serialize {}", apk.path))?;
            debug!(path = %apk.path, bytes = bytes.len(), "serialized artifact");
            files.push((apk.path.clone(), bytes));
        }

        match self.format {
            OutputFormat::ApkSet => self.write_archive(&files, output)?,
            OutputFormat::Directory => self.write_directory(&files, output)?,
        }
        info!(
            format = %self.format,
            output = %output.display(),
            artifacts = set.apks.len(),
            signed = self.signing.is_some(),
            "wrote artifact set"
        );
        Ok(())
    }

    fn write_archive(&self, files: &[(String, Vec<u8>)], output: &Path) -> Result<()> {
        if output.exists() && !self.overwrite {
            bail!("File '{}' already exists.", output.display());
        }
        let bytes = archive::pack(files.iter().map(|(p, c)| (p.as_str(), c.as_slice())))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(output))
            .context("failed to create temp file for artifact set")?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        Ok(())
    }

    /// Assembled in a sibling temp directory, then renamed into place. The
    /// staging directory is removed on every path out of this function.
    fn write_directory(&self, files: &[(String, Vec<u8>)], output: &Path) -> Result<()> {
        let existing = output.exists();
        if existing && !self.overwrite && !is_empty_dir(output)? {
            bail!(
                "Output directory '{}' is not empty; use overwrite to replace it.",
                output.display()
            );
        }

        let staging = tempfile::Builder::new()
            .prefix(".sdkforge-")
            .tempdir_in(parent_dir(output))
            .context("failed to create staging directory")?;
        for (path, content) in files {
            let target = staging.path().join(path);
            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            fs::write(&target, content)
                .with_context(|| format!("failed to write {}", target.display()))?;
        }

        swap_into_place(staging.path(), output)
    }
}

/// Move `staged` to `output`. An existing `output` is set aside and only
/// dropped once `staged` is in place; if the move fails it is restored.
fn swap_into_place(staged: &Path, output: &Path) -> Result<()> {
    let move_staged = || {
        fs::rename(staged, output).with_context(|| {
            format!("failed to move {} to {}", staged.display(), output.display())
        })
    };
    if !output.exists() {
        return move_staged();
    }

    let backup = tempfile::Builder::new()
        .prefix(".sdkforge-old-")
        .tempdir_in(parent_dir(output))
        .context("failed to create backup directory")?;
    let previous = backup.path().join("previous");
    fs::rename(output, &previous)
        .with_context(|| format!("failed to set aside {}", output.display()))?;

    if let Err(err) = move_staged() {
        fs::rename(&previous, output)
            .with_context(|| format!("failed to restore {}", output.display()))?;
        return Err(err);
    }
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    Ok(fs::read_dir(path)
        .with_context(|| format!("failed to list {}", path.display()))?
        .next()
        .is_none())
}

/// A written artifact set read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSetContents {
    pub toc: BuildSdkApksResult,
    /// Artifact bytes keyed by their path in the set.
    pub apks: BTreeMap<String, Vec<u8>>,
}

impl ArtifactSetContents {
    /// Entries of the artifact at `path`.
    pub fn apk_entries(&self, path: &str) -> Result<ArchiveEntries> {
        let bytes = self
            .apks
            .get(path)
            .with_context(|| format!("artifact set has no '{path}'"))?;
        archive::read_entries(Cursor::new(bytes))
    }

    pub fn apk_manifest(&self, path: &str) -> Result<AndroidManifest> {
        let entries = self.apk_entries(path)?;
        let bytes = entries
            .get(APK_MANIFEST_FILE)
            .with_context(|| format!("'{path}' has no {APK_MANIFEST_FILE}"))?;
        AndroidManifest::from_json(bytes).with_context(|| format!("invalid manifest in '{path}'"))
    }
}

/// Read an artifact set written in either [`OutputFormat`].
pub fn read_artifact_set(path: &Path) -> Result<ArtifactSetContents> {
    let mut files = if path.is_dir() {
        read_directory(path, path)?
    } else {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        archive::read_entries(BufReader::new(file))
            .with_context(|| format!("failed to read artifact set {}", path.display()))?
    };

    let toc_bytes = files
        .remove(TOC_FILE)
        .with_context(|| format!("artifact set {} has no {TOC_FILE}", path.display()))?;
    let toc = BuildSdkApksResult::from_json(&toc_bytes).context("invalid toc.json")?;

    let mut apks = BTreeMap::new();
    for description in toc.apk_descriptions() {
        let bytes = files.remove(&description.path).with_context(|| {
            format!("artifact '{}' listed in {TOC_FILE} is missing", description.path)
        })?;
        apks.insert(description.path.clone(), bytes);
    }
    Ok(ArtifactSetContents { toc, apks })
}

fn read_directory(root: &Path, dir: &Path) -> Result<ArchiveEntries> {
    let mut files = ArchiveEntries::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(read_directory(root, &path)?);
            continue;
        }
        let relative = path
            .strip_prefix(root)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        files.insert(relative, content);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleEntry, SdkBundle, SplitType, Targeting};
    use crate::model::{BundleMetadata, BundleModule, SdkModulesConfig};
    use ed25519_dalek::SigningKey;

    fn artifact_set() -> ArtifactSet {
        let bundle = SdkBundle::new(
            BundleModule::new("base", AndroidManifest::new("com.ads.foo")),
            SdkModulesConfig::new("1.9.1", "com.ads.foo", 15, 0, 5),
            BundleMetadata::new(),
            1253,
        )
        .unwrap();
        let split = ModuleSplit {
            module_name: "base".into(),
            split_type: SplitType::Standalone,
            is_master_split: true,
            apk_targeting: Targeting::default(),
            variant_targeting: Targeting::default(),
            manifest: AndroidManifest::new("com.ads.foo_150000"),
            entries: vec![ModuleEntry::new("dex/classes.dex", b"dex".to_vec())],
        };
        ArtifactSet {
            toc: BuildSdkApksResult::new(&bundle, [(STANDALONE_APK_PATH, &split)]),
            apks: vec![NamedSplit {
                path: STANDALONE_APK_PATH.into(),
                split,
            }],
        }
    }

    fn signing() -> SigningConfig {
        SigningConfig::new(SigningKey::from_bytes(&[9; 32]))
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("apk_set".parse::<OutputFormat>().unwrap(), OutputFormat::ApkSet);
        assert_eq!("directory".parse::<OutputFormat>().unwrap(), OutputFormat::Directory);
        let err = "zip".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported output format 'zip'.");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn archive_roundtrip_is_signed() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.apks");
        let set = artifact_set();
        ApkSetWriter::new(OutputFormat::ApkSet, Some(signing()), false)
            .write(&set, &output)
            .unwrap();

        let contents = read_artifact_set(&output).unwrap();
        assert_eq!(contents.toc, set.toc);
        let verified = signing::verify_artifact(
            &contents.apks[STANDALONE_APK_PATH],
            Some(&signing().verifying_key()),
        )
        .unwrap();
        assert_eq!(verified.entry_count, 2);
        assert_eq!(
            contents.apk_manifest(STANDALONE_APK_PATH).unwrap().package_name(),
            Some("com.ads.foo_150000")
        );
    }

    #[test]
    fn directory_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        ApkSetWriter::new(OutputFormat::Directory, None, false)
            .write(&artifact_set(), &output)
            .unwrap();

        assert!(output.join("toc.json").is_file());
        assert!(output.join("standalones/standalone.apk").is_file());
        let contents = read_artifact_set(&output).unwrap();
        assert_eq!(contents.apks.len(), 1);
        let entries = contents.apk_entries(STANDALONE_APK_PATH).unwrap();
        assert!(!entries.contains_key(SIGNATURE_FILE));
    }

    #[test]
    fn existing_archive_needs_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.apks");
        fs::write(&output, b"old").unwrap();

        let err = ApkSetWriter::new(OutputFormat::ApkSet, None, false)
            .write(&artifact_set(), &output)
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read(&output).unwrap(), b"old");

        ApkSetWriter::new(OutputFormat::ApkSet, None, true)
            .write(&artifact_set(), &output)
            .unwrap();
        read_artifact_set(&output).unwrap();
    }

    #[test]
    fn non_empty_directory_needs_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        fs::create_dir(&output).unwrap();
        fs::write(output.join("stale.txt"), b"x").unwrap();

        let err = ApkSetWriter::new(OutputFormat::Directory, None, false)
            .write(&artifact_set(), &output)
            .unwrap_err();
        assert!(err.to_string().contains("is not empty"));

        ApkSetWriter::new(OutputFormat::Directory, None, true)
            .write(&artifact_set(), &output)
            .unwrap();
        assert!(!output.join("stale.txt").exists());
        assert!(output.join("toc.json").is_file());
    }

    #[test]
    fn failed_swap_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        fs::create_dir(&output).unwrap();
        fs::write(output.join("old.txt"), b"old").unwrap();

        assert!(swap_into_place(&dir.path().join("missing-staged"), &output).is_err());
        assert_eq!(fs::read(output.join("old.txt")).unwrap(), b"old");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("out")]);
    }

    #[test]
    fn swap_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        fs::create_dir(&output).unwrap();
        fs::write(output.join("old.txt"), b"old").unwrap();
        let staged = dir.path().join("staged");
        fs::create_dir(&staged).unwrap();
        fs::write(staged.join("new.txt"), b"new").unwrap();

        swap_into_place(&staged, &output).unwrap();
        assert!(!output.join("old.txt").exists());
        assert_eq!(fs::read(output.join("new.txt")).unwrap(), b"new");
        assert!(!staged.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn duplicate_split_entries_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.apks");
        let mut set = artifact_set();
        set.apks[0]
            .split
            .entries
            .push(ModuleEntry::new("dex/classes.dex", b"again".to_vec()));

        assert!(ApkSetWriter::new(OutputFormat::ApkSet, None, false)
            .write(&set, &output)
            .is_err());
        assert!(!output.exists());
    }
}
