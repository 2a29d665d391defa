//! Deterministic gzip tar archives.
//!
//! Every archive sdkforge writes (SDK bundles, their nested `modules.resm`,
//! and the standalone artifacts) goes through [`create_deterministic_tar`]
//! so identical inputs give byte-identical outputs.

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Component;
use tar::{Builder, Header};

/// Upper bound on decompressed bytes read from any single archive.
pub const MAX_DECODED_BYTES: u64 = 1024 * 1024 * 1024;

/// Archive contents keyed by entry path, in path order.
pub type ArchiveEntries = BTreeMap<String, Vec<u8>>;

pub fn create_deterministic_tar<W: Write>(writer: W) -> Builder<GzEncoder<W>> {
    let encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(255)
        .write(writer, Compression::best());

    let mut tar = Builder::new(encoder);
    tar.mode(tar::HeaderMode::Deterministic);
    tar
}

pub fn write_entry<T: Write>(tar: &mut Builder<T>, path: &str, data: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_path(path)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_username("sdkforge")?;
    header.set_groupname("sdkforge")?;
    header.set_cksum();

    tar.append(&header, data)
        .with_context(|| format!("failed to append '{path}'"))?;
    Ok(())
}

/// Pack `entries` into an in-memory archive, in iteration order.
pub fn pack<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Result<Vec<u8>> {
    let mut tar = create_deterministic_tar(Vec::new());
    for (path, data) in entries {
        write_entry(&mut tar, path, data)?;
    }
    let encoder = tar.into_inner().context("failed to finish tar stream")?;
    encoder.finish().context("failed to finish gzip stream")
}

/// Caps the bytes read from `inner` and fails once the cap is reached,
/// instead of reporting a clean end of stream.
struct LimitReader<R> {
    inner: R,
    limit: u64,
    read: u64,
}

impl<R: Read> LimitReader<R> {
    fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            limit,
            read: 0,
        }
    }
}

impl<R: Read> Read for LimitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.read >= self.limit {
            return Err(std::io::Error::other(format!(
                "archive exceeds decoded size limit of {} bytes",
                self.limit
            )));
        }
        let max_to_read = (self.limit - self.read).min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max_to_read])?;
        self.read += n as u64;
        Ok(n)
    }
}

/// Read every regular file of a gzip tar archive into memory.
///
/// Rejects absolute or parent-relative paths and duplicate entries.
pub fn read_entries<R: Read>(reader: R) -> Result<ArchiveEntries> {
    read_entries_with_limit(reader, MAX_DECODED_BYTES)
}

/// [`read_entries`] with an explicit cap on decompressed bytes. Hitting the
/// cap is an error.
pub fn read_entries_with_limit<R: Read>(reader: R, limit: u64) -> Result<ArchiveEntries> {
    let decoder = LimitReader::new(GzDecoder::new(reader), limit);
    let mut archive = tar::Archive::new(decoder);
    let mut entries = ArchiveEntries::new();

    for entry in archive.entries().context("failed to read archive")? {
        let mut entry = entry.context("corrupt archive entry")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        if !path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            bail!("archive entry has unsafe path '{}'", path.display());
        }
        let path = path
            .to_str()
            .with_context(|| format!("archive entry path is not UTF-8: {}", path.display()))?
            .to_string();

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .with_context(|| format!("failed to read '{path}'"))?;
        if entries.insert(path.clone(), content).is_some() {
            bail!("duplicate archive entry '{path}'");
        }
    }
    Ok(entries)
}
