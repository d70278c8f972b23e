//! ZIP compression plus ZIP/RAR extraction over in-memory byte buffers.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use zip::CompressionMethod;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};

use crate::error::FsError;
use crate::types::{ArchiveEntry, ArchiveKind};

use super::{Result, util};

/// Pack `entries` into a deflated zip. Repeated paths are written once.
pub fn compress(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut seen: HashSet<&str> = HashSet::new();

    for entry in entries {
        if !seen.insert(entry.path.as_str()) {
            continue;
        }

        if entry.is_directory_marker() {
            writer
                .add_directory(entry.path.trim_end_matches('/'), options)
                .map_err(|err| FsError::store(&entry.path, err.to_string()))?;
        } else {
            writer
                .start_file(entry.path.as_str(), options)
                .map_err(|err| FsError::store(&entry.path, err.to_string()))?;
            writer.write_all(&entry.data)?;
        }
    }

    let cursor = writer.finish().map_err(|err| FsError::store("<zip>", err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Unpack an archive, dispatching on `kind`. Corrupt input fails as a whole.
pub fn decompress(bytes: &[u8], kind: ArchiveKind) -> Result<Vec<ArchiveEntry>> {
    match kind {
        ArchiveKind::Zip => unzip(bytes),
        ArchiveKind::Rar => unrar(bytes),
    }
}

fn unzip(bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(corrupt)?;
    let mut entries = Vec::with_capacity(archive.len());

    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx).map_err(corrupt)?;
        let Some(path) = util::sanitize_archive_path(file.name()) else {
            tracing::warn!(name = file.name(), "skipping archive member with unsafe path");
            continue;
        };

        if file.is_dir() {
            entries.push(ArchiveEntry::directory(path));
            continue;
        }

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data).map_err(corrupt)?;
        entries.push(ArchiveEntry::file(path, data));
    }

    Ok(entries)
}

#[cfg(feature = "rar")]
fn unrar(bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    // The decoder only reads from disk, so stage the bytes in a temp file.
    let mut staged = tempfile::Builder::new().suffix(".rar").tempfile()?;
    staged.write_all(bytes)?;
    staged.flush()?;

    let mut archive = unrar::Archive::new(staged.path()).open_for_processing().map_err(corrupt)?;
    let mut entries = Vec::new();

    while let Some(header) = archive.read_header().map_err(corrupt)? {
        let (is_dir, name) = {
            let entry = header.entry();
            (entry.is_directory(), entry.filename.to_string_lossy().into_owned())
        };
        let path = util::sanitize_archive_path(&name);

        archive = if is_dir {
            if let Some(path) = path {
                entries.push(ArchiveEntry::directory(path));
            }
            header.skip().map_err(corrupt)?
        } else {
            let (data, rest) = header.read().map_err(corrupt)?;
            match path {
                Some(path) => entries.push(ArchiveEntry::file(path, data)),
                None => tracing::warn!(%name, "skipping archive member with unsafe path"),
            }
            rest
        };
    }

    Ok(entries)
}

#[cfg(not(feature = "rar"))]
fn unrar(_bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    Err(FsError::UnsupportedArchive("rar".to_string()))
}

fn corrupt(err: impl std::fmt::Display) -> FsError {
    FsError::CorruptArchive(err.to_string())
}
