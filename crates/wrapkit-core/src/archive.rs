//! In-memory file trees and the codec that moves them in and out of zip archives.
//!
//! Paths are always `/`-separated. `.` and empty segments are dropped on the
//! way in, so `./css//site.css` and `css/site.css` name the same entry.
//! Directory markers are stored without the trailing slash the zip format
//! uses for them.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Upper bound on the decompressed size of one uploaded archive.
pub const MAX_UNPACKED_BYTES: u64 = 256 * 1024 * 1024;
// Header sizes are attacker-controlled; never preallocate more than this.
const MAX_PREALLOC_BYTES: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("invalid archive: {0}")]
    Invalid(String),
    #[error("failed to read archive entry `{path}`: {reason}")]
    ReadEntry { path: String, reason: String },
    #[error("failed to write archive entry `{path}`: {reason}")]
    WriteEntry { path: String, reason: String },
    #[error("no entry at `{0}`")]
    NotFound(String),
    #[error("`{0}` is a directory")]
    IsDirectory(String),
    #[error("archive unpacks to more than {limit} bytes")]
    TooLarge { limit: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Directory,
    File(Vec<u8>),
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileTree {
    entries: BTreeMap<String, Entry>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in path order, directory markers included.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    /// Non-directory entries in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().filter_map(|(path, entry)| match entry {
            Entry::File(bytes) => Some((path.as_str(), bytes.as_slice())),
            Entry::Directory => None,
        })
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(&normalize(path))
    }

    pub fn read_bytes(&self, path: &str) -> Result<&[u8], ArchiveError> {
        match self.get(path) {
            Some(Entry::File(bytes)) => Ok(bytes),
            Some(Entry::Directory) => Err(ArchiveError::IsDirectory(path.to_string())),
            None => Err(ArchiveError::NotFound(path.to_string())),
        }
    }

    /// Lossy UTF-8 decode; uploaded markup is not guaranteed to be valid UTF-8.
    pub fn read_text(&self, path: &str) -> Result<String, ArchiveError> {
        self.read_bytes(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Writes a file, creating directory markers for every missing ancestor.
    pub fn write(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        let path = normalize(path);
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.create_dir_all(parent);
        }
        self.entries.insert(path, Entry::File(content.into()));
    }

    pub fn create_dir_all(&mut self, path: &str) {
        let path = normalize(path);
        if path.is_empty() || path == "/" {
            return;
        }
        for (i, _) in path.match_indices('/') {
            if i > 0 {
                self.entries
                    .entry(path[..i].to_string())
                    .or_insert(Entry::Directory);
            }
        }
        self.entries.entry(path).or_insert(Entry::Directory);
    }

    /// Copies every entry of `other` under `prefix`.
    pub fn graft(&mut self, prefix: &str, other: FileTree) {
        let prefix = normalize(prefix);
        self.create_dir_all(&prefix);
        for (path, entry) in other.entries {
            let full = if prefix.is_empty() {
                path
            } else {
                format!("{prefix}/{path}")
            };
            match entry {
                Entry::File(bytes) => self.write(&full, bytes),
                Entry::Directory => self.create_dir_all(&full),
            }
        }
    }
}

/// Drops `.` and empty segments. A leading `/` and any `..` are kept so
/// callers can still see and reject them.
fn normalize(path: &str) -> String {
    let joined = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Read/write of whole archives. Injected into ingestion and assembly so the
/// container format stays swappable.
pub trait ArchiveCodec {
    fn read_archive(&self, bytes: &[u8]) -> Result<FileTree, ArchiveError>;
    fn write_archive(&self, tree: &FileTree) -> Result<Vec<u8>, ArchiveError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ZipCodec;

impl ArchiveCodec for ZipCodec {
    fn read_archive(&self, bytes: &[u8]) -> Result<FileTree, ArchiveError> {
        read_tree(bytes, MAX_UNPACKED_BYTES)
    }

    fn write_archive(&self, tree: &FileTree) -> Result<Vec<u8>, ArchiveError> {
        // Fixed timestamp keeps output byte-identical across runs.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, entry) in tree.entries() {
            let write_err = |reason: String| ArchiveError::WriteEntry {
                path: path.to_string(),
                reason,
            };
            match entry {
                Entry::Directory => writer
                    .add_directory(format!("{path}/"), options)
                    .map_err(|e| write_err(e.to_string()))?,
                Entry::File(bytes) => {
                    writer
                        .start_file(path, options)
                        .map_err(|e| write_err(e.to_string()))?;
                    writer
                        .write_all(bytes)
                        .map_err(|e| write_err(e.to_string()))?;
                }
            }
        }
        let cursor = writer
            .finish()
            .map_err(|e| ArchiveError::Invalid(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// Decodes every entry, failing once the running total passes `limit`. The
/// sizes in entry headers are only used as a bounded allocation hint.
fn read_tree(bytes: &[u8], limit: u64) -> Result<FileTree, ArchiveError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ArchiveError::Invalid(e.to_string()))?;

    let mut tree = FileTree::new();
    let mut remaining = limit;
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| ArchiveError::Invalid(e.to_string()))?;
        let name = file.name().to_string();
        if file.is_dir() {
            tree.create_dir_all(&name);
            continue;
        }
        let hint = file.size().min(MAX_PREALLOC_BYTES).min(remaining);
        let mut content = Vec::with_capacity(hint as usize);
        file.take(remaining + 1)
            .read_to_end(&mut content)
            .map_err(|e| ArchiveError::ReadEntry {
                path: name.clone(),
                reason: e.to_string(),
            })?;
        let read = content.len() as u64;
        if read > remaining {
            return Err(ArchiveError::TooLarge { limit });
        }
        remaining -= read;
        tree.write(&name, content);
    }
    tracing::debug!(entries = tree.len(), unpacked = limit - remaining, "decoded archive");
    Ok(tree)
}
