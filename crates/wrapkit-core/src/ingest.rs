//! Normalizes an upload (single markup file or zipped site) into a [`ProjectSource`].

use crate::archive::{ArchiveCodec, ArchiveError, FileTree};

pub const ENTRY_POINT: &str = "index.html";
pub const MISSING_ENTRY_POINT_PLACEHOLDER: &str =
    "<!-- No index.html found in ZIP, default permissions will be applied -->";
const DEFAULT_MARKUP_APP_NAME: &str = "MyWebApp";
const DEFAULT_ARCHIVE_APP_NAME: &str = "MyZipApp";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unsupported file type `{file_name}` (upload a .html, .htm or .zip file)")]
    UnsupportedFileType { file_name: String },
    #[error("could not read archive `{file_name}`: {source}")]
    Archive {
        file_name: String,
        #[source]
        source: ArchiveError,
    },
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Markup,
    Archive,
}

impl UploadKind {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(Self::Markup),
            "zip" => Some(Self::Archive),
            _ => None,
        }
    }
}

/// Markup used for analysis plus, in archive mode, the tree to package.
///
/// When `asset_tree` is present it is authoritative for packaging and
/// `markup_text` only feeds analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSource {
    markup_text: String,
    asset_tree: Option<FileTree>,
}

impl ProjectSource {
    /// Pasted or single-file mode. Never carries an asset tree.
    pub fn from_markup(markup_text: impl Into<String>) -> Self {
        Self {
            markup_text: markup_text.into(),
            asset_tree: None,
        }
    }

    pub fn from_archive(markup_text: impl Into<String>, asset_tree: FileTree) -> Self {
        Self {
            markup_text: markup_text.into(),
            asset_tree: Some(asset_tree),
        }
    }

    pub fn markup_text(&self) -> &str {
        &self.markup_text
    }

    pub fn asset_tree(&self) -> Option<&FileTree> {
        self.asset_tree.as_ref()
    }

    pub fn is_archive(&self) -> bool {
        self.asset_tree.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// The upload itself was the markup file.
    Upload,
    /// Path of the archive entry used for analysis.
    Archive(String),
    /// Archive without an `index.html`; analysis runs on a placeholder.
    Missing,
}

#[derive(Debug, Clone)]
pub struct Ingested {
    pub source: ProjectSource,
    pub suggested_app_name: String,
    pub entry_point: EntryPoint,
}

impl Ingested {
    pub fn missing_entry_point(&self) -> bool {
        self.entry_point == EntryPoint::Missing
    }
}

pub struct Ingestor<C> {
    codec: C,
}

impl<C: ArchiveCodec> Ingestor<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn ingest(&self, upload: &Upload) -> Result<Ingested, IngestError> {
        let kind = UploadKind::from_file_name(&upload.file_name).ok_or_else(|| {
            IngestError::UnsupportedFileType {
                file_name: upload.file_name.clone(),
            }
        })?;

        match kind {
            UploadKind::Markup => Ok(Ingested {
                source: ProjectSource::from_markup(String::from_utf8_lossy(&upload.bytes)),
                suggested_app_name: app_name_from_file_name(
                    &upload.file_name,
                    DEFAULT_MARKUP_APP_NAME,
                ),
                entry_point: EntryPoint::Upload,
            }),
            UploadKind::Archive => self.ingest_archive(upload),
        }
    }

    fn ingest_archive(&self, upload: &Upload) -> Result<Ingested, IngestError> {
        let tree = self
            .codec
            .read_archive(&upload.bytes)
            .map_err(|source| IngestError::Archive {
                file_name: upload.file_name.clone(),
                source,
            })?;

        let (markup_text, entry_point) = match find_entry_point(&tree) {
            Some(path) => {
                let text = tree.read_text(&path).map_err(|source| IngestError::Archive {
                    file_name: upload.file_name.clone(),
                    source,
                })?;
                tracing::info!(entry = %path, "found entry point in archive");
                (text, EntryPoint::Archive(path))
            }
            None => {
                tracing::warn!(
                    file = %upload.file_name,
                    "no index.html in archive; analysis will use default permissions"
                );
                (
                    MISSING_ENTRY_POINT_PLACEHOLDER.to_string(),
                    EntryPoint::Missing,
                )
            }
        };

        Ok(Ingested {
            source: ProjectSource::from_archive(markup_text, tree),
            suggested_app_name: app_name_from_file_name(
                &upload.file_name,
                DEFAULT_ARCHIVE_APP_NAME,
            ),
            entry_point,
        })
    }
}

/// Shallowest file named exactly `index.html`; ties go to the first path in order.
pub fn find_entry_point(tree: &FileTree) -> Option<String> {
    tree.files()
        .map(|(path, _)| path)
        .filter(|path| path.rsplit('/').next() == Some(ENTRY_POINT))
        .min_by_key(|path| (path.matches('/').count(), *path))
        .map(str::to_string)
}

/// `my-site.v2.zip` → `mysitev2`.
pub fn app_name_from_file_name(file_name: &str, fallback: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base);
    let name: String = stem.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}
