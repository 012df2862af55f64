//! Builds the Android project tree and serializes it into one archive.

use crate::archive::{ArchiveCodec, ArchiveError, FileTree};
use crate::icon::IconAsset;
use crate::ingest::{ProjectSource, ENTRY_POINT};
use crate::permissions::PermissionProfile;
use crate::project::ProjectConfig;
use crate::templates;

pub const ARCHIVE_SUFFIX: &str = "_AndroidProject.zip";
pub const ICON_DENSITY: &str = "mipmap-xxhdpi";
pub const WORKFLOW_PATH: &str = ".github/workflows/build_apk.yml";
const ASSET_ERROR_PAGE: &str = "<h1>Error loading assets</h1>";

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("failed to serialize project archive: {0}")]
    Serialize(#[from] ArchiveError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot merge asset `{path}`: {reason}")]
pub struct AssetMergeError {
    pub path: String,
    pub reason: &'static str,
}

#[derive(Debug)]
pub struct AssembledArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Set when the uploaded asset tree could not be merged and a diagnostic
    /// `index.html` was packaged instead.
    pub asset_fallback: Option<AssetMergeError>,
}

pub struct Assembler<C> {
    codec: C,
}

impl<C: ArchiveCodec> Assembler<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn assemble(
        &self,
        config: &ProjectConfig,
        profile: &PermissionProfile,
        source: &ProjectSource,
        icon: Option<&IconAsset>,
    ) -> Result<AssembledArchive, AssemblyError> {
        let (tree, asset_fallback) = build_tree(config, profile, source, icon);
        let bytes = self.codec.write_archive(&tree)?;
        let file_name = archive_file_name(config);
        tracing::info!(
            file = %file_name,
            entries = tree.len(),
            bytes = bytes.len(),
            "assembled project archive"
        );
        Ok(AssembledArchive {
            file_name,
            bytes,
            asset_fallback,
        })
    }
}

pub fn archive_file_name(config: &ProjectConfig) -> String {
    format!("{}{ARCHIVE_SUFFIX}", config.folder_name())
}

/// The full project tree, before serialization.
pub fn build_tree(
    config: &ProjectConfig,
    profile: &PermissionProfile,
    source: &ProjectSource,
    icon: Option<&IconAsset>,
) -> (FileTree, Option<AssetMergeError>) {
    let root = config.folder_name();
    let app = format!("{root}/app");
    let main = format!("{app}/src/main");
    let mut tree = FileTree::new();

    // ── Project skeleton ────────────────────────────────────────────────
    tree.write(
        &format!("{main}/AndroidManifest.xml"),
        templates::render_manifest(config, profile),
    );
    tree.write(
        &format!("{main}/java/{}/MainActivity.java", config.package_path()),
        templates::render_main_activity(config, profile),
    );
    tree.write(
        &format!("{main}/res/layout/activity_main.xml"),
        templates::render_layout(),
    );
    tree.write(
        &format!("{app}/build.gradle"),
        templates::render_build_gradle(config),
    );

    // ── Assets ──────────────────────────────────────────────────────────
    let assets_dir = format!("{main}/assets");
    let asset_fallback = match source.asset_tree() {
        Some(uploaded) => match stage_assets(uploaded) {
            Ok(staged) => {
                tracing::debug!(files = staged.file_count(), "merging uploaded assets");
                tree.graft(&assets_dir, staged);
                None
            }
            Err(e) => {
                tracing::warn!(%e, "asset merge failed; packaging diagnostic index.html");
                tree.write(
                    &format!("{assets_dir}/{ENTRY_POINT}"),
                    diagnostic_page(source.markup_text()),
                );
                Some(e)
            }
        },
        None => {
            tree.write(
                &format!("{assets_dir}/{ENTRY_POINT}"),
                source.markup_text(),
            );
            None
        }
    };

    // ── Icon (single density bucket) ────────────────────────────────────
    if let Some(bytes) = icon.and_then(IconAsset::embedded_image) {
        let mipmap = format!("{main}/res/{ICON_DENSITY}");
        tree.write(&format!("{mipmap}/ic_launcher.png"), bytes);
        tree.write(&format!("{mipmap}/ic_launcher_round.png"), bytes);
    }

    // ── CI ──────────────────────────────────────────────────────────────
    tree.write(
        &format!("{root}/{WORKFLOW_PATH}"),
        templates::render_workflow(config),
    );

    (tree, asset_fallback)
}

/// Copies every file of the upload into a fresh tree, refusing paths that
/// could land outside `assets/`. Nothing is merged unless every entry passes.
fn stage_assets(uploaded: &FileTree) -> Result<FileTree, AssetMergeError> {
    let mut staged = FileTree::new();
    for (path, bytes) in uploaded.files() {
        check_asset_path(path)?;
        staged.write(path, bytes);
    }
    Ok(staged)
}

fn check_asset_path(path: &str) -> Result<(), AssetMergeError> {
    let reject = |reason| {
        Err(AssetMergeError {
            path: path.to_string(),
            reason,
        })
    };
    if path.starts_with('/') {
        return reject("absolute path");
    }
    if path.contains('\\') {
        return reject("backslash in path");
    }
    // `FileTree` has already dropped `.` and empty segments.
    if path.split('/').any(|segment| segment == "..") {
        return reject("parent directory segment");
    }
    Ok(())
}

fn diagnostic_page(markup_text: &str) -> String {
    if markup_text.trim().is_empty() {
        ASSET_ERROR_PAGE.to_string()
    } else {
        markup_text.to_string()
    }
}
