use std::path::{Path, PathBuf};

use wrapkit_core::icon::is_png;
use wrapkit_core::{GeminiClient, IconAsset, IconClient, Inference, ProjectConfig};

use crate::cli::{human_log, json_print, CliError, IconArgs, JsonOk};
use crate::config::Config;
use crate::input::STDIN_MARKER;

pub async fn icon(
    config: &Config,
    json: bool,
    verbose: bool,
    args: IconArgs,
) -> Result<(), CliError> {
    let project = ProjectConfig::default()
        .with_app_name(&args.name)
        .with_description(&args.description);
    if project.description().is_empty() {
        return Err(CliError::user("describe the app before generating an icon"));
    }
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("{}_icon.png", project.folder_name())));

    let client = GeminiClient::new(config.gemini.clone())
        .map_err(|e| CliError::operational(format!("build gemini client: {e}")))?;
    human_log(verbose, format!("generating icon for {}", project.app_name()));
    let icon = IconClient::new(client)
        .generate(project.app_name(), project.description())
        .await;

    let written = match icon.value().embedded_image() {
        Some(bytes) => {
            write_new_file(&out, bytes)?;
            Some(out)
        }
        None => None,
    };

    if json {
        json_print(&JsonOk {
            ok: true,
            data: serde_json::json!({
                "path": written,
                "reference": reference_summary(icon.value()),
                "defaulted": icon.is_defaulted(),
                "cause": icon.cause().map(|c| c.to_string()),
            }),
        });
    } else {
        print_icon(&icon);
        if let Some(path) = &written {
            eprintln!("  wrote {}", path.to_string_lossy());
        }
    }
    Ok(())
}

pub fn print_icon(icon: &Inference<IconAsset>) {
    match icon.cause() {
        Some(cause) => eprintln!("ok: icon defaulted ({cause})"),
        None => eprintln!("ok: icon generated"),
    }
    eprintln!("  icon: {}", reference_summary(icon.value()));
}

/// Embedded images are summarized; the full data URL is only useful to a browser.
pub fn reference_summary(icon: &IconAsset) -> String {
    match icon {
        IconAsset::Embedded { bytes, mime_type } => format!("{mime_type}, {} bytes", bytes.len()),
        IconAsset::Placeholder { .. } => icon.reference(),
    }
}

/// Loads a local PNG for `build --icon`. Launcher icons are packaged as
/// `ic_launcher.png`, so other formats are refused up front.
pub fn load_icon_file(path: &Path) -> Result<IconAsset, CliError> {
    if path.as_os_str() == STDIN_MARKER {
        return Err(CliError::user("--icon must name an image file"));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::user(format!("failed to read {}: {e}", path.display())))?;
    if !is_png(&bytes) {
        return Err(CliError::user(format!(
            "unsupported icon file: {} (expected a PNG image)",
            path.display()
        )));
    }
    Ok(IconAsset::Embedded {
        bytes,
        mime_type: "image/png".to_string(),
    })
}

/// Writes through a temp file in the destination directory and refuses to
/// replace an existing file.
pub fn write_new_file(dest: &Path, bytes: &[u8]) -> Result<(), CliError> {
    use std::io::Write;

    if dest.exists() {
        return Err(CliError::user(format!(
            "refusing to overwrite existing file: {}",
            dest.display()
        )));
    }
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(CliError::user(format!(
            "output directory does not exist: {}",
            dir.display()
        )));
    }
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| CliError::operational(format!("failed to create temp file: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| CliError::operational(format!("failed to write {}: {e}", dest.display())))?;
    tmp.persist_noclobber(dest).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            CliError::user(format!(
                "refusing to overwrite existing file: {}",
                dest.display()
            ))
        } else {
            CliError::operational(format!("failed to write {}: {}", dest.display(), e.error))
        }
    })?;
    Ok(())
}
