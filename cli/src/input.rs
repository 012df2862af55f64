use std::io::Read;
use std::path::Path;

use wrapkit_core::{Ingested, Session, Upload};

use crate::cli::{human_log, CliError};
use crate::config::GeminiPipeline;

/// `-` means markup pasted on stdin.
pub const STDIN_MARKER: &str = "-";

pub struct Loaded {
    pub session: Session,
    /// `None` for pasted markup.
    pub ingested: Option<Ingested>,
}

pub fn load(
    pipeline: &GeminiPipeline,
    session: Session,
    input: &str,
    verbose: bool,
) -> Result<Loaded, CliError> {
    if input == STDIN_MARKER {
        let mut markup = String::new();
        std::io::stdin()
            .read_to_string(&mut markup)
            .map_err(|e| CliError::user(format!("failed to read markup from stdin: {e}")))?;
        human_log(verbose, format!("read {} bytes of pasted markup", markup.len()));
        return Ok(Loaded {
            session: session.with_pasted_markup(markup),
            ingested: None,
        });
    }

    let path = Path::new(input);
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::user(format!("failed to read {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());
    human_log(verbose, format!("uploading {file_name} ({} bytes)", bytes.len()));

    let (session, ingested) = pipeline
        .ingest(session, &Upload::new(file_name, bytes))
        .map_err(|(_, e)| CliError::from(e))?;
    Ok(Loaded {
        session,
        ingested: Some(ingested),
    })
}

/// Warnings worth surfacing about what was uploaded.
pub fn upload_warnings(loaded: &Loaded) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(ingested) = &loaded.ingested {
        if ingested.missing_entry_point() {
            out.push("archive has no index.html; default permissions will be applied".to_string());
        }
    }
    out
}
