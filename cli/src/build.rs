use wrapkit_core::project::{DEFAULT_APP_NAME, DEFAULT_PACKAGE_NAME, DEFAULT_VERSION_NAME};
use wrapkit_core::templates::declared_permissions;
use wrapkit_core::{Inference, ProjectConfig, Session};

use crate::analyze::print_profile;
use crate::cli::{human_log, json_print, BuildArgs, CliError, JsonOk};
use crate::config::Config;
use crate::icon::{load_icon_file, print_icon, reference_summary, write_new_file};
use crate::input;

pub async fn build(
    config: &Config,
    json: bool,
    verbose: bool,
    args: BuildArgs,
) -> Result<(), CliError> {
    let project = ProjectConfig::new(
        args.name.as_deref().unwrap_or(DEFAULT_APP_NAME),
        args.package.as_deref().unwrap_or(DEFAULT_PACKAGE_NAME),
        args.version_name.as_deref().unwrap_or(DEFAULT_VERSION_NAME),
        args.description.as_deref().unwrap_or_default(),
    )
    .map_err(|e| CliError::user(e.to_string()))?;

    if !args.out.is_dir() {
        return Err(CliError::user(format!(
            "output directory does not exist: {}",
            args.out.display()
        )));
    }
    // Read before any network traffic so a bad --icon fails fast.
    let local_icon = args.icon.as_deref().map(load_icon_file).transpose()?;

    let pipeline = config
        .pipeline()
        .map_err(|e| CliError::operational(format!("{e:#}")))?;

    // ── Upload ──────────────────────────────────────────────────────────
    let loaded = input::load(&pipeline, Session::new(project), &args.input, verbose)?;
    let mut warnings = input::upload_warnings(&loaded);
    let mut session = loaded.session;
    if let Some(name) = &args.name {
        // An explicit name wins over the one derived from the file name.
        let renamed = session.config().clone().with_app_name(name);
        session = session.with_config(renamed);
    }

    // ── Analyze ─────────────────────────────────────────────────────────
    human_log(verbose, "analyzing permissions");
    let session = pipeline.analyze(session).await?;

    // ── Design ──────────────────────────────────────────────────────────
    let session = if let Some(icon) = local_icon {
        human_log(verbose, "using local icon");
        session.with_icon(Inference::Inferred(icon))
    } else if args.no_icon {
        session
    } else if session.config().description().is_empty() {
        human_log(verbose, "no description given; skipping icon generation");
        session
    } else {
        human_log(verbose, "generating icon");
        pipeline.design(session).await?
    };

    // ── Build ───────────────────────────────────────────────────────────
    let (session, archive) = pipeline.build(session)?;
    let dest = args.out.join(&archive.file_name);
    write_new_file(&dest, &archive.bytes)?;
    if let Some(e) = &archive.asset_fallback {
        warnings.push(format!("{e}; packaged a diagnostic index.html instead"));
    }

    let permissions = session
        .permissions()
        .ok_or_else(|| CliError::operational("build finished without a permission profile"))?;

    if json {
        json_print(&JsonOk {
            ok: true,
            data: serde_json::json!({
                "path": dest,
                "file_name": archive.file_name,
                "bytes": archive.bytes.len(),
                "project": {
                    "app_name": session.config().app_name(),
                    "package_name": session.config().package_name(),
                    "version_name": session.config().version_name(),
                },
                "permissions": permissions.value(),
                "declared_permissions": declared_permissions(permissions.value()),
                "permissions_defaulted": permissions.is_defaulted(),
                "icon": session.icon().map(|icon| serde_json::json!({
                    "reference": reference_summary(icon.value()),
                    "defaulted": icon.is_defaulted(),
                    "embedded": icon.value().embedded_image().is_some(),
                })),
                "warnings": warnings,
            }),
        });
    } else {
        eprintln!("ok: wrote {}", dest.to_string_lossy());
        eprintln!("  app: {} ({})", session.config().app_name(), session.config().package_name());
        print_profile(permissions);
        if let Some(icon) = session.icon() {
            print_icon(icon);
        }
        for w in &warnings {
            eprintln!("  warning: {w}");
        }
        eprintln!("  next: push the project to GitHub; the bundled workflow builds the debug APK");
    }
    Ok(())
}
