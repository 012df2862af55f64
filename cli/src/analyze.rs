use wrapkit_core::templates::declared_permissions;
use wrapkit_core::{Inference, PermissionProfile, ProjectConfig, Session};

use crate::cli::{human_log, json_print, AnalyzeArgs, CliError, JsonOk};
use crate::config::Config;
use crate::input;

pub async fn analyze(
    config: &Config,
    json: bool,
    verbose: bool,
    args: AnalyzeArgs,
) -> Result<(), CliError> {
    let pipeline = config
        .pipeline()
        .map_err(|e| CliError::operational(format!("{e:#}")))?;

    let loaded = input::load(
        &pipeline,
        Session::new(ProjectConfig::default()),
        &args.input,
        verbose,
    )?;
    let warnings = input::upload_warnings(&loaded);

    human_log(verbose, "analyzing permissions");
    let session = pipeline.analyze(loaded.session).await?;
    let permissions = session
        .permissions()
        .ok_or_else(|| CliError::operational("analysis produced no permission profile"))?;

    if json {
        json_print(&JsonOk {
            ok: true,
            data: serde_json::json!({
                "app_name": session.config().app_name(),
                "permissions": permissions.value(),
                "declared_permissions": declared_permissions(permissions.value()),
                "defaulted": permissions.is_defaulted(),
                "cause": permissions.cause().map(|c| c.to_string()),
                "warnings": warnings,
            }),
        });
    } else {
        print_profile(permissions);
        for w in &warnings {
            eprintln!("  warning: {w}");
        }
    }
    Ok(())
}

pub fn print_profile(permissions: &Inference<PermissionProfile>) {
    match permissions.cause() {
        Some(cause) => eprintln!("ok: permissions defaulted ({cause})"),
        None => eprintln!("ok: permissions inferred"),
    }
    for p in declared_permissions(permissions.value()) {
        eprintln!("  {p}");
    }
    eprintln!("  reasoning: {}", permissions.value().reasoning);
}
