use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "wrapkit",
    version,
    about = "Wrap an HTML/JS web app into a ready-to-build Android project"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON on stdout")]
    pub json: bool,
    #[arg(long, short, global = true, help = "Log progress to stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Analyze, design and package a web app into an Android project archive.
    Build(BuildArgs),
    /// Infer the Android permissions a web app needs.
    Analyze(AnalyzeArgs),
    /// Generate a launcher icon.
    Icon(IconArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// `.html`, `.htm` or `.zip` file; `-` reads pasted markup from stdin.
    pub input: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub package: Option<String>,
    #[arg(long = "version-name")]
    pub version_name: Option<String>,
    /// Enables icon generation.
    #[arg(long)]
    pub description: Option<String>,
    /// Use this PNG as the launcher icon instead of generating one.
    #[arg(long, conflicts_with = "no_icon")]
    pub icon: Option<PathBuf>,
    #[arg(long)]
    pub no_icon: bool,
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// `.html`, `.htm` or `.zip` file; `-` reads pasted markup from stdin.
    pub input: String,
}

#[derive(Args, Debug)]
pub struct IconArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: String,
    /// Defaults to `<name>_icon.png` in the current directory.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    User,
    Operational,
}

#[derive(Debug)]
pub struct CliError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            message: message.into(),
        }
    }

    pub fn operational(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Operational,
            message: message.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::User => "user_error",
            ErrorKind::Operational => "operational_error",
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self.kind {
            ErrorKind::User => ExitCode::from(2),
            ErrorKind::Operational => ExitCode::from(1),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<wrapkit_core::SessionError> for CliError {
    fn from(e: wrapkit_core::SessionError) -> Self {
        use wrapkit_core::SessionError;
        match e {
            SessionError::Assembly(_) => CliError::operational(e.to_string()),
            _ => CliError::user(e.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct JsonOk<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
struct JsonErr<'a> {
    ok: bool,
    error: JsonErrBody<'a>,
}

#[derive(Serialize)]
struct JsonErrBody<'a> {
    code: &'a str,
    message: &'a str,
}

pub fn json_print<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: failed to encode json output: {e}"),
    }
}

pub fn human_log(verbose: bool, msg: impl AsRef<str>) {
    if verbose {
        eprintln!("{}", msg.as_ref());
    }
}

pub fn render_err(json: bool, e: CliError) -> ExitCode {
    if json {
        json_print(&JsonErr {
            ok: false,
            error: JsonErrBody {
                code: e.code(),
                message: &e.message,
            },
        });
    } else {
        eprintln!("error: {e}");
    }
    e.exit_code()
}
