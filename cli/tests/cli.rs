//! End-to-end runs of the `wrapkit` binary with no API key configured, so
//! every AI stage takes its fallback path without touching the network.

use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use wrapkit_core::{ArchiveCodec, FileTree, ZipCodec};

fn wrapkit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wrapkit").unwrap();
    cmd.current_dir(dir)
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY")
        .env_remove("RUST_LOG")
        .env("GEMINI_BASE_URL", "http://127.0.0.1:9");
    cmd
}

fn read_zip(path: &Path) -> FileTree {
    ZipCodec
        .read_archive(&std::fs::read(path).unwrap())
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = wrapkit_core::icon::PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(b"IHDR");
    bytes
}

fn parse_json(out: &[u8]) -> serde_json::Value {
    serde_json::from_slice(out).unwrap()
}

#[test]
fn unsupported_upload_is_a_user_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    wrapkit(dir.path())
        .args(["build", "notes.txt"])
        .assert()
        .code(2)
        .stderr(contains("unsupported file type"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn build_html_writes_project_archive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("game.html"), "<canvas></canvas>").unwrap();

    wrapkit(dir.path())
        .args(["build", "game.html", "--name", "Space Game"])
        .assert()
        .success()
        .stderr(contains("ok: wrote"))
        .stderr(contains("permissions defaulted"));

    let tree = read_zip(&dir.path().join("Space_Game_AndroidProject.zip"));
    assert_eq!(
        tree.read_text("Space_Game/app/src/main/assets/index.html")
            .unwrap(),
        "<canvas></canvas>"
    );
    let manifest = tree
        .read_text("Space_Game/app/src/main/AndroidManifest.xml")
        .unwrap();
    assert!(manifest.contains("android.permission.INTERNET"));
    assert!(!manifest.contains("android.permission.CAMERA"));
    assert!(tree
        .get("Space_Game/.github/workflows/build_apk.yml")
        .is_some());
}

#[test]
fn build_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.html"), "<p>x</p>").unwrap();
    wrapkit(dir.path())
        .args(["build", "app.html"])
        .assert()
        .success();
    wrapkit(dir.path())
        .args(["build", "app.html"])
        .assert()
        .code(2)
        .stderr(contains("refusing to overwrite"));
}

#[test]
fn build_rejects_bad_package_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.html"), "<p>x</p>").unwrap();
    wrapkit(dir.path())
        .args(["build", "app.html", "--package", "nodots"])
        .assert()
        .code(2);
}

#[test]
fn analyze_pasted_markup_reports_fallback_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = wrapkit(dir.path())
        .args(["--json", "analyze", "-"])
        .write_stdin("<video autoplay></video>")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = parse_json(&out);
    assert_eq!(v["ok"], true);
    assert_eq!(v["data"]["defaulted"], true);
    assert_eq!(v["data"]["cause"], "no API key configured");
    assert_eq!(
        v["data"]["declared_permissions"],
        serde_json::json!(["android.permission.INTERNET"])
    );
    assert_eq!(v["data"]["permissions"]["usesInternet"], true);
}

#[test]
fn zip_without_index_warns_and_still_builds() {
    let dir = tempfile::tempdir().unwrap();
    let mut site = FileTree::new();
    site.write("home.html", "<p>home</p>");
    site.write("css/site.css", "p{}");
    std::fs::write(
        dir.path().join("site.zip"),
        ZipCodec.write_archive(&site).unwrap(),
    )
    .unwrap();

    let out = wrapkit(dir.path())
        .args(["--json", "build", "site.zip"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = parse_json(&out);
    assert_eq!(v["data"]["file_name"], "site_AndroidProject.zip");
    assert!(v["data"]["warnings"][0]
        .as_str()
        .unwrap()
        .contains("no index.html"));

    let tree = read_zip(&dir.path().join("site_AndroidProject.zip"));
    assert_eq!(
        tree.read_text("site/app/src/main/assets/css/site.css")
            .unwrap(),
        "p{}"
    );
}

#[test]
fn build_with_local_icon_packages_launcher_icons() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.html"), "<p>x</p>").unwrap();
    std::fs::write(dir.path().join("logo.png"), png_bytes()).unwrap();

    wrapkit(dir.path())
        .args(["build", "app.html", "--icon", "logo.png"])
        .assert()
        .success()
        .stderr(contains("icon generated"));

    let tree = read_zip(&dir.path().join("app_AndroidProject.zip"));
    assert_eq!(
        tree.read_bytes("app/app/src/main/res/mipmap-xxhdpi/ic_launcher.png")
            .unwrap(),
        png_bytes().as_slice()
    );
}

#[test]
fn build_rejects_non_png_icon() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.html"), "<p>x</p>").unwrap();
    std::fs::write(
        dir.path().join("logo.jpg"),
        [0xff, 0xd8, 0xff, 0xe0, 0, 0x10, b'J', b'F', b'I', b'F'],
    )
    .unwrap();

    wrapkit(dir.path())
        .args(["build", "app.html", "--icon", "logo.jpg"])
        .assert()
        .code(2)
        .stderr(contains("expected a PNG image"));
    assert!(!dir.path().join("app_AndroidProject.zip").exists());
}

#[test]
fn icon_without_key_reports_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let out = wrapkit(dir.path())
        .args([
            "--json",
            "icon",
            "--name",
            "Notes",
            "--description",
            "a tiny notes app",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = parse_json(&out);
    assert_eq!(v["data"]["defaulted"], true);
    assert_eq!(v["data"]["reference"], "https://picsum.photos/512/512");
    assert!(v["data"]["path"].is_null());
    assert!(!dir.path().join("Notes_icon.png").exists());
}

#[test]
fn icon_requires_description() {
    let dir = tempfile::tempdir().unwrap();
    wrapkit(dir.path())
        .args(["icon", "--name", "Notes", "--description", "  "])
        .assert()
        .code(2)
        .stderr(contains("describe the app"));
}
