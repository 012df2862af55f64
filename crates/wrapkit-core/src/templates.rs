//! Android project artifacts rendered as text.
//!
//! Every function here is pure: equal inputs give byte-identical output.

use crate::permissions::PermissionProfile;
use crate::project::ProjectConfig;

pub const ENTRY_URL: &str = "file:///android_asset/index.html";
const PERMISSION_PREFIX: &str = "android.permission.";

const GATED_PERMISSIONS: [&str; 5] = [
    "INTERNET",
    "CAMERA",
    "ACCESS_FINE_LOCATION",
    "RECORD_AUDIO",
    "READ_EXTERNAL_STORAGE",
];

/// Fully qualified permissions in declaration order, each at most once.
///
/// The profile flags alone decide the gated permissions: a custom entry naming
/// one of them is ignored, so `usesCamera=false` never declares CAMERA.
/// Blank custom entries are skipped.
pub fn declared_permissions(profile: &PermissionProfile) -> Vec<String> {
    let flags = [
        true,
        profile.uses_camera,
        profile.uses_location,
        profile.uses_microphone,
        profile.uses_storage,
    ];
    let gated: Vec<String> = GATED_PERMISSIONS
        .iter()
        .map(|name| format!("{PERMISSION_PREFIX}{name}"))
        .collect();

    let mut declared: Vec<String> = gated
        .iter()
        .zip(flags)
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name.clone())
        .collect();
    for custom in &profile.custom_permissions {
        if custom.trim().is_empty() {
            continue;
        }
        let name = qualify_permission(custom);
        if gated.contains(&name) || declared.contains(&name) {
            continue;
        }
        declared.push(name);
    }
    declared
}

/// `BLUETOOTH` → `android.permission.BLUETOOTH`; dotted names pass through.
fn qualify_permission(name: &str) -> String {
    let name = name.trim();
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{PERMISSION_PREFIX}{name}")
    }
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

pub fn render_manifest(config: &ProjectConfig, profile: &PermissionProfile) -> String {
    let permissions: String = declared_permissions(profile)
        .iter()
        .map(|p| {
            format!(
                "    <uses-permission android:name=\"{}\" />\n",
                xml_escape(p)
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="{package}">

{permissions}
    <application
        android:allowBackup="true"
        android:icon="@mipmap/ic_launcher"
        android:label="{label}"
        android:roundIcon="@mipmap/ic_launcher_round"
        android:supportsRtl="true"
        android:theme="@style/Theme.AppCompat.Light.NoActionBar">
        <activity
            android:name=".MainActivity"
            android:exported="true">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
    </application>

</manifest>
"#,
        package = config.package_name(),
        label = xml_escape(config.app_name()),
    )
}

pub fn render_main_activity(config: &ProjectConfig, profile: &PermissionProfile) -> String {
    let geolocation = if profile.uses_location {
        "\n        webSettings.setGeolocationEnabled(true);\n"
    } else {
        ""
    };
    format!(
        r#"package {package};

import android.os.Bundle;
import android.webkit.WebSettings;
import android.webkit.WebView;
import android.webkit.WebViewClient;
import androidx.appcompat.app.AppCompatActivity;

public class MainActivity extends AppCompatActivity {{

    private WebView myWebView;

    @Override
    protected void onCreate(Bundle savedInstanceState) {{
        super.onCreate(savedInstanceState);
        setContentView(R.layout.activity_main);

        myWebView = findViewById(R.id.webview);
        WebSettings webSettings = myWebView.getSettings();
        webSettings.setJavaScriptEnabled(true);
        webSettings.setDomStorageEnabled(true);
        webSettings.setAllowFileAccess(true);
        webSettings.setAllowContentAccess(true);
{geolocation}
        myWebView.setWebViewClient(new WebViewClient());

        // Load the packaged entry point.
        myWebView.loadUrl("{ENTRY_URL}");
    }}

    @Override
    public void onBackPressed() {{
        if (myWebView.canGoBack()) {{
            myWebView.goBack();
        }} else {{
            super.onBackPressed();
        }}
    }}
}}
"#,
        package = config.package_name(),
    )
}

pub fn render_layout() -> String {
    r#"<?xml version="1.0" encoding="utf-8"?>
<androidx.constraintlayout.widget.ConstraintLayout xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:app="http://schemas.android.com/apk/res-auto"
    xmlns:tools="http://schemas.android.com/tools"
    android:layout_width="match_parent"
    android:layout_height="match_parent">

    <WebView
        android:id="@+id/webview"
        android:layout_width="match_parent"
        android:layout_height="match_parent" />

</androidx.constraintlayout.widget.ConstraintLayout>
"#
    .to_string()
}

pub fn render_build_gradle(config: &ProjectConfig) -> String {
    format!(
        r#"plugins {{
    id 'com.android.application'
}}

android {{
    namespace '{package}'
    compileSdk 33

    defaultConfig {{
        applicationId "{package}"
        minSdk 24
        targetSdk 33
        versionCode 1
        versionName "{version}"
    }}

    buildTypes {{
        release {{
            minifyEnabled false
            proguardFiles getDefaultProguardFile('proguard-android-optimize.txt'), 'proguard-rules.pro'
        }}
    }}
}}

dependencies {{
    implementation 'androidx.appcompat:appcompat:1.6.1'
    implementation 'androidx.constraintlayout:constraintlayout:2.1.4'
}}
"#,
        package = config.package_name(),
        version = config.version_name(),
    )
}

pub fn render_workflow(config: &ProjectConfig) -> String {
    format!(
        r#"name: Build Android APK

on:
  push:
    branches: [ "main", "master" ]
  pull_request:
    branches: [ "main", "master" ]

jobs:
  build:
    runs-on: ubuntu-latest

    steps:
    - uses: actions/checkout@v4

    - name: set up JDK 17
      uses: actions/setup-java@v4
      with:
        java-version: '17'
        distribution: 'temurin'
        cache: gradle

    - name: Setup Gradle
      uses: gradle/actions/setup-gradle@v3

    # The archive ships without a Gradle wrapper, so call gradle directly.
    - name: Build Debug APK
      run: gradle app:assembleDebug

    - name: Upload APK
      uses: actions/upload-artifact@v4
      with:
        name: {artifact}-debug-apk
        path: app/build/outputs/apk/debug/app-debug.apk
"#,
        artifact = config.folder_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_config() -> ProjectConfig {
        ProjectConfig::new("DemoApp", "com.demo.app", "1.0.0", "").unwrap()
    }

    fn profile() -> PermissionProfile {
        PermissionProfile {
            uses_internet: false,
            uses_camera: false,
            uses_location: false,
            uses_microphone: false,
            uses_storage: false,
            custom_permissions: vec![],
            reasoning: String::new(),
        }
    }

    fn uses_permission_names(manifest: &str) -> Vec<String> {
        manifest
            .lines()
            .filter(|l| l.contains("<uses-permission"))
            .filter_map(|l| l.split('"').nth(1))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn location_only_scenario() {
        let profile = PermissionProfile {
            uses_location: true,
            ..profile()
        };
        let manifest = render_manifest(&demo_config(), &profile);
        assert_eq!(
            uses_permission_names(&manifest),
            vec![
                "android.permission.INTERNET",
                "android.permission.ACCESS_FINE_LOCATION"
            ]
        );
        let activity = render_main_activity(&demo_config(), &profile);
        assert!(activity.contains("webSettings.setGeolocationEnabled(true);"));
        assert!(activity.starts_with("package com.demo.app;"));
    }

    #[test]
    fn custom_permission_scenario() {
        let profile = PermissionProfile {
            custom_permissions: vec!["BLUETOOTH".into()],
            ..profile()
        };
        let manifest = render_manifest(&demo_config(), &profile);
        assert_eq!(
            uses_permission_names(&manifest),
            vec!["android.permission.INTERNET", "android.permission.BLUETOOTH"]
        );
        let activity = render_main_activity(&demo_config(), &profile);
        assert!(!activity.contains("setGeolocationEnabled"));
    }

    #[test]
    fn camera_declared_exactly_when_flagged() {
        let off = render_manifest(&demo_config(), &profile());
        assert!(!off.contains("android.permission.CAMERA"));

        let on = render_manifest(
            &demo_config(),
            &PermissionProfile {
                uses_camera: true,
                ..profile()
            },
        );
        assert_eq!(on.matches("android.permission.CAMERA").count(), 1);
    }

    #[test]
    fn every_flag_maps_to_its_permission() {
        let all = PermissionProfile {
            uses_internet: true,
            uses_camera: true,
            uses_location: true,
            uses_microphone: true,
            uses_storage: true,
            custom_permissions: vec![],
            reasoning: String::new(),
        };
        assert_eq!(
            declared_permissions(&all),
            vec![
                "android.permission.INTERNET",
                "android.permission.CAMERA",
                "android.permission.ACCESS_FINE_LOCATION",
                "android.permission.RECORD_AUDIO",
                "android.permission.READ_EXTERNAL_STORAGE",
            ]
        );
    }

    #[test]
    fn custom_permissions_keep_order() {
        let profile = PermissionProfile {
            custom_permissions: vec![
                "VIBRATE".into(),
                "com.example.permission.C2D".into(),
                "BLUETOOTH".into(),
            ],
            ..profile()
        };
        assert_eq!(
            uses_permission_names(&render_manifest(&demo_config(), &profile)),
            vec![
                "android.permission.INTERNET",
                "android.permission.VIBRATE",
                "com.example.permission.C2D",
                "android.permission.BLUETOOTH",
            ]
        );
    }

    #[test]
    fn custom_entry_never_duplicates_a_flagged_permission() {
        let profile = PermissionProfile {
            uses_camera: true,
            custom_permissions: vec![
                "CAMERA".into(),
                "android.permission.CAMERA".into(),
                "VIBRATE".into(),
                "VIBRATE".into(),
            ],
            ..profile()
        };
        let manifest = render_manifest(&demo_config(), &profile);
        assert_eq!(manifest.matches("android.permission.CAMERA").count(), 1);
        assert_eq!(
            uses_permission_names(&manifest),
            vec![
                "android.permission.INTERNET",
                "android.permission.CAMERA",
                "android.permission.VIBRATE",
            ]
        );
    }

    #[test]
    fn custom_entry_cannot_enable_an_unflagged_permission() {
        let profile = PermissionProfile {
            custom_permissions: vec!["android.permission.CAMERA".into(), " RECORD_AUDIO ".into()],
            ..profile()
        };
        let manifest = render_manifest(&demo_config(), &profile);
        assert!(!manifest.contains("android.permission.CAMERA"));
        assert!(!manifest.contains("android.permission.RECORD_AUDIO"));
    }

    #[test]
    fn blank_custom_entries_are_skipped() {
        let profile = PermissionProfile {
            custom_permissions: vec!["".into(), "   ".into(), "BLUETOOTH".into()],
            ..profile()
        };
        assert_eq!(
            declared_permissions(&profile),
            vec!["android.permission.INTERNET", "android.permission.BLUETOOTH"]
        );
        assert!(!render_manifest(&demo_config(), &profile).contains("android.permission.\""));
    }

    #[test]
    fn hostile_custom_permission_is_escaped() {
        let profile = PermissionProfile {
            custom_permissions: vec![r#"x" /><application android:debuggable="true"#.into()],
            ..profile()
        };
        let manifest = render_manifest(&demo_config(), &profile);
        assert_eq!(manifest.matches("<application").count(), 1);
        assert!(manifest.contains("&quot;"));
    }

    #[test]
    fn renderers_are_deterministic() {
        let cfg = demo_config();
        let p = PermissionProfile {
            uses_microphone: true,
            custom_permissions: vec!["NFC".into()],
            ..profile()
        };
        assert_eq!(render_manifest(&cfg, &p), render_manifest(&cfg, &p));
        assert_eq!(render_main_activity(&cfg, &p), render_main_activity(&cfg, &p));
        assert_eq!(render_build_gradle(&cfg), render_build_gradle(&cfg));
        assert_eq!(render_workflow(&cfg), render_workflow(&cfg));
        assert_eq!(render_layout(), render_layout());
    }

    #[test]
    fn activity_loads_entry_point_and_defers_back_to_history() {
        let activity = render_main_activity(&demo_config(), &profile());
        assert!(activity.contains("setJavaScriptEnabled(true)"));
        assert!(activity.contains("setDomStorageEnabled(true)"));
        assert!(activity.contains(&format!("loadUrl(\"{ENTRY_URL}\")")));
        assert!(activity.contains("if (myWebView.canGoBack())"));
    }

    #[test]
    fn build_files_carry_config_fields() {
        let cfg = ProjectConfig::new("Demo App", "com.demo.app", "2.3.4", "").unwrap();
        let gradle = render_build_gradle(&cfg);
        assert!(gradle.contains("applicationId \"com.demo.app\""));
        assert!(gradle.contains("versionName \"2.3.4\""));
        assert!(render_workflow(&cfg).contains("name: Demo_App-debug-apk"));
        assert!(render_manifest(&cfg, &profile()).contains("android:label=\"Demo App\""));
    }
}
