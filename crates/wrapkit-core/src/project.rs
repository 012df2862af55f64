//! Validated project configuration.
//!
//! Everything here ends up interpolated into file paths, Java source, XML and
//! Gradle scripts, so values are checked once on construction and the rest of
//! the crate only ever sees a `ProjectConfig`.

pub const DEFAULT_APP_NAME: &str = "MyApp";
pub const DEFAULT_PACKAGE_NAME: &str = "com.example.myapp";
pub const DEFAULT_VERSION_NAME: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("package name must be dot-separated (for example: com.example.app)")]
    PackageNotDotted,
    #[error("package name has invalid segment `{segment}` in `{package}`")]
    PackageSegment { package: String, segment: String },
    #[error("version name must not be empty")]
    EmptyVersion,
    #[error("version name `{0}` contains characters that cannot be embedded in build scripts")]
    VersionCharacters(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    app_name: String,
    package_name: String,
    version_name: String,
    description: String,
}

impl ProjectConfig {
    pub fn new(
        app_name: &str,
        package_name: &str,
        version_name: &str,
        description: &str,
    ) -> Result<Self, ConfigError> {
        let package_name = package_name.trim();
        validate_package_name(package_name)?;
        let version_name = version_name.trim();
        validate_version_name(version_name)?;

        Ok(Self {
            app_name: sanitize_app_name(app_name),
            package_name: package_name.to_string(),
            version_name: version_name.to_string(),
            description: description.trim().to_string(),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Root folder of the generated project: whitespace runs become `_`.
    pub fn folder_name(&self) -> String {
        self.app_name.split_whitespace().collect::<Vec<_>>().join("_")
    }

    /// `com.demo.app` → `com/demo/app`.
    pub fn package_path(&self) -> String {
        self.package_name.replace('.', "/")
    }

    pub fn with_app_name(self, app_name: &str) -> Self {
        Self {
            app_name: sanitize_app_name(app_name),
            ..self
        }
    }

    pub fn with_description(self, description: &str) -> Self {
        Self {
            description: description.trim().to_string(),
            ..self
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            version_name: DEFAULT_VERSION_NAME.to_string(),
            description: String::new(),
        }
    }
}

/// Keeps ASCII alphanumerics, `_`, `-` and spaces. Falls back to [`DEFAULT_APP_NAME`].
pub fn sanitize_app_name(input: &str) -> String {
    let kept: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect();
    let trimmed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        DEFAULT_APP_NAME.to_string()
    } else {
        trimmed
    }
}

pub fn validate_package_name(value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || !value.contains('.') {
        return Err(ConfigError::PackageNotDotted);
    }
    for seg in value.split('.') {
        let mut chars = seg.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::PackageSegment {
                package: value.to_string(),
                segment: seg.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_version_name(value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyVersion);
    }
    if value
        .chars()
        .any(|c| c.is_control() || matches!(c, '"' | '\'' | '\\' | '$'))
    {
        return Err(ConfigError::VersionCharacters(value.to_string()));
    }
    Ok(())
}
