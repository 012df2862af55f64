use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::inference::{AiError, Inference};

/// Characters of markup sent for analysis. Larger inputs are cut silently.
pub const MAX_ANALYZED_CHARS: usize = 15_000;
/// Analyzed in place of empty markup.
pub const GENERIC_WEB_APP: &str = "GENERIC_WEB_APP";
pub const FALLBACK_REASONING: &str =
    "Automatic analysis failed. Basic permissions were applied.";

/// Device capabilities a web app appears to need.
///
/// `usesInternet`, `usesCamera` and `reasoning` are required on the wire; the
/// remaining flags default to `false` and `customPermissions` to empty.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionProfile {
    pub uses_internet: bool,
    pub uses_camera: bool,
    #[serde(default)]
    pub uses_location: bool,
    #[serde(default)]
    pub uses_microphone: bool,
    #[serde(default)]
    pub uses_storage: bool,
    #[serde(default)]
    pub custom_permissions: Vec<String>,
    pub reasoning: String,
}

impl PermissionProfile {
    /// Internet only. Used whenever inference fails.
    pub fn fallback() -> Self {
        Self {
            uses_internet: true,
            uses_camera: false,
            uses_location: false,
            uses_microphone: false,
            uses_storage: false,
            custom_permissions: Vec::new(),
            reasoning: FALLBACK_REASONING.to_string(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, AiError> {
        serde_json::from_str(text.trim()).map_err(|e| AiError::Schema(e.to_string()))
    }

    /// JSON schema handed to the backend for structured output.
    pub fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "usesInternet": { "type": "BOOLEAN" },
                "usesCamera": { "type": "BOOLEAN" },
                "usesLocation": { "type": "BOOLEAN" },
                "usesMicrophone": { "type": "BOOLEAN" },
                "usesStorage": { "type": "BOOLEAN" },
                "customPermissions": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Any other specific permissions like BLUETOOTH, VIBRATE, etc."
                },
                "reasoning": {
                    "type": "STRING",
                    "description": "Detailed explanation of why these permissions were chosen based on the code analysis."
                }
            },
            "required": ["usesInternet", "usesCamera", "reasoning"]
        })
    }
}

/// Backend able to answer a prompt with JSON constrained by a schema.
pub trait PermissionBackend {
    fn analyze(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> impl Future<Output = Result<String, AiError>> + Send;
}

pub struct PermissionInferenceClient<B> {
    backend: B,
}

impl<B: PermissionBackend + Sync> PermissionInferenceClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Never fails: backend or schema errors yield [`PermissionProfile::fallback`].
    pub async fn infer(&self, markup_text: &str) -> Inference<PermissionProfile> {
        let prompt = analysis_prompt(markup_text);
        let schema = PermissionProfile::response_schema();

        let result = match self.backend.analyze(&prompt, &schema).await {
            Ok(text) => PermissionProfile::from_json(&text),
            Err(e) => Err(e),
        };

        match result {
            Ok(profile) => {
                tracing::info!(
                    camera = profile.uses_camera,
                    location = profile.uses_location,
                    microphone = profile.uses_microphone,
                    storage = profile.uses_storage,
                    custom = profile.custom_permissions.len(),
                    "permission profile inferred"
                );
                Inference::Inferred(profile)
            }
            Err(cause) => {
                tracing::warn!(%cause, "permission inference failed; using default profile");
                Inference::Defaulted {
                    value: PermissionProfile::fallback(),
                    cause,
                }
            }
        }
    }
}

/// First [`MAX_ANALYZED_CHARS`] characters, never splitting a code point.
pub fn truncate_for_analysis(markup_text: &str) -> &str {
    match markup_text.char_indices().nth(MAX_ANALYZED_CHARS) {
        Some((idx, _)) => &markup_text[..idx],
        None => markup_text,
    }
}

pub fn analysis_prompt(markup_text: &str) -> String {
    let code = if markup_text.trim().is_empty() {
        GENERIC_WEB_APP
    } else {
        truncate_for_analysis(markup_text)
    };
    format!(
        r#"Act as a senior Android Engineer. I have a web application code (HTML/JS).
I need to wrap this in an Android WebView.

Analyze the following code deeply to understand what native device features it likely accesses.
Determine which AndroidManifest.xml permissions are required.

Code snippet (first {MAX_ANALYZED_CHARS} chars):
{code}

Think carefully about implied usage (e.g., <input type="file"> might need storage, navigator.geolocation needs location).
Return the result in JSON.
"#
    )
}
