//! Gemini `generateContent` backend for permission analysis and icon generation.

use std::time::Duration;

use base64::Engine as _;
use serde::Deserialize;
use url::Url;

use crate::icon::{GeneratedImage, ImageBackend};
use crate::inference::AiError;
use crate::permissions::PermissionBackend;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_THINKING_BUDGET: u32 = 32_768;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub analysis_model: String,
    pub image_model: String,
    pub thinking_budget: u32,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>, base_url: Url) -> Self {
        Self {
            api_key,
            base_url,
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(mut config: GeminiConfig) -> Result<Self, AiError> {
        // `Url::join` drops the last segment unless the base ends in a slash.
        if !config.base_url.path().ends_with('/') {
            let path = format!("{}/", config.base_url.path());
            config.base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> Result<Url, AiError> {
        self.config
            .base_url
            .join(&format!("v1beta/models/{model}:generateContent"))
            .map_err(|e| AiError::Transport(format!("invalid endpoint for model {model}: {e}")))
    }

    async fn generate_content(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<GenerateContentResponse, AiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AiError::MissingApiKey)?;
        let url = self.endpoint(model)?;
        tracing::debug!(%url, "gemini request");

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        resp.json::<GenerateContentResponse>()
            .await
            .map_err(|e| AiError::Schema(e.to_string()))
    }
}

impl PermissionBackend for GeminiClient {
    async fn analyze(&self, prompt: &str, schema: &serde_json::Value) -> Result<String, AiError> {
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
                "thinkingConfig": { "thinkingBudget": self.config.thinking_budget },
            },
        });
        let resp = self
            .generate_content(&self.config.analysis_model, body)
            .await?;
        extract_text(&resp)
    }
}

impl ImageBackend for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, AiError> {
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        });
        let resp = self.generate_content(&self.config.image_model, body).await?;
        extract_image(&resp)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thought: Option<bool>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

fn first_parts(resp: &GenerateContentResponse) -> &[Part] {
    resp.candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .unwrap_or_default()
}

/// Concatenated non-thought text of the first candidate.
pub fn extract_text(resp: &GenerateContentResponse) -> Result<String, AiError> {
    let text: String = first_parts(resp)
        .iter()
        .filter(|p| p.thought != Some(true))
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

/// First inline image of the first candidate.
pub fn extract_image(resp: &GenerateContentResponse) -> Result<GeneratedImage, AiError> {
    let inline = first_parts(resp)
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| d.mime_type.starts_with("image/"))
        .ok_or(AiError::MissingImage)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(inline.data.trim())
        .map_err(|e| AiError::Schema(format!("invalid image payload: {e}")))?;
    Ok(GeneratedImage {
        bytes,
        mime_type: inline.mime_type.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{PermissionInferenceClient, PermissionProfile};

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn text_skips_thought_parts() {
        let resp = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"thinking...","thought":true},
                {"text":"{\"usesInternet\":true,"},
                {"text":"\"usesCamera\":false,\"reasoning\":\"ok\"}"}
            ]}}]}"#,
        );
        let text = extract_text(&resp).unwrap();
        let profile = PermissionProfile::from_json(&text).unwrap();
        assert!(profile.uses_internet);
        assert_eq!(profile.reasoning, "ok");
    }

    #[test]
    fn no_candidates_is_empty_response() {
        assert_eq!(extract_text(&parse("{}")), Err(AiError::EmptyResponse));
        assert_eq!(
            extract_text(&parse(r#"{"candidates":[{}]}"#)),
            Err(AiError::EmptyResponse)
        );
    }

    #[test]
    fn image_is_decoded_from_inline_data() {
        let resp = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here is your icon"},
                {"inlineData":{"mimeType":"image/png","data":"iVBORw=="}}
            ]}}]}"#,
        );
        let image = extract_image(&resp).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn text_only_reply_has_no_image() {
        let resp = parse(r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#);
        assert_eq!(extract_image(&resp), Err(AiError::MissingImage));
    }

    fn local_config(api_key: Option<&str>, base_url: &str) -> GeminiConfig {
        GeminiConfig::new(api_key.map(str::to_string), Url::parse(base_url).unwrap())
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = GeminiClient::new(local_config(None, "http://127.0.0.1:9/proxy")).unwrap();
        assert_eq!(
            client.endpoint("m1").unwrap().as_str(),
            "http://127.0.0.1:9/proxy/v1beta/models/m1:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_degrades_without_network() {
        let client = PermissionInferenceClient::new(
            GeminiClient::new(local_config(None, DEFAULT_BASE_URL)).unwrap(),
        );
        let outcome = client.infer("<html></html>").await;
        assert_eq!(outcome.cause(), Some(&AiError::MissingApiKey));
        assert_eq!(outcome.value(), &PermissionProfile::fallback());
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_to_fallback() {
        let client = PermissionInferenceClient::new(
            GeminiClient::new(GeminiConfig {
                timeout: Duration::from_secs(2),
                ..local_config(Some("test-key"), "http://127.0.0.1:9/")
            })
            .unwrap(),
        );
        let outcome = client.infer("<html></html>").await;
        assert!(matches!(outcome.cause(), Some(AiError::Transport(_))));
        assert!(outcome.value().uses_internet);
    }
}
