use std::time::Duration;

use anyhow::Context;
use url::Url;
use wrapkit_core::gemini::{
    DEFAULT_ANALYSIS_MODEL, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_THINKING_BUDGET,
    DEFAULT_TIMEOUT_SECS,
};
use wrapkit_core::{GeminiClient, GeminiConfig, Pipeline, ZipCodec};

pub type GeminiPipeline = Pipeline<ZipCodec, GeminiClient, GeminiClient>;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("API_KEY"));
        let base_url: Url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
            .parse()
            .context("invalid GEMINI_BASE_URL")?;

        let mut gemini = GeminiConfig::new(api_key, base_url);
        gemini.analysis_model = std::env::var("WRAPKIT_ANALYSIS_MODEL")
            .unwrap_or_else(|_| DEFAULT_ANALYSIS_MODEL.into());
        gemini.image_model =
            std::env::var("WRAPKIT_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.into());
        gemini.thinking_budget = parse_u32_env("WRAPKIT_THINKING_BUDGET", DEFAULT_THINKING_BUDGET);
        gemini.timeout = Duration::from_secs(parse_u64_env(
            "WRAPKIT_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        ));

        tracing::debug!(
            base_url = %gemini.base_url,
            analysis_model = %gemini.analysis_model,
            image_model = %gemini.image_model,
            api_key_set = gemini.api_key.is_some(),
            "loaded config"
        );
        Ok(Self { gemini })
    }

    pub fn pipeline(&self) -> anyhow::Result<GeminiPipeline> {
        let client = GeminiClient::new(self.gemini.clone()).context("build gemini client")?;
        Ok(Pipeline::new(ZipCodec, client.clone(), client))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u32_env(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_u64_env(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
