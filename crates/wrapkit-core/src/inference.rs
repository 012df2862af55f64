//! Outcome of a best-effort AI stage.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend returned no content")]
    EmptyResponse,
    #[error("response did not match the expected shape: {0}")]
    Schema(String),
    #[error("response contained no image payload")]
    MissingImage,
    #[error("unsupported icon image type `{0}` (PNG required)")]
    UnsupportedImage(String),
    #[error("description is required to generate an icon")]
    EmptyDescription,
}

/// Whether a value came from the backend or from the local fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Inference<T> {
    Inferred(T),
    Defaulted { value: T, cause: AiError },
}

impl<T> Inference<T> {
    pub fn value(&self) -> &T {
        match self {
            Inference::Inferred(value) | Inference::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Inference::Inferred(value) | Inference::Defaulted { value, .. } => value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Inference::Defaulted { .. })
    }

    pub fn cause(&self) -> Option<&AiError> {
        match self {
            Inference::Inferred(_) => None,
            Inference::Defaulted { cause, .. } => Some(cause),
        }
    }
}
