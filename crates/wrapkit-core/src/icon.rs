use std::future::Future;

use base64::Engine as _;

use crate::inference::{AiError, Inference};

/// Remote stand-in used when no image could be generated.
pub const PLACEHOLDER_ICON_URL: &str = "https://picsum.photos/512/512";
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Launcher icons are packaged as `.png`, so only real PNG data qualifies.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.len() > PNG_SIGNATURE.len() && bytes.starts_with(&PNG_SIGNATURE)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconAsset {
    Embedded { bytes: Vec<u8>, mime_type: String },
    Placeholder { url: String },
}

impl IconAsset {
    pub fn placeholder() -> Self {
        IconAsset::Placeholder {
            url: PLACEHOLDER_ICON_URL.to_string(),
        }
    }

    /// PNG bytes the assembler can write as launcher icons, if any.
    pub fn embedded_image(&self) -> Option<&[u8]> {
        match self {
            IconAsset::Embedded { bytes, .. } if is_png(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    /// `data:` URL for embedded images, the remote URL otherwise.
    pub fn reference(&self) -> String {
        match self {
            IconAsset::Embedded { bytes, mime_type } => format!(
                "data:{mime_type};base64,{}",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            ),
            IconAsset::Placeholder { url } => url.clone(),
        }
    }
}

pub trait ImageBackend {
    fn generate_image(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<GeneratedImage, AiError>> + Send;
}

pub struct IconClient<B> {
    backend: B,
}

impl<B: ImageBackend + Sync> IconClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Fails closed to [`IconAsset::placeholder`].
    pub async fn generate(&self, app_name: &str, description: &str) -> Inference<IconAsset> {
        let result = if description.trim().is_empty() {
            Err(AiError::EmptyDescription)
        } else {
            self.backend
                .generate_image(&icon_prompt(app_name, description))
                .await
                .and_then(|image| {
                    if image.bytes.is_empty() {
                        Err(AiError::MissingImage)
                    } else if !is_png(&image.bytes) {
                        Err(AiError::UnsupportedImage(image.mime_type))
                    } else {
                        Ok(image)
                    }
                })
        };

        match result {
            Ok(image) => {
                tracing::info!(bytes = image.bytes.len(), mime = %image.mime_type, "icon generated");
                Inference::Inferred(IconAsset::Embedded {
                    bytes: image.bytes,
                    mime_type: image.mime_type,
                })
            }
            Err(cause) => {
                tracing::warn!(%cause, "icon generation failed; using placeholder");
                Inference::Defaulted {
                    value: IconAsset::placeholder(),
                    cause,
                }
            }
        }
    }
}

pub fn icon_prompt(app_name: &str, description: &str) -> String {
    format!(
        r#"Design a modern, minimalist, vector-style app icon for an Android application named "{app_name}".
Description of the app: {description}.
The icon should be suitable for a mobile launcher (rounded square or adaptive shape).
High contrast, professional color palette. Flat design.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeImages(Result<GeneratedImage, AiError>);

    impl ImageBackend for FakeImages {
        async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, AiError> {
            self.0.clone()
        }
    }

    fn png() -> GeneratedImage {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"IHDR");
        GeneratedImage {
            bytes,
            mime_type: "image/png".into(),
        }
    }

    #[tokio::test]
    async fn failure_yields_non_empty_placeholder() {
        let client = IconClient::new(FakeImages(Err(AiError::Transport("timeout".into()))));
        let outcome = client.generate("Demo", "a todo list").await;
        assert!(outcome.is_defaulted());
        assert!(!outcome.value().reference().is_empty());
        assert_eq!(outcome.value(), &IconAsset::placeholder());
        assert!(outcome.value().embedded_image().is_none());
    }

    #[tokio::test]
    async fn empty_payload_counts_as_failure() {
        let client = IconClient::new(FakeImages(Ok(GeneratedImage {
            bytes: vec![],
            mime_type: "image/png".into(),
        })));
        let outcome = client.generate("Demo", "weather").await;
        assert_eq!(outcome.cause(), Some(&AiError::MissingImage));
    }

    #[tokio::test]
    async fn empty_description_is_not_sent() {
        let client = IconClient::new(FakeImages(Ok(png())));
        let outcome = client.generate("Demo", "  ").await;
        assert_eq!(outcome.cause(), Some(&AiError::EmptyDescription));
    }

    #[tokio::test]
    async fn success_embeds_image() {
        let client = IconClient::new(FakeImages(Ok(png())));
        let outcome = client.generate("Demo", "a camera app").await;
        assert!(!outcome.is_defaulted());
        assert_eq!(outcome.value().embedded_image(), Some(&png().bytes[..]));
    }

    #[tokio::test]
    async fn non_png_payload_counts_as_failure() {
        let client = IconClient::new(FakeImages(Ok(GeneratedImage {
            bytes: vec![0xff, 0xd8, 0xff, 0xe0, 0, 0x10, b'J', b'F', b'I', b'F'],
            mime_type: "image/jpeg".into(),
        })));
        let outcome = client.generate("Demo", "weather").await;
        assert_eq!(
            outcome.cause(),
            Some(&AiError::UnsupportedImage("image/jpeg".into()))
        );
        assert_eq!(outcome.value(), &IconAsset::placeholder());
    }

    #[test]
    fn only_png_bytes_are_embeddable() {
        let jpeg = IconAsset::Embedded {
            bytes: vec![0xff, 0xd8, 0xff, 0xe0, 1, 2, 3, 4, 5],
            mime_type: "image/png".into(),
        };
        assert!(jpeg.embedded_image().is_none());
        let bare_signature = IconAsset::Embedded {
            bytes: PNG_SIGNATURE.to_vec(),
            mime_type: "image/png".into(),
        };
        assert!(bare_signature.embedded_image().is_none());
        assert!(IconAsset::placeholder().embedded_image().is_none());
    }

    #[test]
    fn embedded_reference_is_a_data_url() {
        let png = png();
        let icon = IconAsset::Embedded {
            bytes: png.bytes,
            mime_type: png.mime_type,
        };
        assert!(icon.reference().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
