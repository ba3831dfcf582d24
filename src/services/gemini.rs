use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::generation::ImageMode;

/// Provider-facing parameters shared by every job in a batch.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub prompt: String,
    pub temperature: f64,
    pub image: Option<ReferenceImage>,
    pub mode: Option<ImageMode>,
}

/// Decoded reference image attached to a generation request.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A single image-generation call against the external provider.
///
/// The dispatcher only sees this trait; [`GeminiClient`] is the production
/// implementation and tests substitute scripted ones.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image, returned as a self-contained data URI.
    async fn generate(&self, params: &GenerationParams) -> Result<String, GenerateError>;
}

/// Client for the Gemini image generation API.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    response_modalities: Vec<&'static str>,
}

/// One content part, on the wire in either direction. A part carries text
/// or inline binary data, never both.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl Part {
    fn text(value: String) -> Self {
        Self {
            text: Some(value),
            inline_data: None,
        }
    }

    fn image(mime_type: &str, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        }
    }
}

impl GeminiClient {
    /// The timeout bounds the whole provider call so a hung upstream
    /// request resolves to an error instead of occupying a slot forever.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, GenerateError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn build_parts(params: &GenerationParams) -> Vec<Part> {
        let mut parts = Vec::new();
        match &params.image {
            Some(image) => {
                // Reference mode frames the image as guidance; edit mode
                // sends the prompt against the image as-is.
                if params.mode == Some(ImageMode::Reference) {
                    parts.push(Part::text(format!(
                        "Use the attached image as a style and content reference. {}",
                        params.prompt
                    )));
                } else {
                    parts.push(Part::text(params.prompt.clone()));
                }
                parts.push(Part::image(&image.mime_type, &image.data));
            }
            None => parts.push(Part::text(params.prompt.clone())),
        }
        parts
    }
}

/// Pull the first inline image out of a response and re-encode it as a
/// data URI. The model may interleave text parts; those are skipped.
fn image_data_uri(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data)
        .map(|inline| format!("data:{};base64,{}", inline.mime_type, inline.data))
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, params: &GenerationParams) -> Result<String, GenerateError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: Self::build_parts(params),
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                response_modalities: vec!["TEXT", "IMAGE"],
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        image_data_uri(parsed).ok_or(GenerateError::NoImage)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Provider response contained no image payload")]
    NoImage,
}
