//! Gemini generation endpoint client.
//!
//! One [`GeminiClient::generate`] call per job: build the typed request body
//! (inline reference images first, then the text prompt), POST it, and pull
//! the binary image payload out of the response. Remote failures are never
//! retried here; the caller decides whether to re-run a failed job.

use crate::error::{ImagenError, Result};
use crate::types::{ImageFormat, ImageSize, ImagenConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A reference image encoded for inline embedding in a request.
#[derive(Debug, Clone)]
pub struct InputImage {
    /// Base64-encoded image bytes.
    pub data: String,
    /// MIME type sniffed from the file's magic bytes.
    pub mime_type: &'static str,
}

impl InputImage {
    /// Read and encode an image file, sniffing its MIME type.
    ///
    /// Unrecognized leading bytes fall back to JPEG, mirroring the response
    /// sniffing default.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ImagenError::Validation(format!(
                "cannot read input image {}: {}",
                path.display(),
                e
            ))
        })?;
        let mime_type = ImageFormat::from_magic_bytes(&bytes)
            .unwrap_or(ImageFormat::Jpeg)
            .mime_type();
        Ok(Self {
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
            mime_type,
        })
    }
}

/// Client for the Gemini image-generation endpoint.
///
/// Cheap to clone; the underlying `reqwest::Client` is shared.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ImagenConfig,
}

impl GeminiClient {
    pub fn new(config: ImagenConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ImagenConfig {
        &self.config
    }

    /// Generate one image and return its raw bytes.
    ///
    /// # Errors
    ///
    /// - [`ImagenError::Connection`] when the endpoint is unreachable or the
    ///   request times out
    /// - [`ImagenError::Remote`] on a non-success HTTP status, carrying the
    ///   status code and error body text
    /// - [`ImagenError::Decode`] when the response carries no image payload
    ///   or the payload is not valid base64
    pub async fn generate(
        &self,
        prompt: &str,
        inputs: &[InputImage],
        size: ImageSize,
    ) -> Result<Vec<u8>> {
        let url = format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let body = GenerateRequest::new(prompt, inputs, size);

        tracing::debug!(model = %self.config.model, size = %size, inputs = inputs.len(), "sending generation request");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImagenError::Connection(url.clone(), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ImagenError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let response: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ImagenError::Decode(e.to_string()))?;

        let data = response
            .first_inline_data()
            .ok_or_else(|| ImagenError::Decode("no image data in response".to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| ImagenError::Decode(format!("invalid base64 image payload: {}", e)))
    }
}

// Wire types. Keys are camelCase except `image_size`, which the API expects
// in snake case inside `imageConfig`.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
struct ImageConfig {
    image_size: &'static str,
}

impl GenerateRequest {
    fn new(prompt: &str, inputs: &[InputImage], size: ImageSize) -> Self {
        let mut parts = Vec::with_capacity(inputs.len() + 1);

        // Reference images come first so the prompt can refer back to them.
        for input in inputs {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: input.mime_type.to_string(),
                    data: input.data.clone(),
                },
            });
        }
        parts.push(Part::Text {
            text: prompt.to_string(),
        });

        Self {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
                image_config: ImageConfig {
                    image_size: size.as_str(),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
struct ResponseInlineData {
    data: String,
}

impl GenerateResponse {
    /// First inline image payload across all candidates' parts.
    fn first_inline_data(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.inline_data.as_ref().map(|d| d.data.as_str()))
    }
}
