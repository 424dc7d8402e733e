// ABOUTME: OpenAI provider for vision chat completions, text generation, and image synthesis
// ABOUTME: Supports strict JSON-schema structured outputs and the images API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Snapdish

//! # `OpenAI` Provider
//!
//! Client for the `OpenAI` chat-completions and images APIs.
//!
//! ## Configuration
//!
//! Set the `OPENAI_API_KEY` environment variable. Models can be overridden:
//! - `SNAPDISH_EXTRACTION_MODEL` (default: `gpt-4o-2024-08-06`, must support
//!   vision input and strict structured outputs)
//! - `SNAPDISH_TEXT_MODEL` (default: `gpt-4o-mini`)
//! - `SNAPDISH_IMAGE_MODEL` (default: `dall-e-2`)
//!
//! ## Structured outputs
//!
//! [`OpenAiProvider::generate_object`] sends a strict `json_schema` response
//! format, so the API enforces the schema server-side; the caller still
//! deserializes into a strict type, rejecting anything nonconforming.

use std::env;
use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::errors::{AppError, AppResult, ErrorCode};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Environment variable for the API key
const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variables for model overrides
const EXTRACTION_MODEL_ENV: &str = "SNAPDISH_EXTRACTION_MODEL";
const TEXT_MODEL_ENV: &str = "SNAPDISH_TEXT_MODEL";
const IMAGE_MODEL_ENV: &str = "SNAPDISH_IMAGE_MODEL";

/// Default extraction model (vision + strict structured outputs)
const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o-2024-08-06";

/// Default text model (prompt writing)
const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";

/// Default image model (cover rendering)
const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";

/// Base URL for the `OpenAI` API
const API_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Request timeout (image generation can be slow)
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Vision detail level; low keeps token cost down for food photos
const IMAGE_DETAIL: &str = "low";

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Chat-completions request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<RequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// A request message; content is either plain text or multimodal parts
#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Multimodal content part
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

/// Strict JSON-schema response format
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    description: String,
    strict: bool,
    schema: Value,
}

/// Chat-completions response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Images API request
#[derive(Debug, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    response_format: &'static str,
}

/// Images API response
#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

/// API error envelope
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// `OpenAI` API client
pub struct OpenAiProvider {
    api_key: String,
    client: Client,
    extraction_model: String,
    text_model: String,
    image_model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("extraction_model", &self.extraction_model)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Create a provider with an API key and default models
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.into(),
            client,
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_owned(),
            text_model: DEFAULT_TEXT_MODEL.to_owned(),
            image_model: DEFAULT_IMAGE_MODEL.to_owned(),
        }
    }

    /// Create a provider from `OPENAI_API_KEY`, honoring model override
    /// environment variables
    ///
    /// # Errors
    /// Returns a configuration error if the API key variable is not set.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var(OPENAI_API_KEY_ENV).map_err(|_| {
            AppError::config(format!("{OPENAI_API_KEY_ENV} environment variable not set"))
        })?;

        let mut provider = Self::new(api_key);
        if let Ok(model) = env::var(EXTRACTION_MODEL_ENV) {
            provider.extraction_model = model;
        }
        if let Ok(model) = env::var(TEXT_MODEL_ENV) {
            provider.text_model = model;
        }
        if let Ok(model) = env::var(IMAGE_MODEL_ENV) {
            provider.image_model = model;
        }
        Ok(provider)
    }

    /// Generate an object conforming to `schema` from an instruction plus a
    /// base64-encoded image
    ///
    /// # Errors
    /// Returns an extraction error if the HTTP call fails, the model refuses,
    /// or the response body is not valid JSON.
    #[instrument(skip_all, fields(model = %self.extraction_model, schema = schema_name))]
    pub async fn generate_object(
        &self,
        system: &str,
        user_text: &str,
        image_base64: &str,
        schema_name: &str,
        schema_description: &str,
        schema: Value,
    ) -> AppResult<Value> {
        let request = ChatCompletionRequest {
            model: self.extraction_model.clone(),
            messages: vec![
                RequestMessage {
                    role: "system",
                    content: MessageContent::Text(system.to_owned()),
                },
                RequestMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: user_text.to_owned(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image_data_url(image_base64),
                                detail: IMAGE_DETAIL,
                            },
                        },
                    ]),
                },
            ],
            response_format: Some(ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: schema_name.to_owned(),
                    description: schema_description.to_owned(),
                    strict: true,
                    schema,
                },
            }),
        };

        debug!("sending structured generation request");
        let content = self.complete(&request).await?;

        serde_json::from_str(&content).map_err(|e| {
            error!(error = %e, "model returned non-JSON content");
            AppError::extraction(format!("model returned non-JSON content: {e}"))
        })
    }

    /// Generate plain text from a system prompt and a user prompt
    ///
    /// # Errors
    /// Returns an extraction error if the HTTP call fails or the model
    /// returns no content.
    #[instrument(skip_all, fields(model = %self.text_model))]
    pub async fn generate_text(&self, system: &str, prompt: &str) -> AppResult<String> {
        let request = ChatCompletionRequest {
            model: self.text_model.clone(),
            messages: vec![
                RequestMessage {
                    role: "system",
                    content: MessageContent::Text(system.to_owned()),
                },
                RequestMessage {
                    role: "user",
                    content: MessageContent::Text(prompt.to_owned()),
                },
            ],
            response_format: None,
        };

        self.complete(&request).await
    }

    /// Generate one image and return its PNG bytes
    ///
    /// # Errors
    /// Returns an extraction error if the HTTP call fails or the response
    /// carries no image payload.
    #[instrument(skip_all, fields(model = %self.image_model, size = size))]
    pub async fn generate_image(&self, prompt: &str, size: &str) -> AppResult<Vec<u8>> {
        let request = ImageGenerationRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_owned(),
            n: 1,
            size: size.to_owned(),
            response_format: "b64_json",
        };

        let body = self
            .post_json("images/generations", &request)
            .await?;

        let response: ImageGenerationResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::extraction(format!("failed to parse image generation response: {e}"))
        })?;

        let encoded = response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .ok_or_else(|| AppError::extraction("image generation returned no image"))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::extraction(format!("image payload is not valid base64: {e}")))
    }

    /// Run a chat completion and return the first choice's text content
    async fn complete(&self, request: &ChatCompletionRequest) -> AppResult<String> {
        let body = self.post_json("chat/completions", request).await?;

        let response: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "failed to parse chat completion response");
            AppError::extraction(format!("failed to parse model response: {e}"))
        })?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AppError::extraction("model returned no choices"))?;

        if let Some(refusal) = message.refusal {
            return Err(AppError::extraction(format!("model refused: {refusal}")));
        }

        message
            .content
            .ok_or_else(|| AppError::extraction("model returned empty content"))
    }

    /// POST a JSON body and return the raw success body
    async fn post_json<T: Serialize>(&self, path: &str, request: &T) -> AppResult<String> {
        let url = format!("{API_BASE_URL}/{path}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::extraction(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::extraction(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "OpenAI API error");
            return Err(Self::map_api_error(status.as_u16(), &body));
        }

        Ok(body)
    }

    /// Map an API failure to an application error
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<ApiErrorResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.to_owned(), |e| e.message);

        match status {
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                "AI service is rate limited. Please try again shortly.",
            ),
            _ => AppError::extraction(format!("OpenAI API error ({status}): {message}")),
        }
    }
}

/// Build a data URL for the vision API; already-prefixed input is passed
/// through unchanged
fn image_data_url(image_base64: &str) -> String {
    if image_base64.starts_with("data:") {
        image_base64.to_owned()
    } else {
        format!("data:image/png;base64,{image_base64}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_request_shape() {
        let request = ChatCompletionRequest {
            model: DEFAULT_EXTRACTION_MODEL.to_owned(),
            messages: vec![RequestMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: "describe".to_owned(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url("aGVsbG8="),
                            detail: IMAGE_DETAIL,
                        },
                    },
                ]),
            }],
            response_format: Some(ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "recipe".to_owned(),
                    description: "desc".to_owned(),
                    strict: true,
                    schema: json!({"type": "object"}),
                },
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["strict"], json!(true));
        assert_eq!(
            value["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/png;base64,aGVsbG8="
        );
        assert_eq!(value["messages"][0]["content"][1]["image_url"]["detail"], "low");
    }

    #[test]
    fn test_plain_text_content_is_a_string() {
        let request = ChatCompletionRequest {
            model: DEFAULT_TEXT_MODEL.to_owned(),
            messages: vec![RequestMessage {
                role: "system",
                content: MessageContent::Text("write a prompt".to_owned()),
            }],
            response_format: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["content"], "write a prompt");
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_data_url_passthrough() {
        assert_eq!(
            image_data_url("data:image/jpeg;base64,xyz"),
            "data:image/jpeg;base64,xyz"
        );
        assert_eq!(image_data_url("xyz"), "data:image/png;base64,xyz");
    }

    #[test]
    fn test_map_api_error_rate_limit() {
        let error = OpenAiProvider::map_api_error(429, r#"{"error":{"message":"slow down"}}"#);
        assert_eq!(error.code, ErrorCode::ExternalRateLimited);
        assert_eq!(error.http_status(), 503);
    }

    #[test]
    fn test_map_api_error_extracts_message() {
        let error = OpenAiProvider::map_api_error(400, r#"{"error":{"message":"bad schema"}}"#);
        assert_eq!(error.code, ErrorCode::ExtractionFailed);
        assert!(error.message.contains("bad schema"));
    }
}
