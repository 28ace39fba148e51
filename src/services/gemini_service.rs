// src/services/gemini_service.rs
use crate::config::Config;
use crate::errors::TimeMachineError;
use crate::models::{EmbeddedImage, EraStyle};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use log::{debug, info};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Instant;

pub const NO_IMAGE_MESSAGE: &str = "The model did not return an image.";

/// Turns a source picture into its era-styled counterpart.
///
/// One call is one remote request. Implementations never retry; every
/// failure comes back as [`TimeMachineError::TransformationFailed`].
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(
        &self,
        source: &EmbeddedImage,
        era: &EraStyle,
    ) -> Result<EmbeddedImage, TimeMachineError>;
}

pub struct GeminiService {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiService {
    pub fn new(config: &Config) -> Result<Self, TimeMachineError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TimeMachineError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base_url.clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Transformer for GeminiService {
    async fn transform(
        &self,
        source: &EmbeddedImage,
        era: &EraStyle,
    ) -> Result<EmbeddedImage, TimeMachineError> {
        let start = Instant::now();
        info!("Requesting {} transformation from {}", era.id, self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request_body(source, era))
            .send()
            .await
            .map_err(|e| {
                TimeMachineError::TransformationFailed(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TimeMachineError::TransformationFailed(remote_error_message(
                status.as_u16(),
                &error_text,
            )));
        }

        let result: Value = response.json().await.map_err(|e| {
            TimeMachineError::TransformationFailed(format!(
                "Failed to parse Gemini response: {}",
                e
            ))
        })?;

        let image = extract_image(&result)?;
        debug!(
            "Gemini returned {} after {} ms",
            image.media_type,
            start.elapsed().as_millis()
        );
        Ok(image)
    }
}

fn request_body(source: &EmbeddedImage, era: &EraStyle) -> Value {
    json!({
        "contents": [{
            "parts": [
                {
                    "inlineData": {
                        "mimeType": source.media_type,
                        "data": source.data
                    }
                },
                {
                    "text": era.prompt
                }
            ]
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE", "TEXT"]
        }
    })
}

fn remote_error_message(status: u16, body: &str) -> String {
    let remote = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string));

    match remote {
        Some(message) if !message.is_empty() => message,
        _ if body.trim().is_empty() => format!("Gemini error: HTTP {}", status),
        _ => format!("Gemini error: HTTP {}: {}", status, body.trim()),
    }
}

/// Pulls the first inline image out of a `generateContent` response, or
/// explains why there is none.
fn extract_image(result: &Value) -> Result<EmbeddedImage, TimeMachineError> {
    let candidates = result["candidates"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    let mut text = Vec::new();
    for candidate in candidates {
        let parts = candidate["content"]["parts"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for part in parts {
            let inline = if part["inlineData"].is_object() {
                &part["inlineData"]
            } else {
                &part["inline_data"]
            };
            if let Some(data) = inline["data"].as_str() {
                general_purpose::STANDARD.decode(data).map_err(|e| {
                    TimeMachineError::TransformationFailed(format!(
                        "Failed to decode image: {}",
                        e
                    ))
                })?;
                let media_type = inline["mimeType"]
                    .as_str()
                    .or_else(|| inline["mime_type"].as_str())
                    .unwrap_or("image/png");
                return Ok(EmbeddedImage::new(media_type, data));
            }
            if let Some(t) = part["text"].as_str() {
                text.push(t.trim());
            }
        }
    }

    if let Some(reason) = result["promptFeedback"]["blockReason"].as_str() {
        return Err(TimeMachineError::TransformationFailed(format!(
            "Request was blocked: {}",
            reason
        )));
    }

    let text = text.join(" ");
    if !text.is_empty() {
        return Err(TimeMachineError::TransformationFailed(format!(
            "{} {}",
            NO_IMAGE_MESSAGE, text
        )));
    }

    match candidates.first().and_then(|c| c["finishReason"].as_str()) {
        Some(reason) if reason != "STOP" => Err(TimeMachineError::TransformationFailed(format!(
            "{} Finish reason: {}",
            NO_IMAGE_MESSAGE, reason
        ))),
        _ => Err(TimeMachineError::TransformationFailed(
            NO_IMAGE_MESSAGE.to_string(),
        )),
    }
}
