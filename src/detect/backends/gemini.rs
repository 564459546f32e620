//! Remote multimodal model backend.
//!
//! The image travels inline (base64) together with a prompt and a JSON
//! response schema. The model answers with boxes that are already in the
//! normalized 0..=1000 space, so the response only passes through the
//! clamp/order step of normalization.

use anyhow::{anyhow, Result};
use base64::Engine;
use serde_json::{json, Value};
use std::time::Duration;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::normalize::from_normalized_payload;
use crate::detect::result::DetectionResult;
use crate::upload::ImageUpload;

use super::{read_json_body, request_error};

const PROMPT: &str = "Detect all objects in this image. Return the result as a JSON object \
containing a list of detections with labels and 2D bounding boxes (ymin, xmin, ymax, xmax) \
normalized to 0-1000.";

#[derive(Clone, Debug)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
}

pub struct GeminiBackend {
    agent: ureq::Agent,
    settings: GeminiSettings,
}

impl GeminiBackend {
    pub fn new(settings: GeminiSettings) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(settings.timeout).build(),
            settings,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn request_body(&self, image: &ImageUpload) -> Value {
        let data = base64::engine::general_purpose::STANDARD.encode(image.bytes());
        json!({
            "contents": [{
                "parts": [
                    { "inline_data": { "mime_type": image.mime_type(), "data": data } },
                    { "text": PROMPT }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": self.settings.temperature
            }
        })
    }
}

impl DetectorBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn supports(&self, _capability: DetectionCapability) -> bool {
        false
    }

    fn detect(&mut self, image: &ImageUpload) -> Result<DetectionResult> {
        log::info!("sending request to model {}", self.settings.model);
        let response = self
            .agent
            .post(&self.url())
            .set("x-goog-api-key", &self.settings.api_key)
            .set("Content-Type", "application/json")
            .send_string(&self.request_body(image).to_string())
            .map_err(request_error)?;

        let envelope = read_json_body(response)?;
        let text = candidate_text(&envelope)
            .ok_or_else(|| anyhow!("Empty response from AI model."))?;
        Ok(parse_model_text(&text))
    }
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "detections": {
                "type": "ARRAY",
                "description": "List of detected objects with their bounding boxes and labels.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": {
                            "type": "STRING",
                            "description": "The name of the detected object (e.g., 'Cat', 'Bicycle')."
                        },
                        "box_2d": {
                            "type": "ARRAY",
                            "description": "Bounding box coordinates normalized to [0, 1000] in the format [ymin, xmin, ymax, xmax].",
                            "items": { "type": "INTEGER" }
                        }
                    },
                    "required": ["label", "box_2d"]
                }
            }
        },
        "required": ["detections"]
    })
}

/// Concatenated text parts of the first candidate, if any.
fn candidate_text(envelope: &Value) -> Option<String> {
    let parts = envelope
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_model_text(text: &str) -> DetectionResult {
    match serde_json::from_str::<Value>(text) {
        Ok(payload) => from_normalized_payload(&payload),
        Err(e) => {
            log::warn!("model text is not JSON, treating as no detections: {}", e);
            DetectionResult::empty()
        }
    }
}
