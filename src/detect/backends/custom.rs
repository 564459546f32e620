//! Custom inference endpoint.
//!
//! Accepts `multipart/form-data` with a `file` part and an optional
//! `model` text part, and answers with pixel-corner predictions:
//! `{ "predictions": [{ class_id, class_name, confidence, x1, y1, x2, y2 }] }`.

use anyhow::Result;
use rand::RngCore;
use std::time::Duration;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::normalize::from_pixel_payload;
use crate::detect::result::DetectionResult;
use crate::upload::ImageUpload;

use super::{read_json_body, request_error};

pub struct CustomApiBackend {
    agent: ureq::Agent,
    endpoint: String,
    model: Option<String>,
}

impl CustomApiBackend {
    pub fn new(endpoint: impl Into<String>, model: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: endpoint.into(),
            model,
        }
    }
}

impl DetectorBackend for CustomApiBackend {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::ModelSelection)
    }

    fn detect(&mut self, image: &ImageUpload) -> Result<DetectionResult> {
        match &self.model {
            Some(model) => log::info!(
                "sending request to {} with model: {}",
                self.endpoint,
                model
            ),
            None => log::info!("sending request to {}", self.endpoint),
        }

        let form = MultipartForm::new()
            .file("file", image.file_name(), image.mime_type(), image.bytes())
            .text_opt("model", self.model.as_deref());

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", &form.content_type())
            .send_bytes(&form.finish())
            .map_err(request_error)?;

        let payload = read_json_body(response)?;
        Ok(from_pixel_payload(&payload, image.width(), image.height()))
    }

    fn select_model(&mut self, model: Option<String>) {
        self.model = model;
    }

    fn selected_model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// Minimal `multipart/form-data` body writer.
struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    fn new() -> Self {
        let mut nonce = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce);
        let suffix: String = nonce.iter().map(|b| format!("{:02x}", b)).collect();
        Self {
            boundary: format!("----detection-viewer-{}", suffix),
            body: Vec::new(),
        }
    }

    fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.part_header(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}",
            name,
            quote_safe(file_name),
            content_type
        ));
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn text_opt(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.part_header(&format!(
                "Content-Disposition: form-data; name=\"{}\"",
                name
            ));
            self.body.extend_from_slice(value.as_bytes());
            self.body.extend_from_slice(b"\r\n");
        }
        self
    }

    fn part_header(&mut self, headers: &str) {
        self.body
            .extend_from_slice(format!("--{}\r\n{}\r\n\r\n", self.boundary, headers).as_bytes());
    }

    fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

fn quote_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '"' | '\r' | '\n' => '_',
            c => c,
        })
        .collect()
}
