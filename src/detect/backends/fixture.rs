use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::normalize::{from_normalized_payload, from_pixel_payload};
use crate::detect::result::DetectionResult;
use crate::upload::ImageUpload;

/// Backend that replays a recorded provider payload.
///
/// Used by tests and for re-rendering a saved response without calling a
/// provider. The payload shape is picked by its top-level key:
/// `predictions` goes through the pixel-corner path, anything else through
/// the normalized path.
pub struct FixtureBackend {
    payload: Value,
}

impl FixtureBackend {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read recorded response {}", path.display()))?;
        let payload = serde_json::from_str(&raw)
            .with_context(|| format!("invalid recorded response {}", path.display()))?;
        Ok(Self::new(payload))
    }
}

impl DetectorBackend for FixtureBackend {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn supports(&self, _capability: DetectionCapability) -> bool {
        false
    }

    fn detect(&mut self, image: &ImageUpload) -> Result<DetectionResult> {
        if self.payload.get("predictions").is_some() {
            Ok(from_pixel_payload(&self.payload, image.width(), image.height()))
        } else {
            Ok(from_normalized_payload(&self.payload))
        }
    }
}
