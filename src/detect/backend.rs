use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::upload::ImageUpload;

/// Optional features a detection backend may offer on top of detection.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionCapability {
    /// Accepts a model name forwarded with each request.
    ModelSelection,
}

/// Detection provider trait.
///
/// Every provider, whatever its wire format, is reduced to one capability:
/// take an image and yield a normalized [`DetectionResult`] or fail.
///
/// Malformed provider payloads are not failures; implementations degrade
/// them to an empty result. Transport errors and non-success statuses are
/// returned as `Err` so the caller can offer a retry.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: DetectionCapability) -> bool;

    /// Run detection on a decoded upload.
    fn detect(&mut self, image: &ImageUpload) -> Result<DetectionResult>;

    /// Select the model forwarded with subsequent requests.
    ///
    /// Backends without [`DetectionCapability::ModelSelection`] ignore it.
    fn select_model(&mut self, _model: Option<String>) {}

    /// Model currently forwarded with requests, if any.
    fn selected_model(&self) -> Option<&str> {
        None
    }
}
