use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::config::DetectConfig;
use crate::detect::result::DetectionResult;
use crate::upload::ImageUpload;

use super::backend::{DetectionCapability, DetectorBackend};
use super::backends::gemini::GeminiSettings;
use super::backends::{CustomApiBackend, GeminiBackend};

/// Shared handle to a registered backend.
pub type SharedBackend = Arc<Mutex<dyn DetectorBackend>>;

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, SharedBackend>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register the provider selected by `cfg.use_custom_api` and make it
    /// the default.
    pub fn from_config(cfg: &DetectConfig) -> Result<Self> {
        let mut registry = Self::new();
        if cfg.use_custom_api {
            let endpoint = cfg
                .custom
                .endpoint
                .clone()
                .ok_or_else(|| anyhow!("API endpoint is not configured"))?;
            registry.register(CustomApiBackend::new(
                endpoint,
                cfg.custom.model.clone(),
                cfg.timeout,
            ));
        } else {
            let api_key = cfg
                .gemini
                .api_key
                .clone()
                .ok_or_else(|| anyhow!("API key is missing"))?;
            registry.register(GeminiBackend::new(GeminiSettings {
                api_key,
                model: cfg.gemini.model.clone(),
                base_url: cfg.gemini.base_url.clone(),
                temperature: cfg.gemini.temperature,
                timeout: cfg.timeout,
            }));
        }
        Ok(registry)
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<SharedBackend> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<SharedBackend> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns true when the default backend supports a capability.
    pub fn default_supports(&self, capability: DetectionCapability) -> Result<bool> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detection backend registered"))?;
        let guard = backend
            .lock()
            .map_err(|_| anyhow!("default backend lock poisoned"))?;
        Ok(guard.supports(capability))
    }

    /// Run detection using the default backend.
    pub fn detect(&self, image: &ImageUpload) -> Result<DetectionResult> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detection backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?;
        guard.detect(image)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::FixtureBackend;
    use serde_json::json;

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(FixtureBackend::new(json!({"detections": []})));
        assert_eq!(registry.list(), vec!["fixture".to_string()]);
        assert!(registry.default_backend().is_some());
        assert!(registry.get("custom").is_none());
    }

    #[test]
    fn detect_without_backends_fails() {
        let registry = BackendRegistry::new();
        let upload = ImageUpload::from_bytes(crate::upload::test_support::png_bytes(2, 2), "a.png")
            .unwrap();
        assert!(registry.detect(&upload).is_err());
    }

    #[test]
    fn from_config_selects_custom_backend() {
        let cfg = DetectConfig {
            use_custom_api: true,
            timeout: std::time::Duration::from_secs(5),
            custom: crate::config::CustomSettings {
                endpoint: Some("http://127.0.0.1:9/predict".to_string()),
                models_url: None,
                model: Some("yolov8n".to_string()),
            },
            gemini: crate::config::GeminiConfig {
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                base_url: "https://example.test".to_string(),
                temperature: 0.4,
            },
        };
        let registry = BackendRegistry::from_config(&cfg).unwrap();
        assert_eq!(registry.list(), vec!["custom".to_string()]);
        assert!(registry
            .default_supports(DetectionCapability::ModelSelection)
            .unwrap());
        let backend = registry.default_backend().unwrap();
        assert_eq!(backend.lock().unwrap().selected_model(), Some("yolov8n"));
    }
}
